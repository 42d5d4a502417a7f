//! The seam between the retrying store client and a concrete grid service.

use super::types::{RangeAddress, ValueRange};
use crate::utils::error::BackendError;

/// One request/response exchange with a range-addressed grid service
///
/// Implementations own their session. Any condition that needs a fresh
/// session (dropped socket, expired token, no session yet) must surface as
/// [`BackendError::ConnectionReset`] so the client can re-authenticate.
pub trait GridBackend {
    /// Establish or replace the session
    fn authenticate(&mut self) -> Result<(), BackendError>;

    /// Fetch the values of a range, row-major
    fn get(&mut self, address: &RangeAddress) -> Result<ValueRange, BackendError>;

    /// Overwrite the cells covered by `values`
    fn update(&mut self, address: &RangeAddress, values: &ValueRange) -> Result<(), BackendError>;

    /// Erase every cell in the range
    fn clear(&mut self, address: &RangeAddress) -> Result<(), BackendError>;
}
