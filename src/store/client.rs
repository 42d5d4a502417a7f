//! Retrying client for the remote grid store.
//!
//! The spreadsheet computes the RAM file asynchronously, so a read can land
//! while cells still show a loading placeholder or a formula error. `read`
//! polls until the content is clean or the retry budget runs out. Dropped
//! sessions are handled separately: they trigger a re-authentication and the
//! same request is replayed without touching the poll budget.

use super::backend::GridBackend;
use super::types::{Grid, MajorDimension, RangeAddress, ValueRange};
use crate::utils::config::{
    DEFAULT_BACKOFF, DEFAULT_MAX_RECONNECTS, DEFAULT_MAX_RETRIES, ERROR_MARKERS, PENDING_MARKERS,
};
use crate::utils::error::{BackendError, StoreError};
use log::{debug, info, warn};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// Substrings that mark a cell as not yet holding real data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelMarkers {
    pub error: Vec<String>,
    pub pending: Vec<String>,
}

impl Default for SentinelMarkers {
    fn default() -> Self {
        Self {
            error: ERROR_MARKERS.iter().map(|s| s.to_string()).collect(),
            pending: PENDING_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What a single read observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending,
    Error,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Pending => write!(f, "computation pending"),
            Self::Error => write!(f, "computation error"),
        }
    }
}

/// Classify a grid by the markers it contains
///
/// An error marker anywhere wins over a pending marker.
pub fn classify(grid: &Grid, markers: &SentinelMarkers) -> Readiness {
    let contains_any = |needles: &[String]| {
        grid.iter()
            .flatten()
            .any(|cell| needles.iter().any(|needle| cell.contains(needle.as_str())))
    };

    if contains_any(&markers.error) {
        Readiness::Error
    } else if contains_any(&markers.pending) {
        Readiness::Pending
    } else {
        Readiness::Ready
    }
}

/// Budgets for polling and reconnecting
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
    max_reconnects: u32,
    markers: SentinelMarkers,
}

impl RetryPolicy {
    /// Create a policy
    ///
    /// # Errors
    /// * `StoreError::InvalidPolicy` - `max_retries` is zero
    pub fn new(max_retries: u32, backoff: Duration) -> Result<Self, StoreError> {
        if max_retries < 1 {
            return Err(StoreError::InvalidPolicy(
                "max retries must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            max_retries,
            backoff,
            max_reconnects: DEFAULT_MAX_RECONNECTS,
            markers: SentinelMarkers::default(),
        })
    }

    pub fn with_max_reconnects(mut self, max_reconnects: u32) -> Self {
        self.max_reconnects = max_reconnects;
        self
    }

    pub fn with_markers(mut self, markers: SentinelMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn max_reconnects(&self) -> u32 {
        self.max_reconnects
    }

    pub fn markers(&self) -> &SentinelMarkers {
        &self.markers
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
            max_reconnects: DEFAULT_MAX_RECONNECTS,
            markers: SentinelMarkers::default(),
        }
    }
}

/// Progress of one `read` call
struct RetryState {
    attempt: u32,
    last: Readiness,
    started: Instant,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            last: Readiness::Pending,
            started: Instant::now(),
        }
    }

    fn exhausted(&self, address: &RangeAddress) -> StoreError {
        match self.last {
            Readiness::Error => StoreError::DataUnavailable {
                address: address.to_string(),
                attempts: self.attempt,
            },
            _ => StoreError::ComputationTimeout {
                address: address.to_string(),
                attempts: self.attempt,
                waited_secs: self.started.elapsed().as_secs_f64(),
            },
        }
    }
}

/// Read/write/clear against a grid backend with retry-until-ready reads
///
/// The client owns the backend and with it the authenticated session. The
/// session is established on first use and re-established on connection
/// reset.
pub struct RemoteStore<B> {
    backend: B,
    policy: RetryPolicy,
    connected: bool,
}

impl<B: GridBackend> RemoteStore<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            connected: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Establish the session now instead of on first use
    ///
    /// Resets while logging in are retried within the reconnect budget.
    ///
    /// # Errors
    /// * `StoreError::Authentication` - credentials rejected
    /// * `StoreError::ConnectionLost` - reconnect budget exhausted
    pub fn connect(&mut self) -> Result<(), StoreError> {
        self.connected = false;
        self.with_reconnect(&"login", |_| Ok(()), StoreError::Authentication)
    }

    /// Poll a range until it holds computed data
    ///
    /// **Public** - used to harvest the RAM file
    ///
    /// # Arguments
    /// * `address` - Range to read
    ///
    /// # Returns
    /// The first response containing no sentinel marker, as rows
    ///
    /// # Errors
    /// * `StoreError::DataUnavailable` - error marker still present when retries ran out
    /// * `StoreError::ComputationTimeout` - pending marker still present when retries ran out
    /// * `StoreError::ReadFailed` - backend rejected the request
    /// * `StoreError::ConnectionLost` - reconnect budget exhausted
    pub fn read(&mut self, address: &RangeAddress) -> Result<Grid, StoreError> {
        let max_retries = self.policy.max_retries;
        let mut state = RetryState::new();

        loop {
            state.attempt += 1;

            let response = self.with_reconnect(
                address,
                |backend| backend.get(address),
                |source| StoreError::ReadFailed {
                    address: address.to_string(),
                    source,
                },
            )?;

            let values = response.into_rows();
            state.last = classify(&values, &self.policy.markers);

            if state.last == Readiness::Ready {
                debug!(
                    "Read {} rows from {} on attempt {}",
                    values.len(),
                    address,
                    state.attempt
                );
                return Ok(values);
            }

            warn!(
                "{} at {} (attempt {}/{})",
                state.last, address, state.attempt, max_retries
            );

            if state.attempt >= max_retries {
                return Err(state.exhausted(address));
            }

            thread::sleep(self.policy.backoff);
        }
    }

    /// Overwrite the cells covered by `grid`
    ///
    /// Cells outside the grid's extent keep their old content; call
    /// [`RemoteStore::clear`] first for a clean slate.
    ///
    /// # Errors
    /// * `StoreError::WriteFailure` - backend rejected the request
    /// * `StoreError::ConnectionLost` - reconnect budget exhausted
    pub fn write(
        &mut self,
        address: &RangeAddress,
        grid: &Grid,
        major_dimension: MajorDimension,
    ) -> Result<(), StoreError> {
        let body = ValueRange::new(grid.clone(), major_dimension);

        self.with_reconnect(
            address,
            |backend| backend.update(address, &body),
            |source| StoreError::WriteFailure {
                address: address.to_string(),
                source,
            },
        )?;

        debug!(
            "Wrote {} {} to {}",
            grid.len(),
            major_dimension.as_str().to_lowercase(),
            address
        );
        Ok(())
    }

    /// Erase every cell in a range
    ///
    /// # Errors
    /// Same as [`RemoteStore::write`]
    pub fn clear(&mut self, address: &RangeAddress) -> Result<(), StoreError> {
        self.with_reconnect(
            address,
            |backend| backend.clear(address),
            |source| StoreError::WriteFailure {
                address: address.to_string(),
                source,
            },
        )?;

        debug!("Cleared {}", address);
        Ok(())
    }

    /// Run one backend request, re-authenticating on connection reset
    ///
    /// **Private** - shared by connect, read, write and clear
    ///
    /// A reset from the request or from the login itself both count against
    /// `max_reconnects`.
    fn with_reconnect<T, D, F, E>(
        &mut self,
        target: &D,
        mut op: F,
        on_error: E,
    ) -> Result<T, StoreError>
    where
        D: fmt::Display + ?Sized,
        F: FnMut(&mut B) -> Result<T, BackendError>,
        E: FnOnce(BackendError) -> StoreError,
    {
        let mut reconnects = 0;

        loop {
            if !self.connected {
                info!("Logging in to remote store...");
                match self.backend.authenticate() {
                    Ok(()) => self.connected = true,
                    Err(BackendError::ConnectionReset(reason)) => {
                        self.note_reset(target, &reason, &mut reconnects)?;
                        continue;
                    }
                    Err(other) => return Err(StoreError::Authentication(other)),
                }
            }

            match op(&mut self.backend) {
                Ok(value) => return Ok(value),
                Err(BackendError::ConnectionReset(reason)) => {
                    self.connected = false;
                    self.note_reset(target, &reason, &mut reconnects)?;
                }
                Err(other) => return Err(on_error(other)),
            }
        }
    }

    /// Spend one reconnect, waiting `backoff` before every one after the first
    ///
    /// **Private** - helper for `with_reconnect`
    fn note_reset<D>(
        &self,
        target: &D,
        reason: &str,
        reconnects: &mut u32,
    ) -> Result<(), StoreError>
    where
        D: fmt::Display + ?Sized,
    {
        if *reconnects >= self.policy.max_reconnects {
            return Err(StoreError::ConnectionLost {
                address: target.to_string(),
                reconnects: *reconnects,
            });
        }

        if *reconnects > 0 {
            thread::sleep(self.policy.backoff);
        }
        *reconnects += 1;

        warn!(
            "Connection reset ({}), reconnecting to remote store ({}/{})...",
            reason, reconnects, self.policy.max_reconnects
        );
        Ok(())
    }
}
