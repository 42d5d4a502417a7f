//! Remote grid store access.
//!
//! This module handles:
//! - Retry-until-ready reads and bounded reconnects (`client`)
//! - The backend seam (`backend`)
//! - The Google Sheets backend and its service-account login (`sheets`, `auth`)

pub mod auth;
pub mod backend;
pub mod client;
pub mod sheets;
pub mod types;

// Re-export main types
pub use auth::ServiceAccountCredentials;
pub use backend::GridBackend;
pub use client::{classify, Readiness, RemoteStore, RetryPolicy, SentinelMarkers};
pub use sheets::SheetsBackend;
pub use types::{Grid, MajorDimension, RangeAddress, ValueRange};
