//! Google Sheets v4 backend.
//!
//! Uses the blocking reqwest client; every call happens on the single
//! pipeline thread.

use super::auth::{request_token, AccessToken, ServiceAccountCredentials};
use super::backend::GridBackend;
use super::types::{Grid, MajorDimension, RangeAddress, ValueRange};
use crate::utils::config::{DEFAULT_HTTP_TIMEOUT, SHEETS_API_BASE};
use crate::utils::error::BackendError;
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::io::ErrorKind;
use std::time::Duration;

/// Authenticated HTTP session
struct Session {
    client: Client,
    token: AccessToken,
}

/// Values as returned on the wire; cells may be numbers or booleans
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireValueRange {
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    major_dimension: MajorDimension,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl From<WireValueRange> for ValueRange {
    fn from(wire: WireValueRange) -> Self {
        let values: Grid = wire
            .values
            .into_iter()
            .map(|line| line.into_iter().map(cell_to_string).collect())
            .collect();

        Self {
            range: wire.range,
            major_dimension: wire.major_dimension,
            values,
        }
    }
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Grid backend talking to the Sheets REST API with a service account
pub struct SheetsBackend {
    credentials: ServiceAccountCredentials,
    api_base: String,
    timeout: Duration,
    session: Option<Session>,
}

impl SheetsBackend {
    pub fn new(credentials: ServiceAccountCredentials) -> Self {
        Self {
            credentials,
            api_base: SHEETS_API_BASE.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            session: None,
        }
    }

    /// Point the backend at a different API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current session, or a reset signal when it needs replacing
    fn session(&self) -> Result<&Session, BackendError> {
        match &self.session {
            Some(session) if !session.token.is_expired() => Ok(session),
            Some(_) => Err(BackendError::ConnectionReset(
                "access token expired".to_string(),
            )),
            None => Err(BackendError::ConnectionReset("no session".to_string())),
        }
    }

    /// Build `{base}/{document}/values/{range}{suffix}` with the range escaped
    fn values_url(&self, address: &RangeAddress, suffix: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| BackendError::InvalidResponse(format!("bad API base: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidResponse("API base cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(&address.document)
            .push("values")
            .push(&format!("{}{}", address.range, suffix));

        Ok(url)
    }
}

impl GridBackend for SheetsBackend {
    fn authenticate(&mut self) -> Result<(), BackendError> {
        self.session = None;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(BackendError::RequestFailed)?;

        let token = request_token(&client, &self.credentials)?;
        self.session = Some(Session { client, token });
        Ok(())
    }

    fn get(&mut self, address: &RangeAddress) -> Result<ValueRange, BackendError> {
        let url = self.values_url(address, "")?;
        let session = self.session()?;

        debug!("GET {}", url);
        let response = session
            .client
            .get(url)
            .bearer_auth(&session.token.token)
            .query(&[("majorDimension", MajorDimension::Rows.as_str())])
            .send()
            .map_err(map_transport_error)?;

        let wire: WireValueRange = check_status(response)?
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(wire.into())
    }

    fn update(&mut self, address: &RangeAddress, values: &ValueRange) -> Result<(), BackendError> {
        let url = self.values_url(address, "")?;
        let session = self.session()?;

        debug!("PUT {} ({} {})", url, values.values.len(), values.major_dimension.as_str());
        let response = session
            .client
            .put(url)
            .bearer_auth(&session.token.token)
            .query(&[("valueInputOption", "RAW")])
            .json(values)
            .send()
            .map_err(map_transport_error)?;

        check_status(response)?;
        Ok(())
    }

    fn clear(&mut self, address: &RangeAddress) -> Result<(), BackendError> {
        let url = self.values_url(address, ":clear")?;
        let session = self.session()?;

        debug!("POST {}", url);
        let response = session
            .client
            .post(url)
            .bearer_auth(&session.token.token)
            .json(&serde_json::json!({}))
            .send()
            .map_err(map_transport_error)?;

        check_status(response)?;
        Ok(())
    }
}

/// Turn HTTP failures into backend errors
///
/// **Private** - 401 means the token went stale and is reported as a reset
fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::ConnectionReset(
            "access token rejected".to_string(),
        ));
    }

    if !status.is_success() {
        return Err(BackendError::Http {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        });
    }

    Ok(response)
}

/// Classify a transport error, separating dropped connections from the rest
pub(crate) fn map_transport_error(err: reqwest::Error) -> BackendError {
    if is_connection_reset(&err) {
        BackendError::ConnectionReset(err.to_string())
    } else {
        BackendError::RequestFailed(err)
    }
}

fn is_connection_reset(err: &reqwest::Error) -> bool {
    if err.is_connect() {
        return true;
    }

    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = inner.source();
    }

    false
}
