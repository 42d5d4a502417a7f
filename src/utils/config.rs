//! Configuration and constants for the CLI.

use std::time::Duration;

/// Default timeout for Sheets API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Sheets v4 REST root
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// OAuth scope granting read/write access to spreadsheets
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Where the published trace can be viewed, `{}` is the trace spreadsheet id
pub const TRACE_VIEW_URL: &str = "https://docs.google.com/spreadsheets/d/{}/edit";

// Ranges inside the assembler spreadsheet
pub const SOURCE_RANGE: &str = "source!A:A";
pub const RAMFILE_RANGE: &str = "RAM file!A:A";

// Range inside the trace analyzer spreadsheet
pub const TRACE_RANGE: &str = "Sheet1!A:M";

// Retry budget for polling the computed range
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(2500);
pub const DEFAULT_MAX_RECONNECTS: u32 = 5;

// Cell content the spreadsheet shows while a formula is broken or still computing
pub const ERROR_MARKERS: &[&str] = &["errorValue", "#ERROR!", "#REF!", "#N/A", "#VALUE!"];
pub const PENDING_MARKERS: &[&str] = &["Loading..."];

// Files looked up next to the executable
pub const SETTINGS_FILE: &str = "assets/settings.txt";
pub const SERVICE_ACCOUNT_FILE: &str = "assets/service-account.json";

/// Default Java launcher for the simulator
pub const DEFAULT_JAVA: &str = "java";

/// Build the view URL for a trace spreadsheet
pub fn trace_view_url(trace_id: &str) -> String {
    TRACE_VIEW_URL.replace("{}", trace_id)
}
