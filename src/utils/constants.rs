//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_MS: i64 = 30_000;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Upper bound the token endpoint accepts for `exp - iat`.
pub const MAX_ASSERTION_LIFETIME_SECS: i64 = 3600;

pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_SHEETS_API_ROOT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Appends address the first cell; the remote side moves to the next free row.
pub const APPEND_ANCHOR_CELL: &str = "A1";

/// Marker left in sample configs instead of a real service account.
pub const ACCOUNT_PLACEHOLDER_MARKER: &str = "YOUR_SERVICE_ACCOUNT";

/// Metric label shared by every destination missing from the sheet map.
pub const UNKNOWN_DESTINATION_LABEL: &str = "unknown";

pub const SHEET_MATCH_HISTORY: &str = "Match_History";
pub const SHEET_KNOWLEDGE_BASE: &str = "Knowledge_Base";
