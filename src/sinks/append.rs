//! Request and result types of the remote append path.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Scalar cell value as the remote API accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Empty,
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

pub type Row = Vec<CellValue>;

/// Validated batch for one destination. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendRequest {
    destination: String,
    rows: Vec<Row>,
}

impl AppendRequest {
    pub fn new(destination: &str, rows: Vec<Row>) -> Result<Self> {
        if destination.trim().is_empty() {
            return Err(SyncError::InvalidRequest(
                "destination must not be empty".to_string(),
            ));
        }
        if rows.is_empty() {
            return Err(SyncError::InvalidRequest(
                "at least one row is required".to_string(),
            ));
        }
        if let Some(index) = rows.iter().position(Vec::is_empty) {
            return Err(SyncError::InvalidRequest(format!("row {} is empty", index)));
        }

        Ok(Self {
            destination: destination.to_owned(),
            rows,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Body of a successful append, as echoed by the remote API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<UpdatedRange>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_columns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_cells: Option<u64>,
}

impl AppendResponse {
    pub fn updated_range(&self) -> Option<&str> {
        self.updates
            .as_ref()
            .and_then(|updates| updates.updated_range.as_deref())
    }
}

/// Result of one append. Never an `Err`: remote sync is a best-effort
/// mirror and the caller decides what to do with a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendOutcome {
    Appended {
        destination: String,
        response: AppendResponse,
    },
    /// Remote sync is not configured or was disabled.
    Skipped { destination: String, reason: String },
    Failed {
        destination: String,
        error: SyncError,
    },
}

impl AppendOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, AppendOutcome::Skipped { .. })
    }

    pub fn updated_range(&self) -> Option<&str> {
        match self {
            AppendOutcome::Appended { response, .. } => response.updated_range(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            AppendOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
