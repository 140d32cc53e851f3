//! Remote sinks fed by local writes.

pub mod append;
pub mod sheets_client;

pub use append::{AppendOutcome, AppendRequest, AppendResponse, CellValue, Row};
pub use sheets_client::AppendClient;
