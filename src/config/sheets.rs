use std::collections::BTreeMap;

use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_SHEETS_API_ROOT, DEFAULT_VALUE_INPUT_OPTION, SHEET_KNOWLEDGE_BASE, SHEET_MATCH_HISTORY,
};

/// ================================
/// Remote spreadsheet target
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    #[serde(default = "default_api_root")]
    pub api_root: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_value_input_option")]
    pub value_input_option: String,
    /// Logical destination to sheet name.
    #[serde(default = "default_destinations")]
    pub destinations: BTreeMap<String, String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            spreadsheet_id: String::new(),
            value_input_option: default_value_input_option(),
            destinations: default_destinations(),
        }
    }
}

impl SheetsConfig {
    pub fn sheet_name(&self, destination: &str) -> Option<&str> {
        self.destinations.get(destination).map(String::as_str)
    }
}

fn default_api_root() -> String {
    DEFAULT_SHEETS_API_ROOT.to_string()
}

fn default_value_input_option() -> String {
    DEFAULT_VALUE_INPUT_OPTION.to_string()
}

fn default_destinations() -> BTreeMap<String, String> {
    [SHEET_MATCH_HISTORY, SHEET_KNOWLEDGE_BASE]
        .into_iter()
        .map(|name| (name.to_owned(), name.to_owned()))
        .collect()
}
