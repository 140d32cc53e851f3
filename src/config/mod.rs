pub mod credentials;
pub mod proc_loader;
pub mod proc_validator;
pub mod settings;
pub mod sheets;

use serde::Deserialize;

use crate::config::credentials::CredentialsConfig;
use crate::config::settings::SettingsConfig;
use crate::config::sheets::SheetsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
}
