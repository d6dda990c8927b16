use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct TelegramSettings {
    pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Deserialize, Debug)]
pub struct SpreadsheetSettings {
    #[serde(default)]
    pub backend: SpreadsheetBackend,
    pub base_url: String,
}

#[derive(Deserialize, Debug)]
pub struct AuthorizationSettings {
    pub url: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct GeocodingSettings {
    pub fallback_time_zone: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub telegram: TelegramSettings,
    pub database: DatabaseSettings,
    pub spreadsheet: SpreadsheetSettings,
    pub authorization: AuthorizationSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
}

impl AppSettings {
    /// Layers `appsettings`, the optional `appsettings.local` and `APP_*`
    /// environment variables (nested keys separated by `__`).
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
