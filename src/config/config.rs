use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0, containing the backend API endpoints,
/// credential store, and logging setup.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Endpoints of the dashboard backend the session layer talks to.
/// Paths default to the backend's conventional locations.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_csrf_path")]
    pub csrf_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
}

impl ApiConfig {
    /// Resolve a path against the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn default_csrf_path() -> String {
    "/api/csrf-token".to_string()
}

fn default_refresh_path() -> String {
    "/api/refresh-token".to_string()
}

fn default_sign_in_path() -> String {
    "/api/sign-in".to_string()
}

/// Load config from a YAML file named "config.yaml" in the current
/// directory, allowing SECUREFETCH_* environment overrides.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed("SECUREFETCH_").split("__"));
    let config = match figment.extract::<Config>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
