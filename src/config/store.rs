use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::file_store::FileStoreConfig;

/// A wrapper for the credential store configuration:
/// - enabled: if false, credentials live in memory only (MemoryStore).
/// - backend: the durable backend holding the persisted session entry.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct StoreConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<StoreBackend>,
}

/// The existing store backends. We differentiate them via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
#[serde(tag = "type")]
pub enum StoreBackend {
    #[serde(rename = "file")]
    File(FileStoreConfig),
    // Add more variants here as needed, like:
    // #[serde(rename = "keyring")]
    // Keyring(KeyringStoreConfig),
}
