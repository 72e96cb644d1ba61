use std::fs::File;

use serde::{Deserialize, Serialize};

fn default_max_connections() -> u32 {
    3 // we don't need too many here
}

/// Connection settings for the moderation storage database.
#[derive(Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl StorageConfig {
    /// Loads the config from a YAML file.
    pub fn load(path: &str) -> Result<Self, mod_timeouts::Error> {
        let file = File::open(path)?;

        Ok(serde_yaml::from_reader(file)?)
    }
}
