use std::{fs, path::Path, time::Duration};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// --- CATALOG CONFIG ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Seed the in-memory store with the bundled mock catalog at startup.
    #[serde(default = "default_seed")]
    pub seed: bool,
    /// Quiet period before slider input is propagated to the ranking
    /// snapshot used by price-based sorting.
    #[serde(default = "default_ranking_settle_ms")]
    pub ranking_settle_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ranking_settle_ms: default_ranking_settle_ms(),
        }
    }
}

impl CatalogConfig {
    pub fn ranking_settle(&self) -> Duration {
        Duration::from_millis(self.ranking_settle_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialCatalogConfig {
    pub seed: Option<bool>,
    pub ranking_settle_ms: Option<u64>,
}

impl PartialCatalogConfig {
    fn merge_into(self, final_config: &mut CatalogConfig) {
        if let Some(seed) = self.seed {
            final_config.seed = seed;
        }
        if let Some(ranking_settle_ms) = self.ranking_settle_ms {
            final_config.ranking_settle_ms = ranking_settle_ms;
        }
    }
}

fn default_seed() -> bool {
    true
}

fn default_ranking_settle_ms() -> u64 {
    2000
}

// Used for deserializing user-provided config files where all fields are optional.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_path: Option<String>,
    pub log_level: Option<String>,
    pub catalog: Option<PartialCatalogConfig>,
}

impl PartialConfig {
    /// Merges the fields of this partial config into a final config, overwriting existing values.
    fn merge_into(self, final_config: &mut FinalConfig) {
        if let Some(host) = self.host {
            final_config.host = host;
        }
        if let Some(port) = self.port {
            final_config.port = port;
        }
        if let Some(base_path) = self.base_path {
            final_config.base_path = base_path;
        }
        if let Some(log_level) = self.log_level {
            final_config.log_level = log_level;
        }
        if let Some(catalog) = self.catalog {
            catalog.merge_into(&mut final_config.catalog);
        }
    }
}

// The fully resolved configuration used by the application.
// This is also the format for the default configuration file.
#[derive(Debug, Deserialize, Serialize)]
pub struct FinalConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub log_level: String,
    pub catalog: CatalogConfig,
}

fn get_env_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn get_config_from_env() -> PartialConfig {
    PartialConfig {
        host: get_env_var("HOST"),
        port: get_env_var("PORT"),
        base_path: get_env_var("BASE_PATH"),
        log_level: get_env_var("LOG_LEVEL"),
        catalog: None,
    }
}

pub static CONFIG: Lazy<FinalConfig> = Lazy::new(|| {
    let default_config_path = Path::new("config.default.yaml");
    let user_config_path_release = Path::new("config.yaml");
    let user_config_path_dev = Path::new("config.local.yaml");

    // Determine which user config file to use for overrides
    let user_config_path = if cfg!(debug_assertions) && user_config_path_dev.exists() {
        user_config_path_dev
    } else {
        user_config_path_release
    };

    // Create a FinalConfig with programmatic defaults.
    let mut effective_default_config = FinalConfig {
        host: "0.0.0.0".to_string(),
        port: 8000,
        base_path: "/meter".to_string(),
        log_level: "info".to_string(),
        catalog: CatalogConfig::default(),
    };

    // If a default config file exists, load it as partial and merge it over the programmatic defaults.
    if default_config_path.exists() {
        if let Ok(config_str) = fs::read_to_string(default_config_path) {
            let file_defaults: PartialConfig = serde_yaml::from_str(&config_str)
                .unwrap_or_else(|e| {
                    panic!(
                        "Failed to parse default configuration file at {:?}: {}",
                        default_config_path, e
                    )
                });

            file_defaults.merge_into(&mut effective_default_config);
        }
    }

    // Write the (potentially updated) defaults back to the file.
    // This ensures new fields are added to config.default.yaml.
    let yaml_str = serde_yaml::to_string(&effective_default_config).unwrap();
    fs::write(default_config_path, yaml_str)
        .unwrap_or_else(|err| panic!("Failed to write default configuration file: {}", err));

    // Start with the effective defaults.
    let mut final_config = effective_default_config;

    // Load the user's config if it exists. It's optional and overrides the defaults.
    if user_config_path.exists() {
        if let Ok(config_str) = fs::read_to_string(user_config_path) {
            let user_config: PartialConfig =
                serde_yaml::from_str(&config_str).unwrap_or_else(|e| {
                    panic!(
                        "Failed to parse user configuration file at {:?}: {}",
                        user_config_path, e
                    )
                });

            user_config.merge_into(&mut final_config);
        }
    }

    // Load config from environment variables, which have the highest priority.
    get_config_from_env().merge_into(&mut final_config);

    final_config
});
