use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Extra city → URL entries, merged over the built-in link table.
    #[serde(default)]
    pub links: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InputConfig {
    /// CSV of city records. When absent the built-in sample table is used.
    pub cities_csv: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Overrides the computed center, as [lat, lon].
    pub center: Option<[f64; 2]>,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            style: default_style(),
            zoom: default_zoom(),
            center: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
        }
    }
}

fn default_style() -> String {
    "open-street-map".to_string()
}

fn default_zoom() -> f64 {
    9.0
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
