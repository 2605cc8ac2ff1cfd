use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_ENV: &str = "SENSOR_READOUT_CONFIG";
const CONFIG_FILE: &str = "sensor_readout.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sensor_port: Option<String>,
    pub sensor_baud: u32,
    pub gps_port: Option<String>,
    pub gps_baud: u32,
    pub manual_location: Option<ManualLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sensor_port: None,
            sensor_baud: 115200,
            gps_port: None,
            gps_baud: 9600, // u-blox default
            manual_location: None,
        }
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    // a missing file is the normal first-run case and stays quiet, anything
    // else is worth a warning
    pub fn load_or_default() -> Self {
        let path = Self::path();
        match Self::load(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("config {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();

        assert_eq!(config.sensor_baud, 115200);
        assert_eq!(config.gps_baud, 9600);
        assert!(config.sensor_port.is_none());
        assert!(config.gps_port.is_none());
        assert!(config.manual_location.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"gps_port": "/dev/ttyACM0"}"#).unwrap();

        assert_eq!(config.gps_port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.gps_baud, 9600);
        assert_eq!(config.sensor_baud, 115200);
    }

    #[test]
    fn round_trip() {
        let config = AppConfig {
            sensor_port: Some("/dev/ttyUSB0".to_string()),
            manual_location: Some(ManualLocation {
                latitude: 48.2,
                longitude: 16.37,
            }),
            ..Default::default()
        };

        let path =
            std::env::temp_dir().join(format!("sensor_readout_cfg_{}.json", std::process::id()));
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn wrong_types_are_an_error() {
        assert!(serde_json::from_str::<AppConfig>(r#"{"sensor_baud": "fast"}"#).is_err());
    }

    #[test]
    fn bad_json_falls_back_to_defaults() {
        let path =
            std::env::temp_dir().join(format!("sensor_readout_bad_{}.json", std::process::id()));
        std::fs::write(&path, "{ definitely not json").unwrap();

        std::env::set_var(CONFIG_ENV, &path);
        let config = AppConfig::load_or_default();
        std::env::remove_var(CONFIG_ENV);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let e = AppConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(e, ConfigError::Io(_)));
    }
}
