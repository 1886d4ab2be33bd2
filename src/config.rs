//! Configuration for the DrishtiIO daemon
//!
//! Loads configuration from a TOML file with the parameters needed for the
//! two TCP servers and the detection pipeline. Color ranges, thresholds and
//! framing are startup configuration; nothing is renegotiated per message.

use crate::detect::blob::HsvRange;
use crate::error::Result;
use crate::streaming::wire::Framing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}

/// Network configuration (both listeners plus wire framing)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// TCP bind address for inbound JPEG frames
    ///
    /// Examples:
    /// - `0.0.0.0:11000` - Bind to all interfaces on port 11000
    /// - `127.0.0.1:11000` - Localhost only
    pub frame_address: String,

    /// TCP bind address for outbound detection results
    pub control_address: String,

    /// Wire framing mode, resolved once at startup
    ///
    /// - `plain`: 4-byte big-endian length prefix
    /// - `tagged`: 1-byte message type tag + 4-byte big-endian length prefix
    #[serde(default)]
    pub framing: Framing,
}

/// Detection strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// HSV blob threshold producing bounding rectangles
    Blob,
    /// Line centroid with signed steering offset
    Line,
}

/// Detection pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Which detection strategy to run on every decoded frame
    pub strategy: Strategy,

    /// Minimum connected-region pixel area; smaller regions are noise
    pub min_area: u32,

    #[serde(default)]
    pub blob: BlobConfig,

    #[serde(default)]
    pub line: LineConfig,
}

/// Blob strategy parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlobConfig {
    /// Inclusive HSV ranges OR-ed together into the binary mask.
    ///
    /// Hue uses the 0-179 scale, saturation and value 0-255, so thresholds
    /// tuned against the robot camera carry over unchanged.
    pub ranges: Vec<HsvRange>,
}

impl Default for BlobConfig {
    fn default() -> Self {
        // Purple, split into two hue bands around the camera's white balance
        Self {
            ranges: vec![
                HsvRange {
                    lower: [125, 50, 50],
                    upper: [155, 255, 255],
                },
                HsvRange {
                    lower: [150, 50, 50],
                    upper: [170, 255, 255],
                },
            ],
        }
    }
}

/// Line strategy parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineConfig {
    /// Grayscale cutoff; pixels darker than this are line candidates
    pub threshold: u8,

    /// Fraction of the frame height (from the bottom) searched for the line
    pub roi_fraction: f32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            threshold: 60,
            roi_fraction: 0.4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log output (stdout, stderr, or file path)
    pub output: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Arguments
    /// - `path`: Path to TOML configuration file
    ///
    /// # Returns
    /// Parsed configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration for the pi-top rover
    ///
    /// Suitable for testing and development. Production deployments
    /// should use a proper TOML configuration file.
    pub fn pitop_defaults() -> Self {
        Self {
            network: NetworkConfig {
                frame_address: "0.0.0.0:11000".to_string(),
                control_address: "0.0.0.0:11001".to_string(),
                framing: Framing::Plain,
            },
            detection: DetectionConfig {
                strategy: Strategy::Blob,
                min_area: 500,
                blob: BlobConfig::default(),
                line: LineConfig::default(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                output: "stdout".to_string(),
            },
        }
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::pitop_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::pitop_defaults();
        assert_eq!(config.network.frame_address, "0.0.0.0:11000");
        assert_eq!(config.network.control_address, "0.0.0.0:11001");
        assert_eq!(config.network.framing, Framing::Plain);
        assert_eq!(config.detection.strategy, Strategy::Blob);
        assert_eq!(config.detection.min_area, 500);
        assert_eq!(config.detection.blob.ranges.len(), 2);
        assert_eq!(config.detection.line.threshold, 60);
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::pitop_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        // Should contain all sections
        assert!(toml_string.contains("[network]"));
        assert!(toml_string.contains("[detection]"));
        assert!(toml_string.contains("[logging]"));

        // Should contain key values
        assert!(toml_string.contains("frame_address = \"0.0.0.0:11000\""));
        assert!(toml_string.contains("min_area = 500"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[network]
frame_address = "127.0.0.1:11000"
control_address = "127.0.0.1:11001"
framing = "tagged"

[detection]
strategy = "line"
min_area = 300

[detection.line]
threshold = 80
roi_fraction = 0.5

[logging]
level = "debug"
output = "stdout"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.network.framing, Framing::Tagged);
        assert_eq!(config.detection.strategy, Strategy::Line);
        assert_eq!(config.detection.min_area, 300);
        assert_eq!(config.detection.line.threshold, 80);
        assert_eq!(config.detection.line.roi_fraction, 0.5);
        // Blob section omitted falls back to defaults
        assert_eq!(config.detection.blob.ranges.len(), 2);
        assert_eq!(config.logging.level, "debug");
    }
}
