//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tw_core::DEFAULT_BINS;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Usage log to analyse.
    pub input_path: PathBuf,
    /// Where `tw sample` writes its dump.
    pub sample_path: PathBuf,
    /// Number of histogram bins.
    pub histogram_bins: usize,
    /// Width of the longest histogram bar, in characters.
    pub histogram_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("toolwindow_data.csv"),
            sample_path: PathBuf::from("user_sample.txt"),
            histogram_bins: DEFAULT_BINS,
            histogram_width: 50,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TW_*)
        figment = figment.merge(Env::prefixed("TW_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for tw.
///
/// On Linux: `~/.config/tw`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tw"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_tw() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tw");
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.input_path, PathBuf::from("toolwindow_data.csv"));
        assert_eq!(config.sample_path, PathBuf::from("user_sample.txt"));
        assert_eq!(config.histogram_bins, 100);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"input_path = "/data/events.csv""#).unwrap();
        writeln!(file, "histogram_width = 20").unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.input_path, PathBuf::from("/data/events.csv"));
        assert_eq!(config.histogram_width, 20);
    }

    #[test]
    fn test_invalid_config_value_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"histogram_bins = "many""#).unwrap();
        file.flush().unwrap();

        assert!(Config::load_from(Some(file.path())).is_err());
    }
}
