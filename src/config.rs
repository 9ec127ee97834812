//! Configuration management for docutext.
//!
//! A [`Config`] is the optional TOML file on disk; [`Settings`] is the
//! resolved runtime configuration after defaults, file values, and CLI
//! overrides are applied. The pipeline never reads ambient globals:
//! everything it needs (DPI, retry budget, staging dir, credential) is
//! passed in explicitly from here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default render resolution for OCR, in DPI.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Default retry budget for transient OCR service errors.
pub const DEFAULT_OCR_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (milliseconds).
pub const DEFAULT_RETRY_BASE_MS: u64 = 1000;

/// Default Gemini model used for image text recognition.
pub const DEFAULT_OCR_MODEL: &str = "gemini-1.5-flash-latest";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory (history log lives here).
    pub data_dir: PathBuf,
    /// Root under which per-request staging subdirectories are created.
    pub staging_dir: PathBuf,
    /// Render resolution for OCR extraction.
    pub ocr_dpi: u32,
    /// Gemini model name for OCR extraction.
    pub ocr_model: String,
    /// Retry budget for transient OCR errors.
    pub ocr_max_retries: u32,
    /// Base backoff delay between OCR retries (milliseconds).
    pub retry_base_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: platform data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docutext");

        Self {
            staging_dir: data_dir.join("staging"),
            data_dir,
            ocr_dpi: DEFAULT_OCR_DPI,
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            ocr_max_retries: DEFAULT_OCR_MAX_RETRIES,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
        }
    }
}

impl Settings {
    /// Create settings rooted at a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            staging_dir: data_dir.join("staging"),
            data_dir,
            ..Default::default()
        }
    }

    /// Path of the extraction history log.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    /// Ensure the data and staging directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.staging_dir)?;
        Ok(())
    }
}

/// Configuration file structure (TOML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Staging directory for rendered page images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<String>,
    /// OCR render resolution in DPI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_dpi: Option<u32>,
    /// Gemini model name for OCR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_model: Option<String>,
    /// Retry budget for transient OCR errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_max_retries: Option<u32>,
    /// Base backoff delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_base_ms: Option<u64>,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config: Config =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))?;

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths: the config
    /// file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.staging_dir = settings.data_dir.join("staging");
        }
        if let Some(ref staging_dir) = self.staging_dir {
            settings.staging_dir = self.resolve_path(staging_dir, base_dir);
        }
        if let Some(dpi) = self.ocr_dpi {
            settings.ocr_dpi = dpi;
        }
        if let Some(ref model) = self.ocr_model {
            settings.ocr_model = model.clone();
        }
        if let Some(retries) = self.ocr_max_retries {
            settings.ocr_max_retries = retries;
        }
        if let Some(base_ms) = self.retry_base_ms {
            settings.retry_base_ms = base_ms;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
    /// Override data directory (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Load settings with explicit options.
pub fn load_settings_with_options(options: LoadOptions) -> Settings {
    let config = match &options.config_path {
        Some(path) => match Config::load_from_path(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("{err}; using defaults");
                Config::default()
            }
        },
        None => Config::default(),
    };

    let mut settings = Settings::default();

    // Relative paths in the file resolve against its own directory.
    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    config.apply_to_settings(&mut settings, &base_dir);

    // --data-dir override takes precedence
    if let Some(data_dir) = options.data_dir {
        settings = Settings::with_data_dir(data_dir);
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.ocr_dpi, DEFAULT_OCR_DPI);
        assert_eq!(settings.ocr_model, DEFAULT_OCR_MODEL);
        assert_eq!(settings.staging_dir, settings.data_dir.join("staging"));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("docutext.toml");
        fs::write(
            &config_path,
            "data_dir = \"state\"\nocr_dpi = 150\nocr_model = \"gemini-1.5-pro-latest\"\n",
        )
        .unwrap();

        let settings = load_settings_with_options(LoadOptions {
            config_path: Some(config_path),
            data_dir: None,
        });

        // Relative data_dir resolves against the config file directory.
        assert_eq!(settings.data_dir, dir.path().join("state"));
        assert_eq!(settings.staging_dir, dir.path().join("state").join("staging"));
        assert_eq!(settings.ocr_dpi, 150);
        assert_eq!(settings.ocr_model, "gemini-1.5-pro-latest");
        // Unset keys keep their defaults.
        assert_eq!(settings.ocr_max_retries, DEFAULT_OCR_MAX_RETRIES);
    }

    #[test]
    fn data_dir_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_with_options(LoadOptions {
            config_path: None,
            data_dir: Some(dir.path().join("custom")),
        });
        assert_eq!(settings.data_dir, dir.path().join("custom"));
        assert_eq!(
            settings.history_path(),
            dir.path().join("custom").join("history.json")
        );
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let settings = load_settings_with_options(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/docutext.toml")),
            data_dir: None,
        });
        assert_eq!(settings.ocr_dpi, DEFAULT_OCR_DPI);
    }
}
