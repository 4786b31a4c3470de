//! Configuration loading and management.
//!
//! [`EclipseraConfig`] holds the defaults that outlive a single run: encoder
//! options, timeouts, concurrency limits and tool binary overrides. It can be
//! loaded from TOML, YAML or JSON, or discovered as `eclipsera.toml` in the
//! current directory or one of its parents. Per-run inputs such as a passphrase
//! live in [`AnalyzeOptions`].

use crate::{EclipseraError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the file [`EclipseraConfig::discover`] looks for.
pub const CONFIG_FILE_NAME: &str = "eclipsera.toml";

/// Top-level configuration.
///
/// # Example
///
/// ```rust
/// use eclipsera::core::config::EclipseraConfig;
///
/// let config = EclipseraConfig::default();
/// assert_eq!(config.analyze.probe_timeout_secs, 10);
///
/// // let config = EclipseraConfig::from_toml_file("eclipsera.toml")?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EclipseraConfig {
    #[serde(default)]
    pub encode: EncodeOptions,

    #[serde(default)]
    pub analyze: AnalyzeConfig,
}

/// Options for embedding a payload into a cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Use R, G and B regardless of `channels` (alpha is never included)
    #[serde(default)]
    pub use_all_channels: bool,

    /// Explicit channel letters; `None` or no valid letter means RGB
    #[serde(default)]
    pub channels: Option<Vec<String>>,

    /// zlib-compress the payload before embedding
    #[serde(default)]
    pub compress: bool,

    /// Halve the cover's dimensions until its PNG encoding fits `size_limit_bytes`
    #[serde(default = "default_true")]
    pub reduce_size: bool,

    #[serde(default = "default_size_limit_bytes")]
    pub size_limit_bytes: u64,

    /// File name suggested for the encoded image
    #[serde(default = "default_output_basename")]
    pub output_basename: String,
}

/// Timeouts, concurrency and tool lookup for analysis runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// Timeout for a single sweep probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for one collaborator, covering every process it spawns
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_secs: u64,

    /// Collaborators allowed to run at once (None = num_cpus * 2)
    #[serde(default)]
    pub max_concurrent_collaborators: Option<usize>,

    /// Run the selector sweep on lossless covers
    #[serde(default = "default_true")]
    pub sweep_enabled: bool,

    /// Add in-process probes to the sweep next to the external ones
    #[serde(default = "default_true")]
    pub native_probes: bool,

    #[serde(default)]
    pub tools: ToolPaths,
}

/// Optional per-tool binary overrides. Unset tools are looked up on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default)]
    pub binwalk: Option<PathBuf>,
    #[serde(default)]
    pub exiftool: Option<PathBuf>,
    #[serde(default)]
    pub foremost: Option<PathBuf>,
    #[serde(default)]
    pub zsteg: Option<PathBuf>,
    #[serde(default)]
    pub steghide: Option<PathBuf>,
    #[serde(default)]
    pub outguess: Option<PathBuf>,
}

impl ToolPaths {
    /// Override configured for `tool`, if any.
    pub fn get(&self, tool: &str) -> Option<&Path> {
        let path = match tool {
            "binwalk" => &self.binwalk,
            "exiftool" => &self.exiftool,
            "foremost" => &self.foremost,
            "zsteg" => &self.zsteg,
            "steghide" => &self.steghide,
            "outguess" => &self.outguess,
            _ => return None,
        };
        path.as_deref()
    }
}

/// Per-run inputs of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Name the image is stored under inside the run's workspace
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Passphrase handed to keyed tools
    #[serde(default)]
    pub password: Option<String>,

    /// Add the deep-only collaborators to the roster
    #[serde(default)]
    pub deep: bool,

    /// Directory that receives copies of captured stdout/stderr files, so
    /// the paths in the report outlive the run's workspace
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
fn default_size_limit_bytes() -> u64 {
    900 * 1024
}
fn default_output_basename() -> String {
    "eclipsera_encoded.png".to_string()
}
fn default_probe_timeout() -> u64 {
    10
}
fn default_collaborator_timeout() -> u64 {
    60
}
fn default_filename() -> String {
    "upload.png".to_string()
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            use_all_channels: false,
            channels: None,
            compress: false,
            reduce_size: true,
            size_limit_bytes: default_size_limit_bytes(),
            output_basename: default_output_basename(),
        }
    }
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            collaborator_timeout_secs: default_collaborator_timeout(),
            max_concurrent_collaborators: None,
            sweep_enabled: true,
            native_probes: true,
            tools: ToolPaths::default(),
        }
    }
}

impl AnalyzeConfig {
    /// Effective collaborator concurrency.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_collaborators
            .unwrap_or_else(|| num_cpus::get() * 2)
            .max(1)
    }
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            password: None,
            deep: false,
            log_dir: None,
        }
    }
}

impl EclipseraConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `EclipseraError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| EclipseraError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| EclipseraError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| EclipseraError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, picking the parser from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(EclipseraError::validation(format!(
                "Unsupported config file format: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover `eclipsera.toml` in the current directory or its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(EclipseraError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!("Using config file {}", candidate.display());
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| EclipseraError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
