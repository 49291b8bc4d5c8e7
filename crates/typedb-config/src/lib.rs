//! Configuration for the typedb tools, loaded from `typedb.toml`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;

/// Environment variable overriding config discovery. Relative paths are resolved against the
/// scan root.
pub const TYPEDB_CONFIG_ENV_VAR: &str = "TYPEDB_CONFIG";

const CONFIG_FILE_NAMES: [&str; 2] = ["typedb.toml", ".typedb.toml"];

/// Target prefix shared by every event the typedb crates emit (`typedb.catalog`, `typedb.scan`,
/// ...).
pub const LOG_TARGET: &str = "typedb";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDbConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file. If the file cannot be opened, file logging is disabled
    /// while stderr logging stays active.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// Expand a bare level into directives for the typedb targets.
    ///
    /// `debug` becomes `warn,typedb=debug`: dependencies stay at `warn` unless the level is
    /// quieter than that. Anything that is not a bare level is taken as an `EnvFilter` directive
    /// string and passed through.
    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        let level = if trimmed.is_empty() {
            Self::default_level()
        } else {
            trimmed.to_ascii_lowercase()
        };

        match level.as_str() {
            "trace" | "debug" | "info" => format!("warn,{LOG_TARGET}={level}"),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(Self::normalize_level_directives("")))
    }

    /// Effective filter: the configured level, with `RUST_LOG` merged on top when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// File extensions (without the leading dot) of unit manifests.
    #[serde(default = "ScanConfig::default_extensions")]
    pub extensions: Vec<String>,

    /// File names that are never treated as unit manifests.
    #[serde(default = "ScanConfig::default_skip_files")]
    pub skip_files: Vec<String>,

    #[serde(default = "ScanConfig::default_follow_links")]
    pub follow_links: bool,
}

impl ScanConfig {
    fn default_extensions() -> Vec<String> {
        vec!["json".to_owned()]
    }

    fn default_skip_files() -> Vec<String> {
        vec!["module-info.json".to_owned(), "package-info.json".to_owned()]
    }

    fn default_follow_links() -> bool {
        true
    }

    fn normalize(&mut self) {
        for ext in &mut self.extensions {
            let trimmed = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            *ext = trimmed;
        }
        self.extensions.retain(|ext| !ext.is_empty());
        self.extensions.sort();
        self.extensions.dedup();
        if self.extensions.is_empty() {
            tracing::warn!(
                target: "typedb.config",
                "scan.extensions is empty; falling back to the default"
            );
            self.extensions = Self::default_extensions();
        }
    }

    /// Whether `path` names a unit manifest.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        if self.skip_files.iter().any(|skip| skip == name) {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: Self::default_extensions(),
            skip_files: Self::default_skip_files(),
            follow_links: Self::default_follow_links(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Walk each shared ancestor interface once per method collection instead of once per path.
    #[serde(default)]
    pub skip_visited_interfaces: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub show_constructors: bool,

    /// Render `java.lang.String` as `String`.
    #[serde(default = "ReportConfig::default_strip_java_lang")]
    pub strip_java_lang: bool,
}

impl ReportConfig {
    fn default_strip_java_lang() -> bool {
        true
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_constructors: false,
            strip_java_lang: Self::default_strip_java_lang(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl TypeDbConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: TypeDbConfig =
            toml::from_str(text).map_err(|err| ConfigError::Toml(err.message().to_owned()))?;
        config.scan.normalize();
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }
}

/// Locate the config file for `root`: [`TYPEDB_CONFIG_ENV_VAR`] first, then `typedb.toml` and
/// `.typedb.toml` in `root`.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(TYPEDB_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    CONFIG_FILE_NAMES
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the configuration for a scan root, falling back to defaults when none is present.
pub fn load_for_root(root: &Path) -> Result<(TypeDbConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(root) else {
        return Ok((TypeDbConfig::default(), None));
    };

    let config = TypeDbConfig::load_from_path(&path)?;
    Ok((config, Some(path)))
}

static TRACING_INIT: Once = Once::new();

/// Install the global `tracing` subscriber.
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init_tracing(logging: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = logging.env_filter();

        let mut make_writer = if !logging.stderr {
            BoxMakeWriter::new(std::io::sink)
        } else if cfg!(debug_assertions) {
            // Keeps `cargo test` output capture working.
            BoxMakeWriter::new(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        };

        let file = logging.file.as_ref().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        let file_failed = logging.file.is_some() && file.is_none();
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(Arc::new(file)));
        }

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if logging.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .is_ok();
        if installed && file_failed {
            if let Some(path) = logging.file.as_ref() {
                tracing::warn!(
                    target: "typedb.config",
                    path = %path.display(),
                    "failed to open log file; file logging disabled"
                );
            }
        }
    });
}
