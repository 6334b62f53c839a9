//! Logging settings, as read from the `[logging]` table of a config file
//!
//! ```toml
//! [logging]
//! level = "warn"
//! console = "pretty"
//!
//! [logging.components]
//! kshetra_cache = "trace"
//!
//! [logging.file]
//! directory = "/var/log/kshetra"
//! rotation = "hourly"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Crates whose output `-v` turns up
pub const ENGINE_TARGETS: [&str; 3] = ["kshetra_select", "kshetra_report", "kshetra_cache"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for every target without a directive of its own
    pub level: String,

    /// Per-crate levels, keyed by tracing target
    pub components: BTreeMap<String, String>,

    pub console: ConsoleFormat,

    /// Also write JSONL to rotated files
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            components: BTreeMap::new(),
            console: ConsoleFormat::default(),
            file: None,
        }
    }
}

impl LogConfig {
    /// Raise the engine crates to debug (`1`) or trace (`2` and up)
    ///
    /// Levels set under `[logging.components]` for other targets are kept;
    /// zero leaves the config as it is.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let level = match verbose {
            0 => return self,
            1 => "debug",
            _ => "trace",
        };
        for target in ENGINE_TARGETS {
            self.components.insert(target.to_string(), level.to_string());
        }
        self
    }

    /// The filter string handed to `EnvFilter`, base level first
    pub fn directives(&self) -> String {
        std::iter::once(self.level.clone())
            .chain(
                self.components
                    .iter()
                    .map(|(target, level)| format!("{target}={level}")),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// How events are written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line, colored
    Pretty,
    /// JSONL with the span list, for piping
    Json,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name prefix; files end in `.jsonl`
    pub prefix: String,
    pub rotation: RotationStrategy,
    /// Oldest files beyond this are deleted
    pub max_files: Option<usize>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "kshetra".to_string(),
            rotation: RotationStrategy::Daily,
            max_files: Some(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// A single file
    Never,
}
