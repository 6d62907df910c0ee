use serde::Deserialize;

use rollfile_base::{FilePath, PalHandle, ResultExt, RollfileResult, err};

use crate::location::Location;

/// Writer settings, usually read from a TOML file:
///
/// ```toml
/// path_template = "logs/2006-01-02.txt"
/// location = "+05:30"
/// flush_on_write = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterConfig {
    /// Layout the file path is derived from.
    pub path_template: String,
    #[serde(default)]
    pub location: Location,
    /// Sync after every plain write.
    #[serde(default)]
    pub flush_on_write: bool,
}

impl WriterConfig {
    pub fn new(path_template: impl Into<String>) -> Self {
        Self {
            path_template: path_template.into(),
            location: Location::default(),
            flush_on_write: false,
        }
    }
}

pub fn parse_config(text: &str) -> RollfileResult<WriterConfig> {
    toml::from_str(text).map_err(|e| err!("invalid writer configuration: {}", e))
}

/// Load a [`WriterConfig`] through the PAL.
pub fn load_config(pal: &PalHandle, path: &FilePath) -> RollfileResult<WriterConfig> {
    let text = pal
        .read_file_to_string(path)
        .with_context(|| format!("reading configuration {}", path))?;
    parse_config(&text).with_context(|| format!("loading configuration {}", path))
}
