//! `.nt/config` (TOML).

use std::collections::BTreeMap;
use std::path::Path;

use crate::{ConfigError, Result};

/// The repository configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub core: CoreConfig,
    pub medias: MediasConfig,
    pub remote: Option<RemoteConfig>,
    #[serde(rename = "deck")]
    pub decks: BTreeMap<String, DeckConfig>,
    #[serde(rename = "search")]
    pub searches: BTreeMap<String, SearchConfig>,
    #[serde(rename = "reference")]
    pub references: BTreeMap<String, ReferenceConfig>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CoreConfig {
    /// Markdown file extensions recognized during the walk.
    pub extensions: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MediasConfig {
    /// `ffmpeg` (production) or `random` (deterministic test payloads).
    pub command: String,
    /// Degree of parallelism for media transcoding.
    pub parallel: usize,
    /// Encoder preset handed to ffmpeg.
    pub preset: String,
}

impl Default for MediasConfig {
    fn default() -> Self {
        MediasConfig {
            command: "ffmpeg".to_string(),
            parallel: 1,
            preset: "medium".to_string(),
        }
    }
}

/// The `[remote]` table: a filesystem directory or an S3-compatible
/// bucket.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteConfig {
    Fs {
        dir: String,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        #[serde(default = "default_secure")]
        secure: bool,
    },
}

fn default_secure() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeckConfig {
    /// Query selecting the flashcards of this deck.
    pub query: String,
    #[serde(default)]
    pub new_flashcards_per_day: Option<u32>,
    #[serde(default)]
    pub max_flashcards_per_day: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    pub query: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Reference-manager integration (Zotero, Wikipedia, …). The core only
/// validates the declaration; lookups happen outside the core.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    pub manager: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

impl Config {
    /// Read `.nt/config`. A missing file yields the defaults.
    pub fn load(nt_dir: &Path) -> Result<Config> {
        let path = nt_dir.join("config");
        if !path.is_file() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid {
            file: ".nt/config".to_string(),
            reason: e.to_string(),
        })
    }

    /// The default configuration rendered for `nt init`.
    pub fn default_toml() -> String {
        let mut out = String::new();
        out.push_str("[core]\nextensions = [\"md\", \"markdown\"]\n\n");
        out.push_str("[medias]\ncommand = \"ffmpeg\"\nparallel = 1\npreset = \"medium\"\n");
        out
    }
}
