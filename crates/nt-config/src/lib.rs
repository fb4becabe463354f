//! Configuration loading.
//!
//! Three sources, all under the repository:
//! - `.nt/config` — TOML: core extensions, media transcoding, the remote,
//!   and deck/search/reference definitions;
//! - `.nt/lint` — YAML: lint rules and attribute schemas;
//! - `.ntignore` — gitignore-style pathspec lines at the working-tree root.
//!
//! Unknown fields, unknown rule names, duplicate schema attributes and
//! invalid patterns are all fatal at load time.

mod config;
mod error;
mod lint;

use std::path::Path;

pub use config::{
    Config, CoreConfig, DeckConfig, MediasConfig, ReferenceConfig, RemoteConfig, SearchConfig,
};
pub use error::ConfigError;
pub use lint::{LintConfig, LintRule, Severity};

use nt_utils::{PathSpec, PathSpecs};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Static defaults written into `.nt/.gitignore` at init.
pub const NT_GITIGNORE: &str = "database.db\nobjects/\nindex\nrefs/\n";

/// Load `.ntignore` from the working-tree root. Missing file ⇒ empty.
pub fn load_ignore(root: &Path) -> Result<PathSpecs> {
    let path = root.join(".ntignore");
    if !path.is_file() {
        return Ok(PathSpecs::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let mut lines = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Validate each pattern eagerly so a bad line fails the command.
        PathSpec::parse(line).map_err(|e| ConfigError::Invalid {
            file: ".ntignore".to_string(),
            reason: e.to_string(),
        })?;
        lines.push(line.to_string());
    }
    PathSpecs::parse_owned(&lines).map_err(|e| ConfigError::Invalid {
        file: ".ntignore".to_string(),
        reason: e.to_string(),
    })
}
