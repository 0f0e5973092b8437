//! Configuration file loading.
//!
//! ```toml
//! # pgcypher.toml
//! strict = false
//!
//! [schema]
//! node_table = "pgraf.nodes"
//! edge_table = "pgraf.edges"
//! json_operator = "->>"
//! ```
//!
//! Lookup order: an explicit path, `pgcypher.toml` in the working directory,
//! then `<config dir>/pgcypher/config.toml`. Without any file the defaults
//! apply.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CypherError, CypherResult};
use crate::schema::GraphSchema;
use crate::translator::Translator;

pub const LOCAL_CONFIG_FILE: &str = "pgcypher.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Report skipped pattern, WHERE and RETURN text as errors.
    pub strict: bool,
    pub schema: GraphSchema,
}

impl Config {
    /// Load from `path`, or from the first default location that exists.
    pub fn load(path: Option<&Path>) -> CypherResult<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(CypherError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        match default_locations().into_iter().find(|p| p.exists()) {
            Some(found) => Self::from_file(&found),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> CypherResult<Self> {
        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    pub fn to_toml(&self) -> CypherResult<String> {
        toml::to_string_pretty(self).map_err(|e| CypherError::Config(e.to_string()))
    }

    pub fn translator(&self) -> Translator {
        Translator::new(self.schema.clone()).strict(self.strict)
    }
}

impl std::str::FromStr for Config {
    type Err = CypherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.schema.validate()?;
        Ok(config)
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("pgcypher").join("config.toml"));
    }
    locations
}
