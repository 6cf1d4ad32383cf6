use crate::core::USER_AGENT;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub stop_on_first_match: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout_secs: 30,
            max_redirects: 10,
            stop_on_first_match: false,
        }
    }
}

impl Config {
    /// Load from a TOML file, or fall back to defaults when no path is
    /// given. Missing keys take their default values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&text)?)
            }
            None => Ok(Self::default()),
        }
    }
}
