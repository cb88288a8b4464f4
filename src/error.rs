//! Structured error types for the classification engine.
//!
//! Parsing never produces these: unmatched or malformed output degrades to a
//! fallback outcome instead. Errors are reserved for configuration problems,
//! I/O at the edges, and contract violations such as asking the renderer for
//! a kind it does not know.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("unknown render kind '{0}'")]
    UnknownRenderKind(String),

    #[error("blame: failed to spawn {program}: {source}")]
    BlameSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config: {field}: {reason}")]
    Config { field: String, reason: String },
}

impl EngineError {
    pub fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
