/// Problems with a tuning file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tuning json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

/// Rejected collaborator-to-core calls.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("grid size {0} is outside the supported range 10..=100")]
    GridSizeOutOfRange(usize),

    #[error("no miner with id {0}")]
    UnknownMiner(u32),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
