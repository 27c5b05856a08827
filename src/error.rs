use thiserror::Error;

/// Failure raised while a single strategy evaluates a round.
/// The registry downgrades every one of these to an abstaining verdict.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("same-round verdict for '{0}' is missing")]
    MissingDependency(String),

    #[error("evaluation fault: {0}")]
    Fault(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("strategy '{0}' is registered twice")]
    DuplicateName(String),

    #[error("strategy '{strategy}' depends on unknown strategy '{dependency}'")]
    UnknownDependency { strategy: String, dependency: String },

    #[error("composite dependency cycle involving: {0}")]
    Cycle(String),
}

#[derive(Debug, Error)]
#[error("unrecognised outcome code '{0}'")]
pub struct OutcomeParseError(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid configuration: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("undo is disabled while a simulation is running")]
    SimulationRunning,

    #[error("simulation is already running")]
    AlreadyRunning,

    #[error("simulation is not running")]
    NotRunning,

    #[error("outcome history is empty")]
    EmptyHistory,

    #[error("shoe could not deal a hand after a fresh shuffle")]
    ShoeExhausted,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
