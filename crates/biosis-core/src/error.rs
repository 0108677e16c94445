use thiserror::Error;

/// Raised while a carrier is being declared, before anything is compiled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("cannot override the return button with '{location}'")]
    ReservedSlot { location: String },

    #[error("invalid deck location '{0}': expected [folder/]row,col")]
    InvalidLocation(String),

    #[error("a deck carrier needs at least one location")]
    NoLocation,

    #[error("phrase specification is empty")]
    EmptyPhrase,

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(
        "function name '{name}' is declared in both '{first}' and '{second}'; names must be unique"
    )]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no function address was supplied")]
    EmptyAddress,

    #[error("'{0}' is not a dot-syntax address (module.function)")]
    NotAnAddress(String),

    #[error("module '{0}' not found")]
    ModuleNotFound(String),

    #[error("function '{name}' not found in module '{module}'")]
    FunctionNotFound { module: String, name: String },
}

/// Usage errors for the listing and fallback-run paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("multiple list prefixes given ({0:?}); use a single dot-syntax prefix")]
    MultiplePrefixes(Vec<String>),

    #[error("depth can only be used together with --list")]
    DepthWithoutList,

    #[error("expected exactly one function address, got {0:?}")]
    ExpectedOneAddress(Vec<String>),
}
