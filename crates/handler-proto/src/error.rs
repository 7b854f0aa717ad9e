use thiserror::Error;

/// Everything that can go wrong between receiving an intent and actuating it.
///
/// None of these are fatal: each one is logged where it is detected and
/// turned into a `false` dispatch result or an absent command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("failed to decode intent: {0}")]
    Decode(String),

    #[error("intent is not a single record: {0}")]
    Format(String),

    #[error("invalid intent: {0}")]
    Validation(String),

    #[error("no profile registered for vehicle '{0}'")]
    UnknownVehicle(String),

    #[error("no command mapping for action '{action}'")]
    NoMapping { action: String },

    #[error("missing keybind for '{label}'")]
    MissingBinding { label: String },

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("transmission failed: {0}")]
    Transmission(String),
}

pub type Result<T> = std::result::Result<T, HandlerError>;
