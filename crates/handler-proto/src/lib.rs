pub mod command;
pub mod error;
pub mod intent;

pub use command::{Command, KeyCombo, WireCommand};
pub use error::{HandlerError, Result};
pub use intent::{decode, Intent, Parameters, RawIntent};
