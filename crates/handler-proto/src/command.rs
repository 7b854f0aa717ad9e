use serde::{Deserialize, Serialize};
use std::fmt;

/// A control value sent straight to the simulator's control bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCommand {
    pub identifier: String,
    pub value: String,
}

impl WireCommand {
    pub fn new(identifier: impl Into<String>, value: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), value: value.into() }
    }

    /// Wire form: `"<identifier> <value>\n"`.
    pub fn to_line(&self) -> String {
        format!("{} {}\n", self.identifier, self.value)
    }
}

/// Keys pressed left-to-right and released right-to-left.
///
/// An empty combo means an action matched a label that has no keys bound
/// to it; `note` then says which label is missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyCombo {
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl KeyCombo {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys, note: None }
    }

    pub fn unbound(note: impl Into<String>) -> Self {
        Self { keys: Vec::new(), note: Some(note.into()) }
    }

    pub fn is_unbound(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Wire(WireCommand),
    Keyboard(KeyCombo),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Wire(w) => write!(f, "{} {}", w.identifier, w.value),
            Command::Keyboard(k) if k.is_unbound() => write!(f, "keys [] (unbound)"),
            Command::Keyboard(k) => write!(f, "keys [{}]", k.keys.join("+")),
        }
    }
}
