use handler_proto::{HandlerError, Result};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::scancodes::{self, ScanCode};

/// Platform capability for raw key events.
///
/// Implementations resolve the key identifier against the scan-code
/// table and fail with [`HandlerError::UnknownKey`] when it is not there.
/// Sequencing and timing live in [`crate::InputChannel`], not here.
pub trait KeyInjector: Send {
    fn press(&mut self, key: &str) -> Result<()>;
    fn release(&mut self, key: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub(crate) fn resolve(key: &str) -> Result<ScanCode> {
    scancodes::lookup(key).ok_or_else(|| HandlerError::UnknownKey(key.to_string()))
}

/// Dry-run backend: validates keys and logs what would be sent.
#[derive(Debug, Default)]
pub struct LogInjector;

impl KeyInjector for LogInjector {
    fn press(&mut self, key: &str) -> Result<()> {
        let sc = resolve(key)?;
        info!("input(dry-run): press {} (0x{:02X}{})", key, sc.code, if sc.extended { " ext" } else { "" });
        Ok(())
    }

    fn release(&mut self, key: &str) -> Result<()> {
        let sc = resolve(key)?;
        info!("input(dry-run): release {} (0x{:02X}{})", key, sc.code, if sc.extended { " ext" } else { "" });
        Ok(())
    }

    fn name(&self) -> &'static str { "dry-run" }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Press(String),
    Release(String),
}

/// Records every accepted event into a shared log. Clones share the log,
/// so a test can keep one handle while the channel owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingInjector {
    events: Arc<Mutex<Vec<KeyEvent>>>,
    failing_releases: Vec<String>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `release(key)` fail, to exercise the release path under errors.
    pub fn fail_release_of(mut self, key: &str) -> Self {
        self.failing_releases.push(key.to_ascii_lowercase());
        self
    }

    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn presses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e { KeyEvent::Press(k) => Some(k), _ => None })
            .collect()
    }

    pub fn releases(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e { KeyEvent::Release(k) => Some(k), _ => None })
            .collect()
    }

    fn record(&self, ev: KeyEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(ev);
    }
}

impl KeyInjector for RecordingInjector {
    fn press(&mut self, key: &str) -> Result<()> {
        resolve(key)?;
        self.record(KeyEvent::Press(key.to_string()));
        Ok(())
    }

    fn release(&mut self, key: &str) -> Result<()> {
        resolve(key)?;
        if self.failing_releases.contains(&key.to_ascii_lowercase()) {
            return Err(HandlerError::Transmission(format!("release of {} rejected", key)));
        }
        self.record(KeyEvent::Release(key.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str { "recording" }
}
