pub mod injector;
pub mod scancodes;
#[cfg(windows)]
pub mod win32;

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

pub use injector::{KeyEvent, KeyInjector, LogInjector, RecordingInjector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputBackend {
    /// Real OS key events (Windows SendInput).
    Os,
    /// Validate and log only.
    DryRun,
}

impl Default for InputBackend {
    fn default() -> Self {
        if cfg!(windows) { InputBackend::Os } else { InputBackend::DryRun }
    }
}

impl InputBackend {
    pub fn build(self) -> Result<Box<dyn KeyInjector>> {
        match self {
            InputBackend::DryRun => Ok(Box::new(LogInjector)),
            #[cfg(windows)]
            InputBackend::Os => Ok(Box::new(win32::Win32Injector::new())),
            #[cfg(not(windows))]
            InputBackend::Os => anyhow::bail!("input.backend=os needs Windows; use \"dry-run\" on this platform"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub backend: InputBackend,

    /// Pause after each press and each release. The sim drops keys that
    /// arrive faster than its input poll.
    pub inter_key_ms: u64,

    /// How long the full chord is held before releasing.
    pub hold_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { backend: InputBackend::default(), inter_key_ms: 50, hold_ms: 100 }
    }
}

impl InputConfig {
    pub fn timing(&self) -> ComboTiming {
        ComboTiming {
            inter_key: Duration::from_millis(self.inter_key_ms),
            hold: Duration::from_millis(self.hold_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboTiming {
    pub inter_key: Duration,
    pub hold: Duration,
}

impl Default for ComboTiming {
    fn default() -> Self {
        InputConfig::default().timing()
    }
}

impl ComboTiming {
    /// No delays at all; for tests and dry runs.
    pub fn immediate() -> Self {
        Self { inter_key: Duration::ZERO, hold: Duration::ZERO }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComboReport {
    pub pressed: Vec<String>,
    pub skipped: Vec<String>,
    pub released: Vec<String>,
}

/// Synthetic keyboard channel. `press_combo` blocks for the whole
/// sequence and takes `&mut self`, so one channel never interleaves two
/// combos.
pub struct InputChannel {
    injector: Box<dyn KeyInjector>,
    timing: ComboTiming,
}

impl InputChannel {
    pub fn new(injector: Box<dyn KeyInjector>, timing: ComboTiming) -> Self {
        info!("input: channel ready (backend={}, inter_key={:?}, hold={:?})", injector.name(), timing.inter_key, timing.hold);
        Self { injector, timing }
    }

    pub fn from_config(cfg: &InputConfig) -> Result<Self> {
        Ok(Self::new(cfg.backend.build()?, cfg.timing()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.injector.name()
    }

    /// Press `keys` left to right, hold, then release whatever actually
    /// went down in reverse order. Unknown keys are skipped, never fatal.
    pub fn press_combo<S: AsRef<str>>(&mut self, keys: &[S]) -> ComboReport {
        let mut report = ComboReport::default();
        if keys.is_empty() {
            return report;
        }

        for key in keys.iter().map(|k| k.as_ref()) {
            match self.injector.press(key) {
                Ok(()) => {
                    report.pressed.push(key.to_string());
                    pause(self.timing.inter_key);
                }
                Err(e) => {
                    error!("input: {} in combo; skipping", e);
                    report.skipped.push(key.to_string());
                }
            }
        }

        pause(self.timing.hold);

        // every pressed key goes back up, even if an earlier release failed
        for key in report.pressed.iter().rev() {
            match self.injector.release(key) {
                Ok(()) => report.released.push(key.clone()),
                Err(e) => warn!("input: release of {} failed: {}", key, e),
            }
            pause(self.timing.inter_key);
        }

        let all: Vec<&str> = keys.iter().map(|k| k.as_ref()).collect();
        info!("input: executed combo {:?} (pressed={}, skipped={})", all, report.pressed.len(), report.skipped.len());
        report
    }
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn channel() -> (InputChannel, RecordingInjector) {
        let rec = RecordingInjector::new();
        (InputChannel::new(Box::new(rec.clone()), ComboTiming::immediate()), rec)
    }

    #[test]
    fn unknown_key_is_skipped_and_the_rest_released_in_reverse() {
        let (mut ch, rec) = channel();
        let report = ch.press_combo(&["lctrl", "unknownkey", "a"]);

        assert_eq!(report.pressed, vec!["lctrl", "a"]);
        assert_eq!(report.skipped, vec!["unknownkey"]);
        assert_eq!(rec.presses(), vec!["lctrl", "a"]);
        assert_eq!(rec.releases(), vec!["a", "lctrl"]);
    }

    #[test]
    fn every_press_precedes_every_release() {
        let (mut ch, rec) = channel();
        ch.press_combo(&["lshift", "lalt", "f5"]);
        assert_eq!(
            rec.events(),
            vec![
                KeyEvent::Press("lshift".into()),
                KeyEvent::Press("lalt".into()),
                KeyEvent::Press("f5".into()),
                KeyEvent::Release("f5".into()),
                KeyEvent::Release("lalt".into()),
                KeyEvent::Release("lshift".into()),
            ]
        );
    }

    #[test]
    fn failed_release_does_not_stop_the_others() {
        let rec = RecordingInjector::new().fail_release_of("a");
        let mut ch = InputChannel::new(Box::new(rec.clone()), ComboTiming::immediate());
        let report = ch.press_combo(&["lctrl", "a"]);

        assert_eq!(report.released, vec!["lctrl"]);
        assert_eq!(rec.releases(), vec!["lctrl"]);
    }

    #[test]
    fn empty_combo_emits_nothing() {
        let (mut ch, rec) = channel();
        let report = ch.press_combo::<&str>(&[]);
        assert_eq!(report, ComboReport::default());
        assert!(rec.events().is_empty());
    }

    #[test]
    fn all_unknown_keys_release_nothing() {
        let (mut ch, rec) = channel();
        let report = ch.press_combo(&["nope", "nada"]);
        assert!(report.pressed.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert!(rec.events().is_empty());
    }

    #[test]
    fn timing_is_applied() {
        let rec = RecordingInjector::new();
        let timing = ComboTiming { inter_key: Duration::from_millis(5), hold: Duration::from_millis(20) };
        let mut ch = InputChannel::new(Box::new(rec), timing);

        let start = Instant::now();
        ch.press_combo(&["lctrl", "a"]);
        // 2 presses + 2 releases at 5ms, plus 20ms hold
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn config_defaults() {
        let cfg = InputConfig::default();
        assert_eq!(cfg.timing(), ComboTiming { inter_key: Duration::from_millis(50), hold: Duration::from_millis(100) });
        assert!(InputBackend::DryRun.build().is_ok());
    }
}
