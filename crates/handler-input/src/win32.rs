use handler_proto::{HandlerError, Result};
use tracing::{debug, info};
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP,
    KEYEVENTF_SCANCODE,
};

use crate::injector::{resolve, KeyInjector};
use crate::scancodes::ScanCode;

/// Scan-code injection through `SendInput`. DirectInput titles read scan
/// codes, not virtual keys, so `wVk` stays zero.
#[derive(Debug)]
pub struct Win32Injector;

impl Win32Injector {
    pub fn new() -> Self {
        info!("input: Win32 SendInput backend initialized");
        Self
    }

    fn send(&self, sc: ScanCode, down: bool) -> Result<()> {
        let mut flags = KEYEVENTF_SCANCODE;
        if !down {
            flags |= KEYEVENTF_KEYUP;
        }
        if sc.extended {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT { wVk: 0, wScan: sc.code, dwFlags: flags, time: 0, dwExtraInfo: 0 },
            },
        };

        // SAFETY: one fully initialised INPUT, size passed matches the struct.
        let sent = unsafe { SendInput(1, &input, std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(HandlerError::Transmission(format!(
                "SendInput rejected scan code 0x{:02X} (blocked by UIPI?)",
                sc.code
            )));
        }
        debug!("input: {} 0x{:02X}", if down { "down" } else { "up" }, sc.code);
        Ok(())
    }
}

impl KeyInjector for Win32Injector {
    fn press(&mut self, key: &str) -> Result<()> {
        let sc = resolve(key)?;
        self.send(sc, true)
    }

    fn release(&mut self, key: &str) -> Result<()> {
        let sc = resolve(key)?;
        self.send(sc, false)
    }

    fn name(&self) -> &'static str { "win32" }
}
