use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Set-1 keyboard scan code, as consumed by DirectInput games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCode {
    pub code: u16,
    /// Needs the 0xE0 prefix (arrows, right-hand modifiers, nav cluster).
    pub extended: bool,
}

const fn sc(code: u16) -> ScanCode {
    ScanCode { code, extended: false }
}

const fn ext(code: u16) -> ScanCode {
    ScanCode { code, extended: true }
}

static SCANCODES: Lazy<HashMap<&'static str, ScanCode>> = Lazy::new(|| {
    HashMap::from([
        ("esc", sc(0x01)),
        ("1", sc(0x02)), ("2", sc(0x03)), ("3", sc(0x04)), ("4", sc(0x05)), ("5", sc(0x06)),
        ("6", sc(0x07)), ("7", sc(0x08)), ("8", sc(0x09)), ("9", sc(0x0A)), ("0", sc(0x0B)),
        ("-", sc(0x0C)), ("=", sc(0x0D)), ("backspace", sc(0x0E)), ("tab", sc(0x0F)),
        ("q", sc(0x10)), ("w", sc(0x11)), ("e", sc(0x12)), ("r", sc(0x13)), ("t", sc(0x14)),
        ("y", sc(0x15)), ("u", sc(0x16)), ("i", sc(0x17)), ("o", sc(0x18)), ("p", sc(0x19)),
        ("[", sc(0x1A)), ("]", sc(0x1B)), ("enter", sc(0x1C)), ("lctrl", sc(0x1D)),
        ("a", sc(0x1E)), ("s", sc(0x1F)), ("d", sc(0x20)), ("f", sc(0x21)), ("g", sc(0x22)),
        ("h", sc(0x23)), ("j", sc(0x24)), ("k", sc(0x25)), ("l", sc(0x26)),
        (";", sc(0x27)), ("'", sc(0x28)), ("`", sc(0x29)), ("lshift", sc(0x2A)), ("\\", sc(0x2B)),
        ("z", sc(0x2C)), ("x", sc(0x2D)), ("c", sc(0x2E)), ("v", sc(0x2F)), ("b", sc(0x30)),
        ("n", sc(0x31)), ("m", sc(0x32)), (",", sc(0x33)), (".", sc(0x34)), ("/", sc(0x35)),
        ("rshift", sc(0x36)), ("kp_*", sc(0x37)), ("lalt", sc(0x38)), ("space", sc(0x39)),
        ("capslock", sc(0x3A)),
        ("f1", sc(0x3B)), ("f2", sc(0x3C)), ("f3", sc(0x3D)), ("f4", sc(0x3E)), ("f5", sc(0x3F)),
        ("f6", sc(0x40)), ("f7", sc(0x41)), ("f8", sc(0x42)), ("f9", sc(0x43)), ("f10", sc(0x44)),
        ("f11", sc(0x57)), ("f12", sc(0x58)),
        ("rctrl", ext(0x1D)), ("ralt", ext(0x38)), ("lwin", ext(0x5B)), ("rwin", ext(0x5C)),
        ("home", ext(0x47)), ("up", ext(0x48)), ("pageup", ext(0x49)), ("left", ext(0x4B)),
        ("right", ext(0x4D)), ("end", ext(0x4F)), ("down", ext(0x50)), ("pagedown", ext(0x51)),
        ("insert", ext(0x52)), ("delete", ext(0x53)),
    ])
});

/// Case-insensitive lookup of a key identifier such as `"lctrl"` or `"F5"`.
pub fn lookup(key: &str) -> Option<ScanCode> {
    SCANCODES.get(key.trim().to_ascii_lowercase().as_str()).copied()
}

pub fn is_known(key: &str) -> bool {
    lookup(key).is_some()
}
