use anyhow::Result;
use handler_input::scancodes;
use tracing::{info, warn};

use crate::keybinds::KeybindTable;
use crate::quantize::{candidates, LabelFamily};
use crate::Vehicle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeybindReport {
    pub bindings: usize,
    pub speeds: usize,
    pub altitudes: usize,
    pub headings: usize,
    /// (label, key) pairs whose key is not in the scan-code table.
    pub unknown_keys: Vec<(String, String)>,
    /// Labels present in the file with no keys bound.
    pub unbound: Vec<String>,
}

pub fn inspect_keybinds(table: &KeybindTable, vehicle: Vehicle) -> KeybindReport {
    let binds = table.binds_for(vehicle.id());
    let mut report = KeybindReport {
        bindings: binds.len(),
        speeds: candidates(LabelFamily::Speed, binds).len(),
        altitudes: candidates(LabelFamily::Altitude, binds).len(),
        headings: candidates(LabelFamily::Heading, binds).len(),
        ..KeybindReport::default()
    };

    for b in binds.iter() {
        if b.keys.is_empty() {
            report.unbound.push(b.label.clone());
        }
        for k in b.keys.iter().filter(|k| !scancodes::is_known(k)) {
            report.unknown_keys.push((b.label.clone(), k.clone()));
        }
    }
    report
}

/// Fails on keys the input channel could never press or labels dropped at
/// load; gaps and missing sections are only warnings.
pub fn check_keybinds(table: &KeybindTable) -> Result<()> {
    for s in table.skipped() {
        warn!("doctor: keybinds {} / '{}' dropped: {}", s.vehicle, s.label, s.reason);
    }
    anyhow::ensure!(table.skipped().is_empty(), "{} keybind label(s) are malformed", table.skipped().len());

    for vehicle in Vehicle::ALL {
        if table.vehicle(vehicle.id()).is_none() {
            warn!("doctor: no keybind section for {}; flight parameters will not resolve", vehicle);
            continue;
        }
        let r = inspect_keybinds(table, vehicle);
        info!(
            "doctor: {} has {} binding(s): {} speed, {} altitude, {} heading",
            vehicle, r.bindings, r.speeds, r.altitudes, r.headings
        );
        for label in &r.unbound {
            warn!("doctor: {} '{}' has no keys bound", vehicle, label);
        }
        for (label, key) in &r.unknown_keys {
            warn!("doctor: {} '{}' uses unknown key '{}'", vehicle, label, key);
        }
        anyhow::ensure!(r.unknown_keys.is_empty(), "{}: {} unknown key(s) in keybinds", vehicle, r.unknown_keys.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_families_and_gaps() {
        let table = KeybindTable::from_json_str(
            r#"{"OH-58D": {
                "Set 70 knt": ["lctrl", "f5"],
                "Set 80 knt": [],
                "Set 5000 ft": ["lalt", "5"],
                "Head to 200": ["lshift", "hyperspace"],
                "Toggle NVG": ["n"]
            }}"#,
        )
        .unwrap();

        let r = inspect_keybinds(&table, Vehicle::Oh58d);
        assert_eq!((r.bindings, r.speeds, r.altitudes, r.headings), (5, 2, 1, 1));
        assert_eq!(r.unbound, vec!["Set 80 knt"]);
        assert_eq!(r.unknown_keys, vec![("Head to 200".to_string(), "hyperspace".to_string())]);
        assert!(check_keybinds(&table).is_err());
    }

    #[test]
    fn clean_table_passes() {
        let table = KeybindTable::from_json_str(r#"{"OH-58D": {"Set 70 knt": ["lctrl", "f5"], "Set 80 knt": []}}"#).unwrap();
        check_keybinds(&table).unwrap();
    }

    #[test]
    fn missing_section_is_a_warning() {
        check_keybinds(&KeybindTable::default()).unwrap();
    }

    #[test]
    fn malformed_labels_fail() {
        let table = KeybindTable::from_json_str(r#"{"OH-58D": {"Set fast knt": ["lctrl"]}}"#).unwrap();
        assert!(check_keybinds(&table).is_err());
    }
}
