use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::quantize::LabelFamily;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub label: String,
    pub keys: Vec<String>,
}

/// One vehicle's label -> key sequence bindings, in file order.
#[derive(Debug, Clone, Default)]
pub struct VehicleBinds {
    bindings: Vec<Binding>,
}

static EMPTY_BINDS: VehicleBinds = VehicleBinds { bindings: Vec::new() };

impl VehicleBinds {
    pub fn empty() -> &'static VehicleBinds {
        &EMPTY_BINDS
    }

    pub fn from_pairs<L, K, I>(pairs: I) -> Self
    where
        L: Into<String>,
        K: Into<String>,
        I: IntoIterator<Item = (L, Vec<K>)>,
    {
        let bindings = pairs
            .into_iter()
            .map(|(label, keys)| Binding { label: label.into(), keys: keys.into_iter().map(Into::into).collect() })
            .collect();
        Self { bindings }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn keys_for(&self, label: &str) -> Option<&[String]> {
        self.bindings.iter().find(|b| b.label == label).map(|b| b.keys.as_slice())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A label dropped at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLabel {
    pub vehicle: String,
    pub label: String,
    pub reason: String,
}

/// Per-vehicle keybind table. Immutable once loaded; reload by loading a
/// new table and swapping it in.
#[derive(Debug, Clone, Default)]
pub struct KeybindTable {
    vehicles: HashMap<String, VehicleBinds>,
    skipped: Vec<SkippedLabel>,
    source: Option<PathBuf>,
}

impl KeybindTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).with_context(|| format!("read keybinds {}", path.display()))?;
        let mut table = Self::from_json_str(&s).with_context(|| format!("parse keybinds {}", path.display()))?;
        table.source = Some(path.to_path_buf());
        info!(
            "keybinds: loaded {} vehicle(s) from {} ({} label(s) skipped)",
            table.vehicles.len(),
            path.display(),
            table.skipped.len()
        );
        Ok(table)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s).context("keybinds are not valid JSON")?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            anyhow::bail!("keybinds root must be an object keyed by vehicle id");
        };

        let mut table = Self::default();
        for (vehicle, section) in root {
            let Value::Object(labels) = section else {
                warn!("keybinds: section '{}' is not an object; skipped", vehicle);
                continue;
            };

            let mut bindings = Vec::with_capacity(labels.len());
            for (label, keys) in labels {
                match parse_binding(&label, keys) {
                    Ok(binding) => bindings.push(binding),
                    Err(reason) => {
                        warn!("keybinds: {} / '{}' skipped: {}", vehicle, label, reason);
                        table.skipped.push(SkippedLabel { vehicle: vehicle.clone(), label, reason });
                    }
                }
            }
            table.vehicles.insert(vehicle, VehicleBinds { bindings });
        }
        Ok(table)
    }

    pub fn insert(&mut self, vehicle: impl Into<String>, binds: VehicleBinds) {
        self.vehicles.insert(vehicle.into(), binds);
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleBinds> {
        self.vehicles.get(id)
    }

    /// The vehicle's bindings, or an empty set when the file has no section for it.
    pub fn binds_for(&self, id: &str) -> &VehicleBinds {
        self.vehicle(id).unwrap_or(VehicleBinds::empty())
    }

    pub fn vehicle_ids(&self) -> impl Iterator<Item = &str> {
        self.vehicles.keys().map(String::as_str)
    }

    pub fn skipped(&self) -> &[SkippedLabel] {
        &self.skipped
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn parse_binding(label: &str, keys: Value) -> std::result::Result<Binding, String> {
    for family in LabelFamily::PRIORITY {
        if let Some(Err(e)) = family.magnitude(label) {
            return Err(format!("bad {} magnitude ({})", family.param(), e));
        }
    }

    let keys = match keys {
        // null or [] is a known label with nothing bound yet
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .map(|k| match k {
                Value::String(s) => Ok(s),
                other => Err(format!("key {} is not a string", other)),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
        other => return Err(format!("expected an array of keys, got {}", other)),
    };
    Ok(Binding { label: label.to_string(), keys })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "OH-58D": {
            "Set 90 knt": ["lctrl", "f7"],
            "Set 70 knt": ["lctrl", "f5"],
            "Set 80 knt": ["lctrl", "f6"],
            "Set fast knt": ["lctrl", "f8"],
            "Head to 200": ["lalt", "2"],
            "Set 5000 ft": null,
            "Broken": "lctrl"
        },
        "AH-64D": "not a section"
    }"#;

    #[test]
    fn loads_from_disk_in_file_order() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();

        let table = KeybindTable::load(f.path()).unwrap();
        assert_eq!(table.source(), Some(f.path()));

        let binds = table.vehicle("OH-58D").unwrap();
        let labels: Vec<&str> = binds.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Set 90 knt", "Set 70 knt", "Set 80 knt", "Head to 200", "Set 5000 ft"]);
        assert_eq!(binds.keys_for("Set 80 knt"), Some(&["lctrl".to_string(), "f6".to_string()][..]));
    }

    #[test]
    fn malformed_labels_are_skipped_not_fatal() {
        let table = KeybindTable::from_json_str(SAMPLE).unwrap();
        let skipped: Vec<&str> = table.skipped().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(skipped, vec!["Set fast knt", "Broken"]);
        assert!(table.vehicle("AH-64D").is_none());
    }

    #[test]
    fn null_binding_is_kept_as_empty() {
        let table = KeybindTable::from_json_str(SAMPLE).unwrap();
        assert_eq!(table.binds_for("OH-58D").keys_for("Set 5000 ft"), Some(&[][..]));
    }

    #[test]
    fn unknown_vehicle_gets_empty_binds() {
        let table = KeybindTable::from_json_str(SAMPLE).unwrap();
        assert!(table.binds_for("F-16C").is_empty());
    }

    #[test]
    fn rejects_non_object_root_and_missing_file() {
        assert!(KeybindTable::from_json_str("[1, 2]").is_err());
        assert!(KeybindTable::from_json_str("{ nope").is_err());
        assert!(KeybindTable::load("/definitely/not/here/keybinds.json").is_err());
    }

    #[test]
    fn non_string_key_skips_label() {
        let table = KeybindTable::from_json_str(r#"{"OH-58D": {"Head to 90": ["lalt", 9]}}"#).unwrap();
        assert!(table.binds_for("OH-58D").is_empty());
        assert_eq!(table.skipped().len(), 1);
    }
}
