//! Nearest-label quantization for continuous flight parameters.
//!
//! The sim only exposes discrete autopilot presets ("Set 80 knt",
//! "Head to 200", ...), each bound to a key chord. A requested value is
//! snapped to the preset whose magnitude is closest.

use handler_proto::{Command, HandlerError, KeyCombo, Parameters};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::keybinds::VehicleBinds;
use crate::params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFamily {
    Speed,
    Altitude,
    Heading,
}

impl LabelFamily {
    /// Order in which `set_flight_parameters` looks at its parameters.
    pub const PRIORITY: [LabelFamily; 3] = [LabelFamily::Speed, LabelFamily::Altitude, LabelFamily::Heading];

    pub fn param(self) -> &'static str {
        match self {
            LabelFamily::Speed => "speed",
            LabelFamily::Altitude => "altitude",
            LabelFamily::Heading => "heading",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            LabelFamily::Speed => "knt",
            LabelFamily::Altitude => "ft",
            LabelFamily::Heading => "deg",
        }
    }

    pub fn label(self, magnitude: i64) -> String {
        match self {
            LabelFamily::Speed => format!("Set {} knt", magnitude),
            LabelFamily::Altitude => format!("Set {} ft", magnitude),
            LabelFamily::Heading => format!("Head to {}", magnitude),
        }
    }

    /// `None` if the label is not of this family, `Some(Err)` if it has the
    /// family's shape but the number does not parse.
    pub fn magnitude(self, label: &str) -> Option<Result<i64, ParseIntError>> {
        let body = match self {
            LabelFamily::Speed => label.strip_prefix("Set ")?.strip_suffix(" knt")?,
            LabelFamily::Altitude => label.strip_prefix("Set ")?.strip_suffix(" ft")?,
            LabelFamily::Heading => label.strip_prefix("Head to ")?,
        };
        Some(body.trim().parse::<i64>())
    }
}

impl fmt::Display for LabelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

impl FromStr for LabelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speed" | "knt" | "knots" => Ok(LabelFamily::Speed),
            "altitude" | "alt" | "ft" => Ok(LabelFamily::Altitude),
            "heading" | "hdg" => Ok(LabelFamily::Heading),
            other => Err(format!("unknown parameter family '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub label: &'a str,
    pub magnitude: i64,
    pub keys: &'a [String],
}

/// Labels of `family` in table order. Malformed magnitudes are skipped.
pub fn candidates(family: LabelFamily, binds: &VehicleBinds) -> Vec<Candidate<'_>> {
    binds
        .iter()
        .filter_map(|b| match family.magnitude(&b.label)? {
            Ok(magnitude) => Some(Candidate { label: &b.label, magnitude, keys: &b.keys }),
            Err(e) => {
                debug!("quantize: skipping '{}': {}", b.label, e);
                None
            }
        })
        .collect()
}

/// Closest candidate by linear distance `|magnitude - target|`.
///
/// Ties keep the earliest candidate: the comparison is strict, so a later
/// candidate at the same distance never displaces the current best. Headings
/// are not wrapped (355 is 355 away from 0, not 5).
pub fn nearest<'c, 'a>(cands: &'c [Candidate<'a>], target: f64) -> Option<&'c Candidate<'a>> {
    let mut best: Option<(&Candidate<'a>, f64)> = None;
    for c in cands {
        let d = (c.magnitude as f64 - target).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((c, d)),
        }
    }
    best.map(|(c, _)| c)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    pub family: LabelFamily,
    pub requested: f64,
    pub magnitude: i64,
    pub label: String,
    pub keys: Vec<String>,
}

/// Snap `target` to the nearest `family` label bound for this vehicle.
/// `None` when the vehicle has no label of that family at all.
pub fn quantize(family: LabelFamily, binds: &VehicleBinds, target: f64) -> Option<Quantized> {
    let cands = candidates(family, binds);
    let c = nearest(&cands, target)?;
    Some(Quantized {
        family,
        requested: target,
        magnitude: c.magnitude,
        label: c.label.to_string(),
        keys: c.keys.to_vec(),
    })
}

/// Resolve `set_flight_parameters`-style requests.
///
/// One family per call: the first of speed, altitude, heading that is
/// present decides the command, and the others are ignored. A family with
/// no labels in the table cannot decide anything, so the next one is tried.
pub fn resolve_flight_parameters(params: &Parameters, binds: &VehicleBinds) -> Option<Command> {
    for family in LabelFamily::PRIORITY {
        let Some(raw) = params::present(params, family.param()) else { continue };
        let Some(target) = params::magnitude(raw) else {
            warn!("quantize: {} = {} is not a number", family, raw);
            return None;
        };
        let Some(q) = quantize(family, binds, target) else {
            debug!("quantize: no '{}' labels bound; trying next parameter", family);
            continue;
        };

        info!("quantize: target {} {} {} -> {} ({})", family, target, family.unit(), q.magnitude, q.label);
        if q.keys.is_empty() {
            let gap = HandlerError::MissingBinding { label: q.label };
            warn!("quantize: {}", gap);
            return Some(Command::Keyboard(KeyCombo::unbound(gap.to_string())));
        }
        return Some(Command::Keyboard(KeyCombo::new(q.keys)));
    }
    None
}
