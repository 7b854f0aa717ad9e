pub mod doctor;
pub mod keybinds;
pub mod oh58d;
pub mod params;
pub mod quantize;

use handler_proto::{Command, HandlerError, Parameters};
use std::fmt;
use std::str::FromStr;

pub use keybinds::{KeybindTable, VehicleBinds};
pub use quantize::LabelFamily;

/// Per-vehicle action resolution. Implementations are stateless.
pub trait ActionProfile: Sync {
    fn vehicle_id(&self) -> &'static str;

    /// Actions this profile knows, for listings and checks.
    fn actions(&self) -> &'static [&'static str];

    /// `None` when the action is unknown or the parameters do not resolve.
    fn resolve(&self, action: &str, params: &Parameters, binds: &VehicleBinds) -> Option<Command>;
}

/// Every vehicle with a registered profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vehicle {
    Oh58d,
}

impl Vehicle {
    pub const ALL: [Vehicle; 1] = [Vehicle::Oh58d];

    /// Exact id first, then a case-insensitive match.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.id() == id)
            .or_else(|| Self::ALL.into_iter().find(|v| v.id().eq_ignore_ascii_case(id)))
    }

    pub fn id(self) -> &'static str {
        self.profile().vehicle_id()
    }

    pub fn profile(self) -> &'static dyn ActionProfile {
        match self {
            Vehicle::Oh58d => &oh58d::Oh58d,
        }
    }

    /// Resolve against this vehicle's slice of the keybind table.
    pub fn resolve(self, action: &str, params: &Parameters, table: &KeybindTable) -> Option<Command> {
        self.profile().resolve(action, params, table.binds_for(self.id()))
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Vehicle {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vehicle::from_id(s).ok_or_else(|| HandlerError::UnknownVehicle(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handler_proto::WireCommand;

    #[test]
    fn registry_lookup() {
        assert_eq!(Vehicle::from_id("OH-58D"), Some(Vehicle::Oh58d));
        assert_eq!(Vehicle::from_id("oh-58d"), Some(Vehicle::Oh58d));
        assert_eq!(Vehicle::from_id("AH-64D"), None);
        assert_eq!("F-16C".parse::<Vehicle>(), Err(HandlerError::UnknownVehicle("F-16C".into())));
        assert_eq!(Vehicle::Oh58d.to_string(), "OH-58D");
    }

    #[test]
    fn resolves_through_the_table_slice() {
        let mut table = KeybindTable::default();
        table.insert("OH-58D", VehicleBinds::from_pairs(vec![("Head to 90", vec!["lshift", "9"])]));

        let mut params = Parameters::new();
        params.insert("heading".into(), 95.into());
        let cmd = Vehicle::Oh58d.resolve(oh58d::FLIGHT_PARAMETERS, &params, &table);
        assert!(matches!(cmd, Some(Command::Keyboard(k)) if k.keys == vec!["lshift", "9"]));

        let cmd = Vehicle::Oh58d.resolve("laser_arm", &Parameters::new(), &table);
        assert_eq!(cmd, Some(Command::Wire(WireCommand::new("PLT_LASER_ARM", "1"))));
    }
}
