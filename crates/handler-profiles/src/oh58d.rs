//! OH-58D Kiowa Warrior.

use handler_proto::{Command, Parameters, WireCommand};
use tracing::warn;

use crate::keybinds::VehicleBinds;
use crate::{params, quantize, ActionProfile};

pub const ID: &str = "OH-58D";
pub const FLIGHT_PARAMETERS: &str = "set_flight_parameters";

#[derive(Debug, Clone, Copy)]
enum FlagValue {
    /// `parameters.state`, 1 when absent.
    State,
    /// Always 1: momentary buttons and selectors.
    Activate,
}

struct Direct {
    action: &'static str,
    identifier: &'static str,
    value: FlagValue,
}

const DIRECT: &[Direct] = &[
    Direct { action: "set_master_arm", identifier: "PLT_MASTER_ARM", value: FlagValue::State },
    // `direction` is accepted but the MMS has a single search toggle
    Direct { action: "search_sector", identifier: "MMS_SEARCH_TOGGLE", value: FlagValue::Activate },
    Direct { action: "weapon_hellfire", identifier: "PLT_WPN_SEL_HELLFIRE", value: FlagValue::Activate },
    Direct { action: "weapon_rockets", identifier: "PLT_WPN_SEL_ROCKET", value: FlagValue::Activate },
    Direct { action: "weapon_gun", identifier: "PLT_WPN_SEL_GUN", value: FlagValue::Activate },
    Direct { action: "laser_arm", identifier: "PLT_LASER_ARM", value: FlagValue::Activate },
];

const ACTIONS: &[&str] = &[
    "set_master_arm",
    "search_sector",
    "weapon_hellfire",
    "weapon_rockets",
    "weapon_gun",
    "laser_arm",
    FLIGHT_PARAMETERS,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Oh58d;

impl ActionProfile for Oh58d {
    fn vehicle_id(&self) -> &'static str {
        ID
    }

    fn actions(&self) -> &'static [&'static str] {
        ACTIONS
    }

    fn resolve(&self, action: &str, params: &Parameters, binds: &VehicleBinds) -> Option<Command> {
        if action == FLIGHT_PARAMETERS {
            return quantize::resolve_flight_parameters(params, binds);
        }

        let direct = DIRECT.iter().find(|d| d.action == action)?;
        let value = match direct.value {
            FlagValue::Activate => "1".to_string(),
            FlagValue::State => match params::present(params, "state") {
                None => "1".to_string(),
                Some(v) => match params::flag_text(v) {
                    Some(text) => text,
                    None => {
                        warn!("{}: unusable state {} for {}", ID, v, action);
                        return None;
                    }
                },
            },
        };
        Some(Command::Wire(WireCommand::new(direct.identifier, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(action: &str, p: serde_json::Value) -> Option<Command> {
        Oh58d.resolve(action, p.as_object().unwrap(), VehicleBinds::empty())
    }

    fn wire(identifier: &str, value: &str) -> Option<Command> {
        Some(Command::Wire(WireCommand::new(identifier, value)))
    }

    #[test]
    fn master_arm_uses_state_flag() {
        assert_eq!(resolve("set_master_arm", json!({"state": 0})), wire("PLT_MASTER_ARM", "0"));
        assert_eq!(resolve("set_master_arm", json!({"state": true})), wire("PLT_MASTER_ARM", "1"));
        assert_eq!(resolve("set_master_arm", json!({})), wire("PLT_MASTER_ARM", "1"));
        assert_eq!(resolve("set_master_arm", json!({"state": null})), wire("PLT_MASTER_ARM", "1"));
    }

    #[test]
    fn unusable_state_is_no_command() {
        assert_eq!(resolve("set_master_arm", json!({"state": [1]})), None);
    }

    #[test]
    fn constant_actions_send_one() {
        assert_eq!(resolve("weapon_hellfire", json!({})), wire("PLT_WPN_SEL_HELLFIRE", "1"));
        assert_eq!(resolve("weapon_rockets", json!({})), wire("PLT_WPN_SEL_ROCKET", "1"));
        assert_eq!(resolve("weapon_gun", json!({"state": 0})), wire("PLT_WPN_SEL_GUN", "1"));
        assert_eq!(resolve("laser_arm", json!({})), wire("PLT_LASER_ARM", "1"));
        assert_eq!(resolve("search_sector", json!({"direction": "left"})), wire("MMS_SEARCH_TOGGLE", "1"));
    }

    #[test]
    fn unknown_action_is_none() {
        assert_eq!(resolve("deploy_flares", json!({})), None);
    }

    #[test]
    fn flight_parameters_use_keybinds() {
        let binds = VehicleBinds::from_pairs(vec![("Set 70 knt", vec!["lctrl", "f5"]), ("Set 80 knt", vec!["lctrl", "f6"])]);
        let p = json!({"speed": 82});
        match Oh58d.resolve(FLIGHT_PARAMETERS, p.as_object().unwrap(), &binds) {
            Some(Command::Keyboard(k)) => assert_eq!(k.keys, vec!["lctrl", "f6"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn every_listed_action_resolves() {
        let binds = VehicleBinds::from_pairs(vec![("Set 80 knt", vec!["lctrl"])]);
        let p = json!({"speed": 80});
        for action in Oh58d.actions() {
            assert!(Oh58d.resolve(action, p.as_object().unwrap(), &binds).is_some(), "{action}");
        }
    }
}
