//! Intent dispatcher: decode, pick the vehicle profile, resolve, route.

use anyhow::Result;
use handler_bios::WireChannel;
use handler_input::{ComboReport, InputChannel};
use handler_profiles::{KeybindTable, Vehicle};
use handler_proto::{decode, Command, HandlerError, Intent, RawIntent, WireCommand};
use std::path::Path;
use tracing::{error, info, warn};

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Wire(WireCommand),
    Keys(ComboReport),
    /// The action matched a label with no keys bound; nothing was pressed.
    Unbound { note: String },
}

/// Owns the two actuation channels and the read-only keybind table.
///
/// Dispatch is sequential: every method that touches a channel takes
/// `&mut self`. Callers sharing a bridge across threads wrap it in a mutex.
pub struct Bridge {
    keybinds: KeybindTable,
    wire: WireChannel,
    input: InputChannel,
}

impl Bridge {
    pub fn new(keybinds: KeybindTable, wire: WireChannel, input: InputChannel) -> Self {
        info!(
            "bridge: ready (bios={}, input={}, keybind vehicles={})",
            wire.destination(),
            input.backend_name(),
            keybinds.vehicle_ids().count()
        );
        Self { keybinds, wire, input }
    }

    pub fn keybinds(&self) -> &KeybindTable {
        &self.keybinds
    }

    pub fn wire(&self) -> &WireChannel {
        &self.wire
    }

    /// Swap in a freshly loaded keybind table. On error the current table stays.
    pub fn reload_keybinds(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let table = KeybindTable::load(path)?;
        self.keybinds = table;
        Ok(())
    }

    /// Run one intent end to end. Every failure is logged here and
    /// reported as `false`; nothing is retried.
    pub fn dispatch(&mut self, raw: impl Into<RawIntent>) -> bool {
        match self.try_dispatch(raw) {
            Ok(Dispatched::Unbound { note }) => {
                warn!("bridge: {}", note);
                true
            }
            Ok(_) => true,
            Err(e @ HandlerError::NoMapping { .. }) => {
                warn!("bridge: {}", e);
                false
            }
            Err(e) => {
                error!("bridge: {}", e);
                false
            }
        }
    }

    pub fn try_dispatch(&mut self, raw: impl Into<RawIntent>) -> Result<Dispatched, HandlerError> {
        let intent = decode(raw)?;
        let command = self.resolve(&intent)?;
        info!("bridge: executing {} for {}", command, intent.vehicle);
        Ok(self.route(command))
    }

    /// Resolution only, no actuation.
    pub fn resolve(&self, intent: &Intent) -> Result<Command, HandlerError> {
        let vehicle = Vehicle::from_id(&intent.vehicle)
            .ok_or_else(|| HandlerError::UnknownVehicle(intent.vehicle.clone()))?;
        vehicle
            .resolve(&intent.action, &intent.parameters, &self.keybinds)
            .ok_or_else(|| HandlerError::NoMapping { action: intent.action.clone() })
    }

    fn route(&mut self, command: Command) -> Dispatched {
        match command {
            Command::Wire(cmd) => {
                self.wire.send_command(&cmd);
                Dispatched::Wire(cmd)
            }
            Command::Keyboard(combo) if combo.is_unbound() => Dispatched::Unbound {
                note: combo.note.unwrap_or_else(|| "key combo has no keys".to_string()),
            },
            Command::Keyboard(combo) => Dispatched::Keys(self.input.press_combo(&combo.keys)),
        }
    }

    pub fn close(&mut self) {
        self.wire.close();
    }
}
