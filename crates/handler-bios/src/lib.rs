pub mod doctor;
pub mod state;
pub mod udp;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{SocketAddr, ToSocketAddrs};

pub use state::LinkHealth;
pub use udp::WireChannel;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7778;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BiosConfig {
    /// Where the sim's DCS-BIOS import listener runs. Usually the same box.
    pub host: String,

    /// DCS-BIOS import port.
    pub port: u16,
}

impl Default for BiosConfig {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_string(), port: DEFAULT_PORT }
    }
}

impl BiosConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("resolve bios address {}:{}", self.host, self.port))?
            .next()
            .with_context(|| format!("no address for {}:{}", self.host, self.port))
    }
}
