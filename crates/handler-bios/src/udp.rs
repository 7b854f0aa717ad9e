use anyhow::{Context, Result};
use handler_proto::{HandlerError, WireCommand};
use std::net::{SocketAddr, UdpSocket};
use tracing::{debug, info, warn};

use crate::{state::LinkHealth, BiosConfig};

/// DCS-BIOS import sender: one text line per UDP datagram, no replies.
pub struct WireChannel {
    sock: Option<UdpSocket>,
    dest: SocketAddr,
    health: LinkHealth,
}

impl WireChannel {
    pub fn open(cfg: &BiosConfig) -> Result<Self> {
        let dest = cfg.addr()?;
        Self::open_to(dest)
    }

    pub fn open_to(dest: SocketAddr) -> Result<Self> {
        let bind = if dest.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let sock = UdpSocket::bind(bind).with_context(|| format!("bind udp sender for {}", dest))?;
        info!("bios: sender initialized for {}", dest);
        Ok(Self { sock: Some(sock), dest, health: LinkHealth::default() })
    }

    pub fn destination(&self) -> SocketAddr {
        self.dest
    }

    pub fn health(&self) -> &LinkHealth {
        &self.health
    }

    pub fn is_open(&self) -> bool {
        self.sock.is_some()
    }

    /// Best-effort send. Failures are logged and counted, never returned.
    pub fn send(&mut self, identifier: &str, value: &str) {
        if let Err(e) = self.try_send(identifier, value) {
            warn!("bios: {} ({} {})", e, identifier, value);
        }
    }

    pub fn send_command(&mut self, cmd: &WireCommand) {
        self.send(&cmd.identifier, &cmd.value);
    }

    pub fn try_send(&mut self, identifier: &str, value: &str) -> handler_proto::Result<()> {
        let result = self.transmit(identifier, value);
        match &result {
            Ok(()) => self.health.on_sent(),
            Err(e) => self.health.on_failed(&e.to_string()),
        }
        result
    }

    fn transmit(&self, identifier: &str, value: &str) -> handler_proto::Result<()> {
        if identifier.is_empty() || identifier.contains(char::is_whitespace) {
            return Err(HandlerError::Transmission(format!("bad identifier {:?}", identifier)));
        }
        if value.contains(['\n', '\r']) {
            return Err(HandlerError::Transmission(format!("value {:?} contains a line break", value)));
        }
        let sock = self
            .sock
            .as_ref()
            .ok_or_else(|| HandlerError::Transmission("sender is closed".into()))?;

        let line = WireCommand::new(identifier, value).to_line();
        let n = sock
            .send_to(line.as_bytes(), self.dest)
            .map_err(|e| HandlerError::Transmission(format!("send to {}: {}", self.dest, e)))?;
        if n != line.len() {
            return Err(HandlerError::Transmission(format!("short datagram: {} of {} bytes", n, line.len())));
        }
        debug!("bios: sent {}", line.trim_end());
        Ok(())
    }

    pub fn close(&mut self) {
        if self.sock.take().is_some() {
            info!("bios: sender closed (sent={}, failed={})", self.health.sent, self.health.failed);
        }
    }
}

impl Drop for WireChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn listener() -> UdpSocket {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        sock
    }

    fn recv_line(sock: &UdpSocket) -> String {
        let mut buf = [0u8; 1024];
        let (n, _) = sock.recv_from(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    #[test]
    fn one_datagram_per_command() {
        let rx = listener();
        let mut ch = WireChannel::open_to(rx.local_addr().unwrap()).unwrap();

        ch.send("PLT_MASTER_ARM", "1");
        ch.send("PLT_WPN_SEL_GUN", "1");

        assert_eq!(recv_line(&rx), "PLT_MASTER_ARM 1\n");
        assert_eq!(recv_line(&rx), "PLT_WPN_SEL_GUN 1\n");
        assert_eq!(ch.health().sent, 2);
        assert_eq!(ch.health().failed, 0);
    }

    #[test]
    fn send_after_close_is_counted_not_raised() {
        let rx = listener();
        let mut ch = WireChannel::open_to(rx.local_addr().unwrap()).unwrap();
        ch.close();
        assert!(!ch.is_open());

        ch.send("PLT_LASER_ARM", "1");
        assert_eq!(ch.health().sent, 0);
        assert_eq!(ch.health().failed, 1);
        assert!(matches!(ch.try_send("PLT_LASER_ARM", "1"), Err(HandlerError::Transmission(_))));
        assert_eq!(ch.health().consecutive_failures, 2);
    }

    #[test]
    fn line_breaks_in_value_are_rejected() {
        let rx = listener();
        let mut ch = WireChannel::open_to(rx.local_addr().unwrap()).unwrap();
        assert!(ch.try_send("PLT_MASTER_ARM", "1\nPLT_LASER_ARM 1").is_err());
        assert!(ch.try_send("PLT MASTER", "1").is_err());

        ch.send("PLT_MASTER_ARM", "0");
        assert_eq!(recv_line(&rx), "PLT_MASTER_ARM 0\n");
        assert_eq!(ch.health().consecutive_failures, 0);
    }

    #[test]
    fn opens_from_config() {
        let ch = WireChannel::open(&BiosConfig::default()).unwrap();
        assert_eq!(ch.destination(), "127.0.0.1:7778".parse().unwrap());
    }
}
