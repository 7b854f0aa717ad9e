use anyhow::Result;

use crate::BiosConfig;

pub fn check_bios(cfg: &BiosConfig) -> Result<()> {
    anyhow::ensure!(!cfg.host.trim().is_empty(), "bios.host missing");
    anyhow::ensure!(cfg.port > 0, "bios.port invalid");
    let addr = cfg.addr()?;
    if !addr.ip().is_loopback() {
        tracing::warn!("doctor: bios.host {} is not loopback; DCS-BIOS usually listens locally", addr.ip());
    }
    Ok(())
}
