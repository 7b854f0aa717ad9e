use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use handler_bios::{doctor as bios_doctor, BiosConfig, WireChannel};
use handler_bridge::Bridge;
use handler_input::{InputChannel, InputConfig};
use handler_profiles::doctor::{check_keybinds, inspect_keybinds};
use handler_profiles::quantize::quantize;
use handler_profiles::{KeybindTable, LabelFamily, Vehicle};
use handler_proto::{Intent, RawIntent};

use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Parser)]
#[command(name = "handler", version, about = "DCS Handler - voice intent to cockpit command bridge")]
struct Cli {
    /// TOML config; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check config, bios address, input backend and keybinds.
    Doctor,
    /// Interactive loop: raw JSON intents or a few canned phrases.
    Run,
    /// Dispatch a single JSON intent and exit.
    Dispatch { intent: String },
    /// Print DCS-BIOS datagrams arriving on the configured bios address.
    Listen,
    Keybinds { #[command(subcommand)] cmd: KeybindsCmd },
}

#[derive(Debug, Subcommand)]
enum KeybindsCmd {
    /// List bindings and a summary per vehicle.
    List { vehicle: Option<String> },
    /// Show which preset a value snaps to.
    Quantize { vehicle: String, family: LabelFamily, value: f64 },
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    bios: BiosConfig,
    input: InputConfig,
    keybinds: KeybindsCfg,
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
struct KeybindsCfg {
    path: String,
}

impl Default for KeybindsCfg {
    fn default() -> Self {
        Self { path: "keybinds.json".to_string() }
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run => run(&cfg).await?,
        Command::Dispatch { intent } => dispatch_once(&cfg, intent)?,
        Command::Listen => listen(&cfg).await?,
        Command::Keybinds { cmd } => keybinds_cmd(&cfg, cmd)?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    bios_doctor::check_bios(&cfg.bios)?;
    anyhow::ensure!(cfg.input.inter_key_ms <= 1000, "input.inter_key_ms should be <= 1000");
    anyhow::ensure!(cfg.input.hold_ms <= 2000, "input.hold_ms should be <= 2000");
    let injector = cfg.input.backend.build().context("input backend")?;
    info!("doctor: input backend {} (OK)", injector.name());

    let table = KeybindTable::load(&cfg.keybinds.path)?;
    check_keybinds(&table)?;

    info!("doctor: OK");
    Ok(())
}

fn build_bridge(cfg: &Config) -> Result<Bridge> {
    let keybinds = match KeybindTable::load(&cfg.keybinds.path) {
        Ok(t) => t,
        Err(e) => {
            warn!("keybinds unavailable, flight parameters will not resolve: {:#}", e);
            KeybindTable::default()
        }
    };
    let wire = WireChannel::open(&cfg.bios).context("open bios sender")?;
    let input = InputChannel::from_config(&cfg.input).context("init input channel")?;
    Ok(Bridge::new(keybinds, wire, input))
}

fn dispatch_once(cfg: &Config, intent: String) -> Result<()> {
    let mut bridge = build_bridge(cfg)?;
    let ok = bridge.dispatch(intent);
    bridge.close();
    anyhow::ensure!(ok, "dispatch failed");
    Ok(())
}

async fn run(cfg: &Config) -> Result<()> {
    info!("run: starting");

    // one dispatch at a time: key combos from two intents must never interleave
    let bridge = Arc::new(Mutex::new(build_bridge(cfg)?));

    println!("Enter a command (e.g. 'master arm on') or raw JSON.");
    println!("Type 'reload' to re-read keybinds, 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line.context("read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.eq_ignore_ascii_case("reload") {
            let path = cfg.keybinds.path.clone();
            let mut b = bridge.lock().unwrap_or_else(|e| e.into_inner());
            match b.reload_keybinds(&path) {
                Ok(()) => println!("keybinds reloaded from {}", path),
                Err(e) => println!("reload failed, keeping previous keybinds: {:#}", e),
            }
            continue;
        }

        let raw: RawIntent = if input.starts_with('{') || input.starts_with('[') {
            input.into()
        } else {
            match mock_intent(input) {
                Some(intent) => {
                    println!("Generated intent: {}", serde_json::to_string(&intent)?);
                    intent.into()
                }
                None => {
                    println!("Could not understand command. Try valid JSON.");
                    continue;
                }
            }
        };

        let b = bridge.clone();
        let ok = tokio::task::spawn_blocking(move || {
            let mut b = b.lock().unwrap_or_else(|e| e.into_inner());
            b.dispatch(raw)
        })
        .await
        .context("dispatch task")?;
        println!("{}", if ok { "OK" } else { "FAILED" });
    }

    let mut b = bridge.lock().unwrap_or_else(|e| e.into_inner());
    let h = b.wire().health().clone();
    b.close();
    info!("run: exiting (datagrams sent={}, failed={})", h.sent, h.failed);
    Ok(())
}

/// Stand-in for the language model so the loop is usable offline.
fn mock_intent(text: &str) -> Option<Intent> {
    let text = text.to_ascii_lowercase();
    if text.contains("master arm on") {
        Some(Intent::new("OH-58D", "set_master_arm").with_param("state", 1))
    } else if text.contains("master arm off") {
        Some(Intent::new("OH-58D", "set_master_arm").with_param("state", 0))
    } else if text.contains("search") {
        Some(Intent::new("OH-58D", "search_sector").with_param("direction", "left"))
    } else {
        None
    }
}

async fn listen(cfg: &Config) -> Result<()> {
    let addr = cfg.bios.addr()?;
    let sock = tokio::net::UdpSocket::bind(addr)
        .await
        .with_context(|| format!("bind listener {}", addr))?;
    info!("listen: waiting for DCS-BIOS datagrams on {} (Ctrl-C to stop)", addr);

    let mut buf = vec![0u8; 2048];
    loop {
        tokio::select! {
            r = sock.recv_from(&mut buf) => {
                let (n, from) = r.context("recv datagram")?;
                let ts_ms = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                println!("{} {} {}", ts_ms, from, String::from_utf8_lossy(&buf[..n]).trim_end());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    info!("listen: stopped");
    Ok(())
}

fn keybinds_cmd(cfg: &Config, cmd: KeybindsCmd) -> Result<()> {
    let table = KeybindTable::load(&cfg.keybinds.path)?;
    match cmd {
        KeybindsCmd::List { vehicle } => {
            let vehicles = match vehicle {
                Some(v) => vec![v.parse::<Vehicle>()?],
                None => Vehicle::ALL.to_vec(),
            };
            for v in vehicles {
                let r = inspect_keybinds(&table, v);
                println!(
                    "{}: {} binding(s), {} speed / {} altitude / {} heading, {} unbound, {} unknown key(s)",
                    v, r.bindings, r.speeds, r.altitudes, r.headings, r.unbound.len(), r.unknown_keys.len()
                );
                for b in table.binds_for(v.id()).iter() {
                    println!("  {:<24} {}", b.label, if b.keys.is_empty() { "(unbound)".to_string() } else { b.keys.join("+") });
                }
            }
            for s in table.skipped() {
                println!("skipped {} / '{}': {}", s.vehicle, s.label, s.reason);
            }
        }
        KeybindsCmd::Quantize { vehicle, family, value } => {
            let v = vehicle.parse::<Vehicle>()?;
            match quantize(family, table.binds_for(v.id()), value) {
                Some(q) => println!(
                    "{} {} {} -> {} [{}]",
                    family,
                    value,
                    family.unit(),
                    q.label,
                    if q.keys.is_empty() { "unbound".to_string() } else { q.keys.join("+") }
                ),
                None => println!("{}: no {} labels in {}", v, family, cfg.keybinds.path),
            }
        }
    }
    Ok(())
}
