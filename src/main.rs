//! Notemirror - mirror a note between two terminals over a realtime relay.
//!
//! # Usage
//!
//! ```bash
//! notemirror
//! notemirror --variant plain
//! notemirror --device handheld --camera /tmp/camera/frame.png
//! notemirror --relay http://localhost:3000/ --save
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use notemirror::app::App;
use notemirror::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use notemirror::note::{NoteStore, Variant, default_store_path};
use notemirror::pairing::DeviceClass;
use notemirror::perf;
use notemirror::relay::{DEFAULT_RELAY_URL, RelayConfig};

/// Mirror a note to a paired device over a realtime relay
#[derive(Parser, Debug)]
#[command(name = "notemirror", version, about, long_about = None)]
struct Cli {
    /// Relay address (http, https, ws or wss)
    #[arg(long, value_name = "URL")]
    relay: Option<Url>,

    /// Note representation exchanged with the peer
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Form factor; only handheld devices can scan
    #[arg(long, value_enum)]
    device: Option<DeviceClass>,

    /// Image file the camera keeps overwriting with its latest frame
    #[arg(long, value_name = "PATH")]
    camera: Option<PathBuf>,

    /// Do not keep the plain note between runs
    #[arg(long)]
    no_persist: bool,

    /// Wait between a dropped connection and the next attempt
    #[arg(long, value_name = "MS")]
    reconnect_delay_ms: Option<u64>,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write relay, pairing and input events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn relay_config(flags: &ConfigFlags) -> Result<RelayConfig> {
    let raw = flags.relay.as_deref().unwrap_or(DEFAULT_RELAY_URL);
    let url = Url::parse(raw).with_context(|| format!("Invalid relay address {raw}"))?;
    let mut config = RelayConfig::new(url);
    if let Some(ms) = flags.reconnect_delay_ms {
        config = config.with_reconnect_delay(Duration::from_millis(ms));
    }
    Ok(config)
}

fn open_store(flags: &ConfigFlags, variant: Variant) -> Option<NoteStore> {
    if flags.no_persist || variant != Variant::Plain {
        return None;
    }
    match NoteStore::open(default_store_path()) {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!(error = %err, "note will not be kept between runs");
            None
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    tracing::debug!(?cli, ?effective, "resolved flags");

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("NOTEMIRROR_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        tracing::warn!(
            path = %debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            error = %err,
            "failed to initialize debug log"
        );
    }

    let variant = effective.variant.unwrap_or_default();
    let device = effective.device.unwrap_or_default();

    let app = App::new(relay_config(&effective)?)
        .with_variant(variant)
        .with_device(device, effective.camera.clone())
        .with_store(open_store(&effective, variant))
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}
