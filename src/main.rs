//! Command-line interface for the sniffer.
//!
//! Three modes: `capture` fills a store from a live device, `list` prints a
//! stored capture, `replay` re-sends one stored payload. Listings number
//! messages from 1; `replay --index` takes the same numbers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use wstap::{
    CaptureConfig, DEFAULT_STORE_FILE, MessageStore, ReplayConfig, Sniffer, message, replay,
};

const TEXT_PREVIEW_CHARS: usize = 80;
const HEX_PREVIEW_BYTES: usize = 32;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Passive WebSocket sniffer: capture frames off the wire, list them, replay them"
)]
struct Args {
    /// Log debug-level detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture WebSocket frames until interrupted (needs capture privileges)
    Capture {
        /// TCP port to filter on (all TCP traffic when omitted)
        #[arg(short, long)]
        port: Option<u16>,

        /// Device to capture on (first available when omitted)
        #[arg(short, long)]
        device: Option<String>,

        /// Store file to write on exit (implies --save)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write captured messages to the default store file on exit
        #[arg(short, long)]
        save: bool,
    },

    /// List messages from a store file
    List {
        /// Store file to read
        #[arg(short, long, default_value = DEFAULT_STORE_FILE)]
        file: PathBuf,

        /// Hex preview for payloads without a text preview
        #[arg(long)]
        hex: bool,
    },

    /// Re-send a stored payload to a TCP endpoint
    Replay {
        /// Message number, as printed by `list`
        #[arg(short, long)]
        index: usize,

        /// Target IPv4 address
        #[arg(short, long)]
        target: String,

        /// Target TCP port
        #[arg(short, long)]
        port: u16,

        /// Store file to read
        #[arg(short, long, default_value = DEFAULT_STORE_FILE)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Capture {
            port,
            device,
            output,
            save,
        } => run_capture(port, device, output, save),
        Command::List { file, hex } => run_list(&file, hex),
        Command::Replay {
            index,
            target,
            port,
            file,
        } => run_replay(index, &target, port, &file),
    }
}

fn run_capture(
    port: Option<u16>,
    device: Option<String>,
    output: Option<PathBuf>,
    save: bool,
) -> Result<()> {
    let mut config = CaptureConfig::new();
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(device) = device {
        config = config.with_device(device);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("cannot install Ctrl-C handler")?;

    info!("press Ctrl-C to stop capturing");
    let mut sniffer = Sniffer::new(config);
    sniffer.run(&stop).context("capture failed")?;

    let stats = sniffer.stats();
    let store = sniffer.into_store();
    println!(
        "Captured {} messages ({} packets seen)",
        store.len(),
        stats.packets
    );

    if save || output.is_some() {
        let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));
        store
            .save(&path)
            .with_context(|| format!("cannot save to {}", path.display()))?;
        println!("Saved {} messages to {}", store.len(), path.display());
    }
    Ok(())
}

fn run_list(file: &Path, hex: bool) -> Result<()> {
    let mut store = MessageStore::new();
    store
        .load(file)
        .with_context(|| format!("cannot load {}", file.display()))?;

    if store.is_empty() {
        println!("No captured messages");
        return Ok(());
    }

    println!("\nCaptured messages ({}):\n", store.len());
    for (i, msg) in store.iter().enumerate() {
        let mut markers = String::new();
        if msg.is_masked {
            markers.push_str(" | masked");
        }
        if msg.is_compressed {
            markers.push_str(" | compressed");
        }
        println!(
            "[{}] {} | {} | {}{} | {} bytes",
            i + 1,
            msg.timestamp,
            msg.endpoints(),
            msg.opcode,
            markers,
            msg.payload.len()
        );

        if let Some((code, reason)) = msg.close_info() {
            if reason.is_empty() {
                println!("    close: code={code}");
            } else {
                println!("    close: code={code} reason={reason}");
            }
        } else if let Some(preview) = msg.text_preview(TEXT_PREVIEW_CHARS) {
            println!("    text: {preview}");
        } else if hex && !msg.payload.is_empty() {
            println!(
                "    hex: {}",
                message::hex_preview(&msg.payload, HEX_PREVIEW_BYTES)
            );
        }
    }
    Ok(())
}

fn run_replay(index: usize, target: &str, port: u16, file: &Path) -> Result<()> {
    anyhow::ensure!(index >= 1, "message numbers start at 1");

    let mut store = MessageStore::new();
    store
        .load(file)
        .with_context(|| format!("cannot load {}", file.display()))?;

    let sent = replay(&store, index - 1, target, port, &ReplayConfig::default())
        .with_context(|| format!("cannot replay message {index}"))?;
    println!("Replayed message {index} to {target}:{port} ({sent} payload bytes)");
    Ok(())
}
