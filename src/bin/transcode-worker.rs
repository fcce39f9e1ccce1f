//! Transcode a single video, correcting for its recorded rotation.
//!
//! Invoked by the dispatcher as `transcode-worker <in_file> <out_file>`. Only
//! the exit status matters to the caller.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use transcode_watch::config;
use transcode_watch_av::{check_tools, probe_rotation, require_tool, EncodeCommand};

#[derive(Parser)]
#[command(name = "transcode-worker")]
#[command(author, version, about = "Transcode a video")]
struct Args {
    /// Input file
    #[arg(required_unless_present = "check_tools")]
    in_file: Option<PathBuf>,

    /// Output file
    #[arg(required_unless_present = "check_tools")]
    out_file: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Check that the encoder and exiftool are available, then exit
    #[arg(long)]
    check_tools: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "transcode_watch=info,transcode_watch_av=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(args.config.as_deref())?;
    let encoder = &config.encoder;

    if args.check_tools {
        return report_tools(
            &encoder.program.to_string_lossy(),
            &encoder.exiftool.to_string_lossy(),
        );
    }

    let (Some(in_file), Some(out_file)) = (args.in_file, args.out_file) else {
        anyhow::bail!("Input and output files are required");
    };

    if !in_file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", in_file);
    }

    let exiftool = require_tool(&encoder.exiftool.to_string_lossy())?;
    let encoder_path = require_tool(&encoder.program.to_string_lossy())?;

    let rotation = probe_rotation(&exiftool, &in_file)
        .with_context(|| format!("Failed to read rotation of {:?}", in_file))?;

    println!("Found rotation: {}", rotation);

    let command = EncodeCommand::new(encoder_path, &in_file, &out_file, rotation);

    println!("> {}", command.command_line());

    command
        .run()
        .with_context(|| format!("Failed to transcode {:?}", in_file))?;

    Ok(())
}

fn report_tools(encoder: &str, exiftool: &str) -> Result<()> {
    let tools = check_tools(encoder, exiftool);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    if !all_ok {
        anyhow::bail!("Some tools are missing");
    }

    Ok(())
}
