use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use tonegram_core::{decode_wav, encode_to_wav, DecodeOutcome, EncodeRequest, Status};

#[derive(Parser)]
#[command(name = "tonegram")]
#[command(about = "Audio modem for short amateur-radio text transmissions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON-described message into a WAV transmission
    Encode {
        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// JSON encode configuration
        #[arg(value_name = "INPUT.JSON")]
        input: PathBuf,
    },

    /// Decode a WAV capture; result JSON goes to stdout, a summary to stderr
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Channel select; negative resolves automatically from the layout
        #[arg(value_name = "CHANNEL", default_value_t = -1, allow_negative_numbers = true)]
        channel_select: i32,
    },
}

/// Batch encode configuration. Every field is optional in the JSON.
#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EncodeConfig {
    message: String,
    callsign: String,
    carrier_frequency: i32,
    noise_symbols: i32,
    fancy_header: bool,
    sample_rate: u32,
    channel: i32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        EncodeConfig {
            message: String::new(),
            callsign: "N0CALL".to_string(),
            carrier_frequency: 1500,
            noise_symbols: 0,
            fancy_header: false,
            sample_rate: 48000,
            channel: 0,
        }
    }
}

impl From<EncodeConfig> for EncodeRequest {
    fn from(config: EncodeConfig) -> Self {
        EncodeRequest {
            message: config.message,
            callsign: config.callsign,
            carrier_frequency: config.carrier_frequency,
            noise_symbols: config.noise_symbols,
            fancy_header: config.fancy_header,
            sample_rate: config.sample_rate,
            channel: config.channel,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Encode { output, input } => {
            let config: EncodeConfig = serde_json::from_reader(File::open(&input)?)?;
            log::debug!("encode config: {config:?}");
            encode_to_wav(&config.into(), &output)?;
            println!("Wrote {}", output.display());
        }
        Commands::Decode {
            input,
            channel_select,
        } => {
            let outcome = decode_wav(&input, channel_select)?;
            println!("{}", outcome_json(&outcome));
            print_summary(&outcome);
        }
    }
    Ok(())
}

fn outcome_json(outcome: &DecodeOutcome) -> String {
    serde_json::json!({
        "status": outcome.status.label(),
        "message": outcome.message,
        "bitFlips": outcome.bit_flips,
        "callsign": outcome.callsign,
        "mode": outcome.mode,
        "cfo": outcome.carrier_offset,
        "sampleRate": outcome.sample_rate,
        "channels": outcome.channels,
        "channelSelect": outcome.channel_select,
    })
    .to_string()
}

fn print_summary(outcome: &DecodeOutcome) {
    if !outcome.callsign.is_empty() {
        eprintln!(
            "from {}, mode {}, cfo {}",
            outcome.callsign, outcome.mode, outcome.carrier_offset
        );
    }
    match outcome.status {
        Status::Done => eprintln!("{}", flips_phrase(outcome.bit_flips)),
        Status::Ping => eprintln!("preamble ping"),
        Status::Nope => eprintln!("preamble nope"),
        _ => {}
    }
}

fn flips_phrase(flips: i32) -> String {
    format!(
        "{} bit {} corrected",
        flips,
        if flips == 1 { "flip" } else { "flips" }
    )
}
