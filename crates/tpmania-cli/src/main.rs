//! `tpmania` command-line host.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tpmania_cli::commands::{self, UploadOptions};
use tpmania_cli::logging::init_logging;
use tpmania_cli::report::{describe, exit_code};
use tpmania_cli::{AppConfig, CliResult};
use tpmania_serial_protocol::{list_ports, MemoryLocation, SaveTarget, TransferStatus};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "tpmania", version, about = "Transfer sequences and timing windows to a TPMania controller")]
struct Cli {
    /// Config file (default: tpmania.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial port, overriding the config file.
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate, overriding the config file.
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports.
    Ports,

    /// Show the metadata and beat count of a sequence file.
    Inspect {
        file: PathBuf,
        /// Print JSON.
        #[arg(long)]
        json: bool,
    },

    /// Save a sequence to the device.
    Upload(UploadArgs),

    /// Fetch the sequence stored on the device.
    Download {
        #[arg(value_enum)]
        location: Location,
        /// Output .tsq file.
        output: PathBuf,
    },

    /// Read or change the timing windows.
    Windows {
        #[command(subcommand)]
        action: WindowsAction,
    },

    /// Rewrite a sequence file with 4-beat bars.
    Regroup { input: PathBuf, output: PathBuf },
}

#[derive(Args, Debug)]
struct UploadArgs {
    file: PathBuf,
    /// Save to RAM.
    #[arg(long)]
    ram: bool,
    /// Save to EEPROM.
    #[arg(long)]
    eeprom: bool,
    /// WAV file with the same name as the sequence.
    #[arg(long, conflicts_with = "length")]
    audio: Option<PathBuf>,
    /// Track length as MM:SS.
    #[arg(long)]
    length: Option<String>,
}

#[derive(Subcommand, Debug)]
enum WindowsAction {
    /// Show the windows stored on the device.
    Get,
    /// Save new windows (milliseconds, strictly increasing).
    Set {
        perfect: u32,
        good: u32,
        ok: u32,
        poor: u32,
    },
    /// Save the default windows.
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Location {
    Ram,
    Eeprom,
}

impl From<Location> for MemoryLocation {
    fn from(location: Location) -> Self {
        match location {
            Location::Ram => MemoryLocation::Ram,
            Location::Eeprom => MemoryLocation::Eeprom,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> CliResult<u8> {
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.port, cli.baud);

    match cli.command {
        Command::Ports => {
            for port in list_ports()? {
                println!("{}", port);
            }
            Ok(0)
        }
        Command::Inspect { file, json } => {
            println!("{}", commands::inspect(&file, json)?);
            Ok(0)
        }
        Command::Regroup { input, output } => {
            commands::regroup_file(&input, &output)?;
            Ok(0)
        }
        Command::Upload(args) => {
            let options = UploadOptions {
                file: args.file,
                target: SaveTarget {
                    ram: args.ram,
                    eeprom: args.eeprom,
                },
                audio: args.audio,
                length: args.length,
            };
            let (doc, length) = commands::prepare_upload(&options)?;
            info!(name = %doc.name, beats = doc.beat_count, length = %length, "Uploading");
            let mut tasks = commands::connect(&config);
            finish(commands::upload(&mut tasks, doc, options.target, length)?)
        }
        Command::Download { location, output } => {
            let mut tasks = commands::connect(&config);
            let status = commands::download(&mut tasks, location.into(), output.clone())?;
            if status.is_success() {
                println!("Saved to {}", output.display());
            }
            finish(status)
        }
        Command::Windows { action } => {
            let mut tasks = commands::connect(&config);
            match action {
                WindowsAction::Get => {
                    let (status, windows) = commands::windows_get(&mut tasks)?;
                    if status.is_success() {
                        println!("{}", commands::format_windows(&windows));
                    }
                    finish(status)
                }
                WindowsAction::Set {
                    perfect,
                    good,
                    ok,
                    poor,
                } => finish(commands::windows_set(&mut tasks, [perfect, good, ok, poor])?),
                WindowsAction::Reset => finish(commands::windows_reset(&mut tasks)?),
            }
        }
    }
}

/// Print the outcome and pick the exit code.
fn finish(status: TransferStatus) -> CliResult<u8> {
    println!("{}", describe(status));
    Ok(exit_code(status) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let cli = Cli::parse_from(["tpmania", "upload", "song.tsq", "--eeprom", "--length", "03:25"]);
        match cli.command {
            Command::Upload(args) => {
                assert!(args.eeprom);
                assert!(!args.ram);
                assert_eq!(args.length.as_deref(), Some("03:25"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_audio_and_length_conflict() {
        let result = Cli::try_parse_from([
            "tpmania", "upload", "song.tsq", "--ram", "--audio", "song.wav", "--length", "01:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_windows_set() {
        let cli = Cli::parse_from(["tpmania", "--port", "COM3", "windows", "set", "150", "250", "350", "450"]);
        assert_eq!(cli.port.as_deref(), Some("COM3"));
        assert!(matches!(
            cli.command,
            Command::Windows {
                action: WindowsAction::Set { perfect: 150, poor: 450, .. }
            }
        ));
    }
}
