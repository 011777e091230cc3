//!
//! This binary produces Cherenkov and fluorescence photon density histograms
//! from CORSIKA output files.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Parser, Subcommand};

use cerhist_core::BlockKind;
use cerhist_io::{output_filename, DataCard, HistogramWriter, Pointing, RecordReader};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    CerhistIo(#[from] cerhist_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] cerhist_core::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Photon density histograms from CORSIKA Cherenkov output.
#[derive(Parser)]
#[command(name = "cerhist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Histogram a CERnnnnnn output file
    Process {
        /// Input CORSIKA output file (CERnnnnnn)
        input: PathBuf,

        /// Simulation datacard file
        datacard: PathBuf,

        /// Point the telescope along the primary incidence angle
        #[arg(long, conflicts_with = "pointing_angle")]
        on_axis: bool,

        /// Off-axis pointing angle in degrees
        #[arg(long)]
        pointing_angle: Option<f64>,

        /// Directory for the output table
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about a CERnnnnnn output file
    Info {
        /// Input CORSIKA output file (CERnnnnnn)
        input: PathBuf,

        /// Simulation datacard file
        datacard: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            datacard,
            on_axis,
            pointing_angle,
            output_dir,
            verbose,
        } => {
            let card = DataCard::from_path(&datacard)?;
            let (angle, pointing) = resolve_pointing(&card, on_axis, pointing_angle)?;

            if verbose {
                eprintln!("Reading: {}", input.display());
                eprintln!("Pointing: {} deg ({})", angle, pointing.label());
                eprintln!("Bunch threshold: {}", card.bunch_threshold());
            }

            let mut reader = RecordReader::open(&input)?;
            let summary = cerhist_io::run(&mut reader, &card, angle)?;

            if verbose {
                eprintln!("  {} records processed", summary.records);
                eprintln!("  {} bunch rows absorbed", summary.bunch_rows);
                eprintln!(
                    "  {} bins along {}",
                    summary.geometry.num_bins(),
                    summary.geometry.mode().label()
                );
            }

            let filename = output_filename(&card, angle, pointing, summary.geometry.mode());
            let path = output_dir.join(filename);
            let mut writer = HistogramWriter::create(&path)?;
            writer.write_table(&card, angle, &summary)?;

            println!("Histogram stored into: {}", path.display());
        }

        Commands::Info { input, datacard } => {
            let card = DataCard::from_path(&datacard)?;
            let threshold = card.bunch_threshold();

            let file_size = std::fs::metadata(&input)?.len();
            let mut reader = RecordReader::open(&input)?;

            let mut bunch_blocks = 0usize;
            let mut bunch_rows = 0usize;
            let mut run_end_seen = false;
            while let Some(record) = reader.next_record()? {
                for block in record.split()? {
                    match block.classify(threshold) {
                        BlockKind::Bunches => {
                            bunch_blocks += 1;
                            bunch_rows += block.rows().nrows();
                        }
                        BlockKind::RunEnd => run_end_seen = true,
                        BlockKind::Control => {}
                    }
                }
                if run_end_seen {
                    break;
                }
            }

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );
            println!("Records: {}", reader.records_read());
            println!("Bunch sub-blocks: {}", bunch_blocks);
            println!("Bunch rows: {}", bunch_rows);
            println!("Run-end marker: {}", if run_end_seen { "yes" } else { "missing" });
        }
    }

    Ok(())
}

/// Resolves the telescope pointing from flags, or interactively when no flag
/// decides it.
fn resolve_pointing(
    card: &DataCard,
    on_axis: bool,
    pointing_angle: Option<f64>,
) -> Result<(f64, Pointing)> {
    if on_axis {
        return Ok((card.thetap, Pointing::OnAxis));
    }
    if let Some(angle) = pointing_angle {
        return Ok((angle, Pointing::OffAxis));
    }

    let answer = prompt("On-axis pointing (y/n)? ")?;
    if answer.trim().eq_ignore_ascii_case("y") {
        Ok((card.thetap, Pointing::OnAxis))
    } else {
        let raw = prompt("Off-axis angle? ")?;
        let angle: f64 = raw
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidInput(format!("not an angle: {}", raw.trim())))?;
        Ok((angle, Pointing::OffAxis))
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}
