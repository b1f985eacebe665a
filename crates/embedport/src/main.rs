mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use embedport_artifact::DEFAULT_ARTIFACT_DIR;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "embedport")]
#[command(author, version, about = "Export sentence-embedding models to ONNX and verify the export")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the model into a portable ONNX artifact
    Export {
        /// Directory to write the artifact into
        #[arg(default_value = DEFAULT_ARTIFACT_DIR)]
        output_dir: PathBuf,
    },

    /// Compare artifact embeddings with the original model (exit 1 on mismatch)
    Verify {
        /// Directory of a previously exported artifact
        #[arg(default_value = DEFAULT_ARTIFACT_DIR)]
        artifact_dir: PathBuf,
    },

    /// Show metadata and files of an artifact
    Inspect {
        /// Directory of a previously exported artifact
        #[arg(default_value = DEFAULT_ARTIFACT_DIR)]
        artifact_dir: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Export { output_dir } => {
            commands::export(&output_dir)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { artifact_dir } => commands::verify(&artifact_dir),
        Commands::Inspect { artifact_dir } => {
            commands::inspect(&artifact_dir)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_default() {
        let cli = Cli::try_parse_from(["embedport", "verify"]).unwrap();
        match cli.command {
            Commands::Verify { artifact_dir } => {
                assert_eq!(artifact_dir, PathBuf::from("./gtr-t5-base-onnx"))
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn test_positional_directory() {
        let cli = Cli::try_parse_from(["embedport", "-v", "export", "/tmp/out"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Export { output_dir } => assert_eq!(output_dir, PathBuf::from("/tmp/out")),
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_rejects_extra_flags() {
        assert!(Cli::try_parse_from(["embedport", "verify", "--threshold", "0.5"]).is_err());
    }
}
