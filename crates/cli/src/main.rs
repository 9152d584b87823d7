use anyhow::Result;
use clap::{Parser, Subcommand};

use ddfacts::commands::{
    extract_command, header_command, reconcile_command, show_config_command, ExtractOverrides,
};

/// Reconcile ddisasm fact tables into an instruction/block model.
///
/// This CLI is a thin wrapper around `ddfacts-core` (exposed in code as
/// `ddfacts_core`). All substantive logic lives in the library.
#[derive(Parser, Debug)]
#[command(
    name = "ddfacts",
    version,
    about = "Reconcile ddisasm fact tables into an instruction/block model",
    long_about = None
)]
struct Cli {
    /// Emit logs as JSON (logs always go to stderr).
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run ddisasm against a binary and print the reconciled model as JSON.
    ///
    /// Exits non-zero, printing nothing on stdout, if any stage fails.
    Extract {
        /// Path to the binary to analyze.
        #[arg(long)]
        binary: String,

        /// Extractor config file (JSON, or YAML with a .yaml/.yml extension).
        #[arg(long)]
        config: Option<String>,

        /// Scratch root directory; overrides the config.
        #[arg(long)]
        scratch: Option<String>,

        /// Kill ddisasm after this many seconds; overrides the config.
        #[arg(long)]
        timeout: Option<u64>,

        /// List every decoded instruction, not only those inside blocks.
        #[arg(long, default_value_t = false)]
        exhaustive: bool,

        /// Write the JSON report here instead of stdout.
        #[arg(long)]
        out: Option<String>,
    },

    /// Reconcile existing `instruction.facts` / `block_information.csv` files.
    Reconcile {
        /// Exhaustive instruction table.
        #[arg(long)]
        instructions: String,

        /// Block boundary table.
        #[arg(long)]
        blocks: String,

        /// Binary the facts describe; selects the address translation.
        #[arg(long)]
        binary: Option<String>,

        /// List every decoded instruction, not only those inside blocks.
        #[arg(long, default_value_t = false)]
        exhaustive: bool,

        /// Write the JSON result here instead of stdout.
        #[arg(long)]
        out: Option<String>,
    },

    /// Show header classification and section mapping for a binary.
    Header {
        #[arg(long)]
        binary: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the effective extractor configuration.
    ShowConfig {
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        ddfacts_core::logging::init_tracing_json();
    } else {
        ddfacts_core::logging::init_tracing();
    }
    tracing::debug!(version = ddfacts_core::version(), "ddfacts starting");

    match cli.command {
        Command::Extract { binary, config, scratch, timeout, exhaustive, out } => {
            let overrides = ExtractOverrides { scratch, timeout_secs: timeout, exhaustive };
            extract_command(&binary, config.as_deref(), overrides, out.as_deref())?
        }
        Command::Reconcile { instructions, blocks, binary, exhaustive, out } => {
            reconcile_command(&instructions, &blocks, binary.as_deref(), exhaustive, out.as_deref())?
        }
        Command::Header { binary, json } => header_command(&binary, json)?,
        Command::ShowConfig { config } => show_config_command(config.as_deref())?,
    }

    Ok(())
}
