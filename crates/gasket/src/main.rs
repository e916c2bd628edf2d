use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gasket::passes::DEFAULT_MAX_MEMORY_PAGES;
use gasket::{gas, instrument, InstrumentOptions, Name, Sandbox};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// gasket: gas metering and sandboxing for WebAssembly contracts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inject gas metering and software floats into a module
    Instrument {
        /// Input WebAssembly binary (.wasm)
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Ceiling for the declared memory maximum, in 64 KiB pages
        #[arg(long, default_value_t = DEFAULT_MAX_MEMORY_PAGES)]
        max_memory_pages: u32,
    },

    /// Check that a module decodes and imports only contract intrinsics
    Validate {
        /// Input WebAssembly binary (.wasm)
        input: PathBuf,
    },

    /// Print the per-opcode gas costs
    GasTable,

    /// Convert between a name and its 64-bit value
    Name {
        /// A name such as `transfer`, or a decimal u64
        value: String,
    },
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Instrument {
            input,
            output,
            max_memory_pages,
        } => {
            let wasm = read(&input)?;
            let options = InstrumentOptions { max_memory_pages };
            let out = instrument(&wasm, &options).context("instrumentation failed")?;
            info!(
                input = %input.display(),
                injected = out.injected,
                size = out.wasm.len(),
                "instrumented"
            );
            match output {
                Some(path) => fs::write(&path, &out.wasm)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => {
                    use std::io::Write;
                    std::io::stdout()
                        .write_all(&out.wasm)
                        .context("failed to write to stdout")?;
                }
            }
        }
        Command::Validate { input } => {
            let wasm = read(&input)?;
            Sandbox::validate(&wasm)
                .with_context(|| format!("{} is not a valid contract", input.display()))?;
            println!("{}: ok", input.display());
        }
        Command::GasTable => {
            for (opcode, &cost) in gas::GAS_TABLE.iter().enumerate() {
                if cost > 0 {
                    println!("0x{opcode:02X}\t{cost}");
                }
            }
        }
        Command::Name { value } => match value.parse::<u64>() {
            Ok(raw) => println!("{}", Name(raw)),
            Err(_) => {
                let name: Name = value.parse().context("invalid name")?;
                println!("{}", name.0);
            }
        },
    }
    Ok(())
}
