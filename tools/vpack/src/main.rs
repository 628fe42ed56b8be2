//! vpack - Pack and unpack binary data with voltage-pack directive strings
//!
//! ```text
//! vpack pack "Nc a6" 1 -100 abcdef        # 000000019c616263646566
//! vpack unpack "Nc a6" --hex 000000019c616263646566
//! vpack directives
//! ```

mod config;
mod error;
mod logging;
mod values;

use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{debug, info};
use voltage_pack::directive;

use crate::config::{OutputFormat, VpackConfig};
use crate::error::VpackError;

#[derive(Parser)]
#[command(name = "vpack")]
#[command(about = "Pack and unpack binary data with directive strings")]
#[command(long_about = "Pack and unpack binary data with directive strings

Commands:
  pack        Pack values into bytes
  unpack      Unpack bytes into a JSON array of values
  directives  List supported directives

Examples:
  vpack pack N 4294967295                    # ffffffff
  vpack pack 'n v a6' 1 1 str:abc            # 00010100616263000000
  vpack --output raw pack 'N*' 1 2 3 > out.bin
  vpack unpack 'N*' --file out.bin           # [1,2,3]
  vpack unpack 'q>' --hex ffffffffbfffffff   # [-1073741825]

Values are integers (42, -7, 0x1F), floats (3.5) or text.
Prefix 'str:' to force text and 'hex:' to pass raw bytes.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack values into bytes
    Pack {
        /// Directive string, e.g. "c2x5CCxsdils_l_a6"
        format: String,

        /// Values consumed left to right by the directives
        #[arg(allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Unpack bytes into a JSON array of values (reads stdin by default)
    Unpack {
        /// Directive string
        format: String,

        /// Input bytes as hex digits
        #[arg(long, conflicts_with = "file")]
        hex: Option<String>,

        /// Input file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List supported directives
    Directives,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config =
        VpackConfig::load(cli.config.as_deref())?.with_overrides(cli.log_level, cli.output);
    logging::init(&config.log_level, !cli.no_color && std::io::stderr().is_terminal())?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Pack { format, values } => handle_pack(&format, &values, &config),
        Commands::Unpack { format, hex, file } => {
            let data = read_input(hex.as_deref(), file.as_deref(), config.max_input_bytes)?;
            handle_unpack(&format, &data, &config)
        },
        Commands::Directives => handle_directives(config.output),
    }
}

fn handle_pack(format: &str, raw_values: &[String], config: &VpackConfig) -> Result<()> {
    let parsed = raw_values
        .iter()
        .map(|raw| values::parse_value(raw))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let packed = voltage_pack::pack(&parsed, format)
        .with_context(|| format!("Failed to pack values with '{}'", format))?;
    info!("Packed {} values into {} bytes", parsed.len(), packed.len());

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&values::render_packed(&packed, config.output))?;
    stdout.flush()?;
    Ok(())
}

fn handle_unpack(format: &str, data: &[u8], config: &VpackConfig) -> Result<()> {
    let unpacked = voltage_pack::unpack(data, format)
        .with_context(|| format!("Failed to unpack {} bytes with '{}'", data.len(), format))?;
    info!("Unpacked {} values from {} bytes", unpacked.len(), data.len());

    let json = serde_json::Value::Array(unpacked.iter().map(values::to_json).collect());
    let text = match config.output {
        OutputFormat::Json => serde_json::to_string_pretty(&json)?,
        OutputFormat::Hex | OutputFormat::Raw => json.to_string(),
    };
    println!("{}", text);
    Ok(())
}

fn handle_directives(output: OutputFormat) -> Result<()> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(directive::all())?);
        return Ok(());
    }

    println!("{}", "=== Supported Directives ===".bold());
    println!();
    println!("  {:<4}{:<8}{:<12}{:<10}Description", "", "Width", "Order", "Modifiers");
    for descriptor in directive::all() {
        let width = if descriptor.width == 0 {
            "count".to_string()
        } else {
            descriptor.width.to_string()
        };
        let order = if descriptor.kind.is_fixed_width_numeric() && descriptor.width > 1 {
            descriptor.order.to_string()
        } else {
            "-".to_string()
        };
        let modifiers = if descriptor.accepts_native_width() {
            "_ ! < >"
        } else {
            "-"
        };
        println!(
            "  {}   {:<8}{:<12}{:<10}{}",
            descriptor.directive.to_string().bright_cyan().bold(),
            width,
            order,
            modifiers,
            descriptor.summary
        );
    }

    println!();
    println!("Counts: none = 1, digits = n, '*' = all remaining");
    println!("For a/A/Z the count is a byte width, for H/h nibbles, for B/b bits");
    Ok(())
}

/// Read unpack input from `--hex`, `--file` or stdin, bounded by `limit` bytes
fn read_input(hex: Option<&str>, file: Option<&Path>, limit: u64) -> Result<Vec<u8>> {
    let data = match (hex, file) {
        (Some(digits), _) => values::decode_hex_input(digits)?,
        (None, Some(path)) => {
            let size = std::fs::metadata(path)
                .with_context(|| format!("Failed to read {}", path.display()))?
                .len();
            check_limit(size, limit)?;
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        },
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .take(limit.saturating_add(1))
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            buf
        },
    };

    check_limit(data.len() as u64, limit)?;
    debug!("Read {} input bytes", data.len());
    Ok(data)
}

fn check_limit(size: u64, limit: u64) -> std::result::Result<(), VpackError> {
    if size > limit {
        return Err(VpackError::InputTooLarge { size, limit });
    }
    Ok(())
}
