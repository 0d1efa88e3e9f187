//! simple-dbus CLI - encode D-Bus arguments and inspect introspection data

mod convert;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use simple_dbus::{decode_all, encode, parse_introspection, Introspection};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "simple-dbus")]
#[command(
    author,
    version,
    about = "Encode D-Bus message arguments and inspect introspection data"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON array of arguments against a signature
    Encode {
        /// Type signature, e.g. "sa{sv}"
        signature: String,

        /// Arguments as a JSON array (default: empty)
        #[arg(default_value = "[]")]
        arguments: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = EncodeFormat::Hex)]
        format: EncodeFormat,
    },

    /// Parse an introspection XML document and list what it declares
    Introspect {
        /// Introspection XML file
        input: PathBuf,

        /// Path of the introspected object (reported for signals)
        #[arg(short = 'p', long, default_value = "/")]
        object_path: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = IntrospectFormat::Text)]
        format: IntrospectFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodeFormat {
    /// Little-endian message body as hex
    Hex,
    /// Typed wire values
    Values,
    /// Wire values converted back to host values
    Decoded,
}

#[derive(Clone, Copy, ValueEnum)]
enum IntrospectFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Encode {
            signature,
            arguments,
            format,
        } => encode_arguments(&signature, &arguments, format),
        Commands::Introspect {
            input,
            object_path,
            format,
        } => introspect(&input, &object_path, format),
    }
}

fn encode_arguments(signature: &str, arguments: &str, format: EncodeFormat) -> Result<()> {
    let values = convert::arguments(arguments).context("Failed to parse arguments")?;
    let message = encode(signature, &values)?;

    match format {
        EncodeFormat::Hex => {
            let body = message.to_body();
            eprintln!(
                "Encoded {} argument(s), {} bytes",
                message.values().len(),
                body.len()
            );
            println!("{}", convert::hex_dump(&body));
        }
        EncodeFormat::Values => {
            for value in message.values() {
                println!("{}\t{:?}", value.signature(), value);
            }
        }
        EncodeFormat::Decoded => {
            for value in decode_all(message.values()) {
                println!("{value}");
            }
        }
    }
    Ok(())
}

fn introspect(input: &Path, object_path: &str, format: IntrospectFormat) -> Result<()> {
    let xml = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let description = parse_introspection(&xml, object_path)
        .with_context(|| format!("Failed to parse '{}'", input.display()))?;

    match format {
        IntrospectFormat::Text => print!("{}", describe(&description)),
        IntrospectFormat::Json => {
            let json = serde_json::to_string_pretty(&description)
                .context("Failed to serialize introspection data")?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Human readable listing, one interface block at a time.
fn describe(description: &Introspection) -> String {
    let mut out = String::new();
    for interface in description.iter() {
        out.push_str(&format!("interface {}\n", interface.name));
        for method in interface.methods() {
            out.push_str(&format!(
                "  method {}({}) -> ({})\n",
                method.name,
                method.signature,
                method.result().unwrap_or_default()
            ));
        }
        for signal in interface.signals() {
            out.push_str(&format!("  signal {}({})\n", signal.name, signal.signature));
        }
        for property in interface.properties.values() {
            out.push_str(&format!(
                "  property {}: {} [{}]\n",
                property.name, property.type_signature, property.access
            ));
        }
    }
    out
}
