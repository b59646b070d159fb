use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use http_encoding::config::{load_config, EncodingConfig};
use http_encoding::observability::init_logging;
use http_encoding::registry::mime::{MIME_QUERY, MIME_URI, MIME_WILDCARD};
use http_encoding::{Encoding, Slot};

#[derive(Parser)]
#[command(name = "encoding-cli")]
#[command(about = "Transcode payloads and inspect MIME negotiation", long_about = None)]
struct Cli {
    /// Registry configuration (TOML). Defaults to every built-in format.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a payload with one codec and re-encode it with another
    Convert {
        /// Content-Type of the input
        #[arg(long)]
        from: String,
        /// Accept value selecting the output codec
        #[arg(long)]
        to: String,
        /// Input file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Show which codecs the given headers resolve to
    Negotiate {
        #[arg(long = "content-type")]
        content_type: Vec<String>,
        #[arg(long)]
        accept: Vec<String>,
    },
    /// List registered MIME types
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EncodingConfig {
            register_all_formats: true,
            ..EncodingConfig::default()
        },
    };
    init_logging(&config.logging)?;
    let encoding = Encoding::from_config(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Convert { from, to, input } => {
            let mut data = Vec::new();
            match input {
                Some(path) => File::open(path)?.read_to_end(&mut data)?,
                None => io::stdin().lock().read_to_end(&mut data)?,
            };

            let (_, decoder) = encoding.marshaler_from_content_type([from.as_str()]);
            let mut slot = Slot::<Value>::new();
            decoder.unmarshal(&data, &mut slot)?;
            let value = slot.take("convert")?;

            let encoder = encoding.marshaler_from_accept([to.as_str()]);
            out.write_all(&encoder.marshal(&value)?)?;
        }
        Commands::Negotiate {
            content_type,
            accept,
        } => {
            let (mime, inbound) =
                encoding.marshaler_from_content_type(content_type.iter().map(String::as_str));
            let outbound = encoding.marshaler_from_accept(accept.iter().map(String::as_str));
            writeln!(out, "inbound:  {} ({})", mime, inbound.content_type(&Value::Null))?;
            writeln!(out, "outbound: {}", outbound.content_type(&Value::Null))?;
        }
        Commands::List => {
            for mime in encoding.mimes() {
                writeln!(out, "{:<36} {}", mime, encoding.get(mime).content_type(&Value::Null))?;
            }
            for mime in [MIME_WILDCARD, MIME_QUERY, MIME_URI] {
                writeln!(
                    out,
                    "{:<36} {} (reserved)",
                    mime,
                    encoding.get(mime).content_type(&Value::Null)
                )?;
            }
        }
    }

    Ok(())
}
