//! otjson CLI - offline access to the OT-JSON integrity engine
//!
//! Reads documents, private objects and commitments from JSON files and
//! prints JSON results. Nothing is sent over the network or persisted.

use anyhow::Context;
use clap::{Parser, Subcommand};
use otjson::canonical::canonicalize;
use otjson::dataset::signing::parse_signing_key;
use otjson::{
    Address, Assembler, CommitmentOffer, Document, EngineConfig, ExchangeCodec, ExchangeKey,
    PrivateDataObject,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "otjson")]
#[command(about = "Canonical hashing, signing and private-data fair exchange for OT-JSON datasets")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Engine config file (defaults to <config dir>/otjson/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    // === Document Commands ===
    /// Normalize empty fields of otObject graph objects
    Format {
        /// Document file
        input: PathBuf,
    },

    /// Print the canonical form of a document
    Canonicalize {
        /// Document file
        input: PathBuf,
    },

    /// Attach private_data_hash to every private-data object
    Commit {
        /// Document file
        input: PathBuf,
    },

    /// Remove private payloads, keeping their hashes
    Strip {
        /// Document file
        input: PathBuf,
        /// Keep isPrivate flags (holder form)
        #[arg(long)]
        keep_flags: bool,
    },

    /// Compute the distribution root hash of a dataset
    RootHash {
        /// Dataset file (needs @id and datasetHeader)
        input: PathBuf,
        /// Compare against the header's proof value instead of printing
        #[arg(long)]
        verify: bool,
    },

    // === Signing Commands ===
    /// Commit, hash, build a header and sign a raw document
    Prepare {
        /// Document file
        input: PathBuf,
        /// Signing key as hex
        #[arg(long, env = "OTJSON_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Sign a dataset
    Sign {
        /// Dataset file
        input: PathBuf,
        /// Signing key as hex
        #[arg(long, env = "OTJSON_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Recover the address that signed a dataset
    Recover {
        /// Dataset file
        input: PathBuf,
        /// Fail unless the signer is this address
        #[arg(short, long)]
        expected: Option<String>,
    },

    // === Exchange Commands ===
    /// Encode a private-data object for sale
    Encode {
        /// Private-data object file ({"isPrivate": true, "data": ...})
        input: PathBuf,
        /// Exchange key as hex (random when omitted)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Decode a commitment once the key is known
    Decode {
        /// Commitment or offer file
        input: PathBuf,
        /// Exchange key as hex (read from the file when omitted)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Check an offer's encoded root and size before paying
    VerifyOffer {
        /// Offer file
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Format { input } => {
            let assembler = Assembler::new(config)?;
            let document = read_document(&input)?;
            output(&cli.format, &serde_json::to_value(assembler.format(&document))?)?;
        }

        Commands::Canonicalize { input } => {
            let document = read_document(&input)?;
            let bytes = canonicalize(&document)?;
            let sha3 = otjson::Hash::sha3(&bytes);
            output(
                &cli.format,
                &serde_json::json!({
                    "canonical": String::from_utf8(bytes)?,
                    "sha3": sha3.to_prefixed_hex()
                }),
            )?;
        }

        Commands::Commit { input } => {
            let assembler = Assembler::new(config)?;
            let document = read_document(&input)?;
            let committed = assembler.commit_private(&document)?;
            output(&cli.format, &serde_json::to_value(committed)?)?;
        }

        Commands::Strip { input, keep_flags } => {
            let assembler = Assembler::new(config)?;
            let document = read_document(&input)?;
            let stripped = if keep_flags {
                assembler.hide_private(&document)?
            } else {
                assembler.strip_private(&document)?
            };
            output(&cli.format, &serde_json::to_value(stripped)?)?;
        }

        Commands::RootHash { input, verify } => {
            let assembler = Assembler::new(config)?;
            let document = read_document(&input)?;
            let root = if verify {
                assembler.verify_root_hash(&document)?
            } else {
                assembler.root_hash(&document)?
            };
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "root_hash": root.to_prefixed_hex(),
                    "verified": verify
                }),
            )?;
        }

        Commands::Prepare { input, private_key } => {
            let assembler = Assembler::new(config)?;
            let key = parse_signing_key(&private_key)?;
            let document = read_document(&input)?;
            let prepared = assembler.prepare(&document, &key)?;
            output(&cli.format, &serde_json::to_value(prepared)?)?;
        }

        Commands::Sign { input, private_key } => {
            let assembler = Assembler::new(config)?;
            let key = parse_signing_key(&private_key)?;
            let document = read_document(&input)?;
            let signed = assembler.sign(&document, &key)?;
            output(&cli.format, &serde_json::to_value(signed)?)?;
        }

        Commands::Recover { input, expected } => {
            let assembler = Assembler::new(config)?;
            let document = read_document(&input)?;
            let signer = match expected {
                Some(expected) => {
                    let expected: Address = expected.parse()?;
                    assembler.verify_signer(&document, &expected)?;
                    expected
                }
                None => assembler.recover_signer(&document)?,
            };
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "signer": signer.to_checksum()
                }),
            )?;
        }

        Commands::Encode { input, key } => {
            let codec = ExchangeCodec::new(config.private_data)?;
            let object: PrivateDataObject = read_json(&input)?;
            let commitment = match key {
                Some(key) => codec.encode_with_key(&object, key.parse()?)?,
                None => codec.encode(&object)?,
            };
            output(&cli.format, &serde_json::to_value(commitment)?)?;
        }

        Commands::Decode { input, key } => {
            let codec = ExchangeCodec::new(config.private_data)?;
            let value: serde_json::Value = read_json(&input)?;
            let key: ExchangeKey = match key {
                Some(key) => key.parse()?,
                None => value
                    .get("key")
                    .and_then(|k| k.as_str())
                    .ok_or_else(|| anyhow::anyhow!("No key given and none in {}", input.display()))?
                    .parse()?,
            };
            let offer: CommitmentOffer = serde_json::from_value(value)?;
            let data = codec.decode_offer(&offer, &key)?;
            output(&cli.format, &serde_json::json!({ "data": data }))?;
        }

        Commands::VerifyOffer { input } => {
            let codec = ExchangeCodec::new(config.private_data)?;
            let offer: CommitmentOffer = read_json(&input)?;
            codec.verify_offer(&offer)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "encoded_data_root_hash": offer.encoded_data_root_hash,
                    "private_data_root_hash": offer.private_data_root_hash
                }),
            )?;
        }
    }

    Ok(())
}

/// OTJSON_LOG sets the filter, OTJSON_LOG_FORMAT=json switches to JSON lines
fn init_tracing() {
    let log_format = std::env::var("OTJSON_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_env("OTJSON_LOG")
        .unwrap_or_else(|_| "otjson=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::load_or_default()?,
    };
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Document::from_json(&content)?)
}

fn output(format: &OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(value)?);
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
