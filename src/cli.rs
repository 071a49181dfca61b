//! CLI: JSON document → (protobuf bytes | inferred schema)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use json_to_proto::{driver, proto_text, ConversionOptions, EmptyArrayPolicy, ScalarArrayPolicy};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer a protobuf schema from a JSON document and encode the document with it
#[derive(Parser, Debug)]
#[command(name = "json-to-proto", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert a JSON document to a binary protobuf message
    Convert(ConvertOut),
    /// infer and print the schema only
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// input JSON document
    #[arg(long, short)]
    input: PathBuf,

    /// JSON Pointer selecting the sub-document to convert (e.g. /data/items/0)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JSON file with conversion options; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// protobuf package for the generated types
    #[arg(long)]
    package: Option<String>,

    /// what to do with empty arrays
    #[arg(long, value_enum)]
    empty_arrays: Option<EmptyArrayPolicy>,

    /// how to treat scalar arrays with mixed element kinds
    #[arg(long, value_enum)]
    scalar_arrays: Option<ScalarArrayPolicy>,
}

#[derive(clap::Parser, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output file for the binary message
    #[arg(short, long)]
    out: PathBuf,

    /// also write the inferred schema as .proto source
    #[arg(long)]
    proto_out: Option<PathBuf>,

    /// also write a serialized FileDescriptorSet
    #[arg(long)]
    descriptor_out: Option<PathBuf>,

    /// also write the populated message tree as JSON, for inspection
    #[arg(long)]
    message_json_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaFormat {
    Proto,
    Json,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, value_enum, default_value = "proto")]
    format: SchemaFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn options(&self) -> Result<ConversionOptions> {
        let mut options = match self.config.as_ref() {
            Some(path) => ConversionOptions::load(path)?,
            None => ConversionOptions::default(),
        };
        if let Some(package) = self.package.as_ref() {
            options.package = package.clone();
        }
        if let Some(policy) = self.empty_arrays {
            options.empty_arrays = policy;
        }
        if let Some(policy) = self.scalar_arrays {
            options.scalar_arrays = policy;
        }
        options.validate()?;
        Ok(options)
    }

    fn load_document(&self) -> Result<serde_json::Value> {
        let document = driver::read_document(&self.input)
            .with_context(|| format!("failed to load {}", self.input.display()))?;
        Ok(driver::select_root(document, self.json_pointer.as_deref())?)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let default_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Convert(target) => {
                let options = target.input_settings.options()?;
                let document = target.input_settings.load_document()?;
                let conversion = driver::convert(&document, &options)
                    .with_context(|| format!("failed to convert {}", target.input_settings.input.display()))?;

                let mut extra: Vec<(&Path, Vec<u8>)> = Vec::new();
                if let Some(path) = target.proto_out.as_deref() {
                    extra.push((path, proto_text::render(&conversion.schema, &options).into_bytes()));
                }
                if let Some(path) = target.descriptor_out.as_deref() {
                    extra.push((path, conversion.wire.descriptor_set_bytes()));
                }
                if let Some(path) = target.message_json_out.as_deref() {
                    let mut src = serde_json::to_vec_pretty(&conversion.message)?;
                    src.push(b'\n');
                    extra.push((path, src));
                }
                // Binary message last: it only appears once everything else is in place.
                let mut outputs: Vec<(&Path, &[u8])> = extra.iter().map(|(p, b)| (*p, b.as_slice())).collect();
                outputs.push((target.out.as_path(), conversion.bytes.as_slice()));
                driver::write_outputs(&outputs)?;
                tracing::info!(
                    types = conversion.schema.type_count(),
                    bytes = conversion.bytes.len(),
                    "wrote {}",
                    target.out.display()
                );
                Ok(())
            }
            Command::Schema(target) => {
                let options = target.input_settings.options()?;
                let document = target.input_settings.load_document()?;
                let schema = driver::infer_schema(&document, &options)
                    .with_context(|| format!("failed to infer schema for {}", target.input_settings.input.display()))?;
                let src = match target.format {
                    SchemaFormat::Proto => proto_text::render(&schema, &options),
                    SchemaFormat::Json => serde_json::to_string_pretty(&schema.to_schema())? + "\n",
                };
                emit(target.out.as_deref(), &src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn emit(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(path) => Ok(driver::write_output(path, src.as_bytes())?),
        None => {
            print!("{src}");
            Ok(())
        }
    }
}
