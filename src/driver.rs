//! parse → synthesize → compile → populate → encode → write.
//!
//! Each stage either succeeds completely or aborts the run; output files are
//! only touched once the bytes exist.
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::ConversionOptions;
use crate::error::{ConvertError, Result};
use crate::message::MessageInstance;
use crate::naming::NameGenerator;
use crate::registry::{self, CompiledSchema};
use crate::wire::WireSchema;

/// Everything one conversion produced.
pub struct Conversion {
    pub schema: CompiledSchema,
    pub message: MessageInstance,
    pub wire: WireSchema,
    pub bytes: Vec<u8>,
}

pub fn parse_document(src: &str) -> Result<Value> {
    Ok(serde_json::from_str(src)?)
}

pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(ConvertError::InputNotFound(path.to_path_buf()));
    }
    let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "input read");
    parse_document(&source)
}

/// Narrow the document to the sub-value at a JSON pointer.
pub fn select_root(document: Value, pointer: Option<&str>) -> Result<Value> {
    let Some(pointer) = pointer else {
        return Ok(document);
    };
    let mut document = document;
    document
        .pointer_mut(pointer)
        .map(Value::take)
        .ok_or_else(|| ConvertError::Config(format!("JSON pointer `{pointer}` selects nothing")))
}

/// Synthesize and compile, with a generator used for nothing else.
pub fn infer_schema(document: &Value, options: &ConversionOptions) -> Result<CompiledSchema> {
    let schema = crate::synth::synthesize(document, &mut NameGenerator::new(), options)?;
    registry::compile(schema)
}

pub fn convert(document: &Value, options: &ConversionOptions) -> Result<Conversion> {
    options.validate()?;
    let schema = infer_schema(document, options)?;
    // Fresh generator: population must replay synthesis' names from the start.
    let message = crate::populate::populate(document, &schema, &mut NameGenerator::new(), options)?;
    let wire = WireSchema::build(&schema, options)?;
    let bytes = wire.encode(&message)?;
    Ok(Conversion { schema, message, wire, bytes })
}

pub fn convert_file(input: &Path, output: &Path, options: &ConversionOptions) -> Result<Conversion> {
    let document = read_document(input)?;
    let conversion = convert(&document, options)?;
    write_output(output, &conversion.bytes)?;
    tracing::info!(output = %output.display(), bytes = conversion.bytes.len(), "conversion written");
    Ok(conversion)
}

/// Write via a sibling temp file so a failed write never leaves a
/// truncated output behind.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    write_outputs(&[(path, bytes)])
}

/// Write several files as a unit: every temp file is staged before any
/// target is replaced, targets are renamed in the given order, and a failure
/// removes whatever this call already put in place. Pass the primary output
/// last.
pub fn write_outputs(outputs: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged = Vec::with_capacity(outputs.len());
    for (path, bytes) in outputs {
        match stage(path, bytes) {
            Ok(tmp) => staged.push((tmp, *path)),
            Err(e) => {
                discard(staged.iter().map(|(tmp, _)| tmp.as_path()));
                return Err(e);
            }
        }
    }
    for (done, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(tmp, path) {
            tracing::warn!(path = %path.display(), "output rename failed; rolling back");
            discard(staged[done..].iter().map(|(tmp, _)| tmp.as_path()));
            discard(staged[..done].iter().map(|(_, path)| *path));
            return Err(ConvertError::io(path, e));
        }
    }
    Ok(())
}

fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }
    let tmp = temp_sibling(path);
    if let Err(e) = std::fs::write(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(ConvertError::io(&tmp, e));
    }
    Ok(tmp)
}

fn discard<'a>(paths: impl Iterator<Item = &'a Path>) {
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
