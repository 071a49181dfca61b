//! Error taxonomy for a single conversion run.
//!
//! Every variant is fatal to the conversion it came from; nothing here is
//! retried. Paths are `#`-anchored JSON pointers into the input document.
use std::path::PathBuf;

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{path}: JSON {kind} has no wire type mapping")]
    UnsupportedType { path: String, kind: &'static str },

    #[error("record type `{0}` is defined more than once")]
    DuplicateTypeName(String),

    #[error("record type `{type_name}` declares field `{field}` more than once")]
    DuplicateFieldName { type_name: String, field: String },

    #[error("field number {number} is assigned more than once")]
    DuplicateFieldNumber { number: u32 },

    #[error("record type `{0}` is not in the compiled schema")]
    UnknownType(String),

    #[error("{path}: document does not match compiled schema: {detail}")]
    SchemaMismatch { path: String, detail: String },

    #[error("{path}/{index}: array element is {found}, but the array started with {expected}")]
    MixedArray {
        path: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}/{index}: cannot store JSON {found} in a repeated {expected} field")]
    IncompatibleElement {
        path: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: empty arrays are rejected by the configured policy")]
    EmptyArray { path: String },

    #[error("document root must be a JSON object, found {found}")]
    RootNotObject { found: &'static str },

    #[error("schema needs more field numbers than protobuf allows")]
    FieldNumberOverflow,

    #[error("input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wire encoding failed: {0}")]
    Encode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn mismatch(path: &str, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch { path: path.to_string(), detail: detail.into() }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse {
            line: error.line(),
            column: error.column(),
            message: strip_position(&error.to_string()).to_string(),
        }
    }
}

// serde_json appends " at line L column C"; we carry those separately.
fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(at) => &message[..at],
        None => message,
    }
}
