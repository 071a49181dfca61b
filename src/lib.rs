//! Infer a protobuf schema from a JSON document and encode the document
//! against it.
//!
//! Two walks over the same `serde_json::Value`:
//! 1. `synth` builds one record type per object (plus wrapper types for
//!    arrays of containers) with schema-wide unique field numbers;
//! 2. `populate` replays the same naming sequence to fill a `MessageInstance`
//!    that `wire` encodes through `prost-reflect`.
//!
//! `driver` sequences the stages; `driver::convert` is the usual entry point.
pub mod config;
pub mod driver;
pub mod error;
pub mod ir;
pub mod message;
pub mod naming;
pub mod path_de;
pub mod populate;
pub mod proto_text;
pub mod registry;
pub mod synth;
pub mod type_map;
pub mod wire;

pub use config::{ConversionOptions, EmptyArrayPolicy, ScalarArrayPolicy};
pub use driver::{convert, convert_file, Conversion};
pub use error::{ConvertError, Result};
pub use naming::NameGenerator;
