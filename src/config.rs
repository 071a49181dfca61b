//! Conversion options: file-level protobuf naming plus the two array policies.
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

/// What to do with `[]`. With `Drop` the key simply does not appear in the
/// schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyArrayPolicy {
    #[default]
    Drop,
    Reject,
}

/// How scalar arrays with elements of different JSON kinds are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarArrayPolicy {
    /// Every element must have the first element's kind.
    #[default]
    Strict,
    /// The first element picks the wire type; other elements are converted
    /// when that is lossless and rejected otherwise.
    FirstElementWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionOptions {
    pub package: String,
    pub file_name: String,
    pub empty_arrays: EmptyArrayPolicy,
    pub scalar_arrays: ScalarArrayPolicy,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            package: "inferred".to_string(),
            file_name: "inferred.proto".to_string(),
            empty_arrays: EmptyArrayPolicy::default(),
            scalar_arrays: ScalarArrayPolicy::default(),
        }
    }
}

impl ConversionOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let options: Self = crate::path_de::from_str_with_path(&source)
            .map_err(|e| ConvertError::Config(format!("{}: {e}", path.display())))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !PACKAGE_RE.is_match(&self.package) {
            return Err(ConvertError::Config(format!(
                "package `{}` is not a dotted protobuf identifier",
                self.package
            )));
        }
        if !self.file_name.ends_with(".proto") || self.file_name.len() == ".proto".len() {
            return Err(ConvertError::Config(format!(
                "file_name `{}` must be a non-empty name ending in .proto",
                self.file_name
            )));
        }
        Ok(())
    }
}
