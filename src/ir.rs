// Schema IR produced by synthesis. No serde_json::Value here.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int64,
    Uint64,
    Double,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Scalar(ScalarType),
    Message(String),        // record type name
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Singular,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: String,       // lowercased identifier
    pub ty: FieldType,
    pub cardinality: Cardinality,
    pub number: u32,        // unique across the whole schema
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// Output of synthesis: record types in discovery (pre-)order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub root: String,
    pub types: Vec<RecordType>,
}

impl ScalarType {
    pub fn label(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int64 => "int64",
            ScalarType::Uint64 => "uint64",
            ScalarType::Double => "double",
            ScalarType::String => "string",
        }
    }
}

impl FieldDef {
    pub fn is_message(&self) -> bool {
        matches!(self.ty, FieldType::Message(_))
    }
}

impl Schema {
    pub fn field_count(&self) -> usize {
        self.types.iter().map(|t| t.fields.len()).sum()
    }

    /// Every field number in the schema, ascending.
    pub fn field_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.types.iter()
            .flat_map(|t| t.fields.iter().map(|f| f.number))
            .collect();
        numbers.sort_unstable();
        numbers
    }
}
