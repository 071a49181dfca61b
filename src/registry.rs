//! Compiled schema: the synthesized record types indexed by name, and each
//! type's fields indexed by field name. Built once, read-only afterwards.
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{ConvertError, Result};
use crate::ir::{FieldDef, FieldType, RecordType, Schema};

#[derive(Debug, Clone)]
pub struct CompiledSchema {
    root: String,
    types: IndexMap<String, CompiledType>,
}

#[derive(Debug, Clone)]
pub struct CompiledType {
    pub def: RecordType,
    fields: IndexMap<String, usize>,  // field name -> position in def.fields
}

impl CompiledType {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name).map(|&i| &self.def.fields[i])
    }
}

pub fn compile(schema: Schema) -> Result<CompiledSchema> {
    let mut types = IndexMap::with_capacity(schema.types.len());
    let mut numbers = HashSet::new();

    for def in schema.types {
        let mut fields = IndexMap::with_capacity(def.fields.len());
        for (i, field) in def.fields.iter().enumerate() {
            if fields.insert(field.name.clone(), i).is_some() {
                return Err(ConvertError::DuplicateFieldName {
                    type_name: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            if !numbers.insert(field.number) {
                return Err(ConvertError::DuplicateFieldNumber { number: field.number });
            }
        }
        if types.contains_key(&def.name) {
            return Err(ConvertError::DuplicateTypeName(def.name));
        }
        types.insert(def.name.clone(), CompiledType { def, fields });
    }

    let compiled = CompiledSchema { root: schema.root, types };
    compiled.record(&compiled.root)?;
    for ty in compiled.types.values() {
        for field in &ty.def.fields {
            if let FieldType::Message(target) = &field.ty {
                compiled.record(target)?;
            }
        }
    }

    tracing::debug!(types = compiled.types.len(), "schema compiled");
    Ok(compiled)
}

impl CompiledSchema {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn record(&self, name: &str) -> Result<&CompiledType> {
        self.types.get(name).ok_or_else(|| ConvertError::UnknownType(name.to_string()))
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.types.get(type_name)?.field(field_name)
    }

    /// Record types in discovery order.
    pub fn types(&self) -> impl Iterator<Item = &RecordType> {
        self.types.values().map(|t| &t.def)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn to_schema(&self) -> Schema {
        Schema { root: self.root.clone(), types: self.types().cloned().collect() }
    }
}
