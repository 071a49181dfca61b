//! Message population: the second walk over the document.
//!
//! The walk has exactly the shape of `synth`'s walk and asks its
//! `NameGenerator` for names at the same points, so a generator in the same
//! starting state reproduces every synthetic name the schema was built with.
//! Types and fields are then found by name in the compiled schema; anything
//! the schema does not know about is a mismatch, never silently skipped.
use serde_json::{Map, Number, Value};

use crate::config::{ConversionOptions, EmptyArrayPolicy};
use crate::error::{ConvertError, Result};
use crate::ir::{Cardinality, FieldDef, FieldType, ScalarType};
use crate::message::{FieldValue, MessageInstance, ScalarValue};
use crate::naming::{self, NameGenerator};
use crate::registry::CompiledSchema;
use crate::type_map::kind_of;

pub fn populate(
    root: &Value,
    schema: &CompiledSchema,
    names: &mut NameGenerator,
    options: &ConversionOptions,
) -> Result<MessageInstance> {
    let Value::Object(map) = root else {
        return Err(ConvertError::RootNotObject { found: kind_of(root).label() });
    };
    let mut populator = Populator { schema, names, options };
    let mut message = populator.instance(schema.root())?;
    populator.fill_members(map, &mut message, "#")?;

    tracing::info!(instances = message.instance_count(), "message populated");
    Ok(message)
}

struct Populator<'a> {
    schema: &'a CompiledSchema,
    names: &'a mut NameGenerator,
    options: &'a ConversionOptions,
}

impl<'a> Populator<'a> {
    fn instance(&self, type_name: &str) -> Result<MessageInstance> {
        self.schema.record(type_name)?;
        tracing::debug!(type_name, "message instance");
        Ok(MessageInstance::new(type_name))
    }

    fn lookup(&self, owner: &MessageInstance, field: &str, path: &str) -> Result<&'a FieldDef> {
        let schema = self.schema;
        schema.field(&owner.type_name, field).ok_or_else(|| {
            ConvertError::mismatch(path, format!("type `{}` has no field `{field}`", owner.type_name))
        })
    }

    fn fill_members(&mut self, map: &Map<String, Value>, target: &mut MessageInstance, path: &str) -> Result<()> {
        for (key, value) in map {
            let path = naming::pointer_child(path, key);
            self.visit_value(value, &naming::sanitize_key(key), target, &path)?;
        }
        Ok(())
    }

    fn visit_value(&mut self, value: &Value, key: &str, parent: &mut MessageInstance, path: &str) -> Result<()> {
        match value {
            Value::Object(map) => {
                let name = self.names.next_name(key);
                let mut child = self.instance(&name.type_name)?;
                self.fill_members(map, &mut child, path)?;
                self.attach(parent, name.field_name, child, path)
            }
            Value::Array(items) => self.visit_array(items, key, parent, path),
            scalar => {
                let field_name = key.to_ascii_lowercase();
                let def = self.lookup(parent, &field_name, path)?;
                let ty = match (&def.ty, def.cardinality) {
                    (FieldType::Scalar(ty), Cardinality::Singular) => *ty,
                    _ => {
                        return Err(ConvertError::mismatch(
                            path,
                            format!("field `{field_name}` is not a singular scalar"),
                        ));
                    }
                };
                let value = coerce(scalar, ty).ok_or_else(|| {
                    ConvertError::mismatch(
                        path,
                        format!("JSON {} does not fit {} field `{field_name}`", kind_of(scalar).label(), ty.label()),
                    )
                })?;
                parent.fields.insert(field_name, FieldValue::Scalar(value));
                Ok(())
            }
        }
    }

    fn visit_array(&mut self, items: &[Value], key: &str, parent: &mut MessageInstance, path: &str) -> Result<()> {
        let Some(first) = items.first() else {
            return match self.options.empty_arrays {
                EmptyArrayPolicy::Drop => Ok(()),
                EmptyArrayPolicy::Reject => Err(ConvertError::EmptyArray { path: path.to_string() }),
            };
        };

        if !kind_of(first).is_container() {
            let field_name = key.to_ascii_lowercase();
            let def = self.lookup(parent, &field_name, path)?;
            let ty = match (&def.ty, def.cardinality) {
                (FieldType::Scalar(ty), Cardinality::Repeated) => *ty,
                _ => {
                    return Err(ConvertError::mismatch(
                        path,
                        format!("field `{field_name}` is not a repeated scalar"),
                    ));
                }
            };
            let values = items.iter().enumerate()
                .map(|(index, item)| {
                    coerce(item, ty).ok_or_else(|| ConvertError::IncompatibleElement {
                        path: path.to_string(),
                        index,
                        expected: ty.label(),
                        found: kind_of(item).label(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            parent.fields.insert(field_name, FieldValue::Repeated(values));
            return Ok(());
        }

        let wrapper = self.names.next_name(key);
        let mut holder = self.instance(&wrapper.type_name)?;
        for (index, item) in items.iter().enumerate() {
            let element_key = self.names.next_name(&wrapper.field_name).field_name;
            let element_path = naming::pointer_child(path, &index.to_string());
            self.visit_value(item, &element_key, &mut holder, &element_path)?;
        }
        self.attach(parent, wrapper.field_name, holder, path)
    }

    /// Move a finished child into its parent's message field.
    fn attach(&self, parent: &mut MessageInstance, field_name: String, child: MessageInstance, path: &str) -> Result<()> {
        let def = self.lookup(parent, &field_name, path)?;
        match &def.ty {
            FieldType::Message(target) if *target == child.type_name && def.cardinality == Cardinality::Singular => {
                parent.fields.insert(field_name, FieldValue::Message(child));
                Ok(())
            }
            _ => Err(ConvertError::mismatch(
                path,
                format!("field `{field_name}` does not hold a `{}` message", child.type_name),
            )),
        }
    }
}

// ----------------------------- Coercion --------------------------------- //

// 2^63 and 2^64 are exact in f64; anything at or past them is out of range.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Lossless conversion of a JSON scalar into a wire scalar, if one exists.
/// Integers widen to double; integral doubles narrow to int64/uint64.
pub fn coerce(value: &Value, ty: ScalarType) -> Option<ScalarValue> {
    match (ty, value) {
        (ScalarType::Bool, Value::Bool(b)) => Some(ScalarValue::Bool(*b)),
        (ScalarType::String, Value::String(s)) => Some(ScalarValue::String(s.clone())),
        (ScalarType::Double, Value::Number(n)) => exact_f64(n).map(ScalarValue::from),
        (ScalarType::Int64, Value::Number(n)) => n.as_i64()
            .or_else(|| integral(n).filter(|f| (-I64_LIMIT..I64_LIMIT).contains(f)).map(|f| f as i64))
            .map(ScalarValue::Int64),
        (ScalarType::Uint64, Value::Number(n)) => n.as_u64()
            .or_else(|| integral(n).filter(|f| (0.0..U64_LIMIT).contains(f)).map(|f| f as u64))
            .map(ScalarValue::Uint64),
        _ => None,
    }
}

/// Integers only when the double holds them exactly.
fn exact_f64(n: &Number) -> Option<f64> {
    if let Some(i) = n.as_i64() {
        let f = i as f64;
        return (f < I64_LIMIT && f as i64 == i).then_some(f);
    }
    if let Some(u) = n.as_u64() {
        let f = u as f64;
        return (f < U64_LIMIT && f as u64 == u).then_some(f);
    }
    n.as_f64()
}

fn integral(n: &Number) -> Option<f64> {
    n.as_f64().filter(|f| n.is_f64() && f.fract() == 0.0)
}

// ------------------------------- Tests ----------------------------------- //
