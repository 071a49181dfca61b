//! Schema synthesis: one pre-order walk over the document that emits a flat
//! list of record types.
//!
//! - Every JSON object becomes a record type. The root is `ROOT`; every other
//!   object is named `<key>_<suffix>` and referenced from its parent by a
//!   singular message field.
//! - An array of scalars becomes one repeated scalar field on the parent.
//! - An array whose first element is an object or array becomes a wrapper
//!   record type with one field per element, each element under its own
//!   synthetic name. Heterogeneous arrays therefore never need a common type.
//! - Empty arrays follow `EmptyArrayPolicy`.
//!
//! The population walk in `populate` must mirror this one call for call on
//! the `NameGenerator`.
use serde_json::{Map, Value};

use crate::config::{ConversionOptions, EmptyArrayPolicy, ScalarArrayPolicy};
use crate::error::{ConvertError, Result};
use crate::ir::{Cardinality, FieldDef, FieldType, RecordType, Schema};
use crate::naming::{self, NameGenerator, ROOT_TYPE_NAME};
use crate::type_map::{kind_of, scalar_type};

// ------------------------------ Front API -------------------------------- //

pub fn synthesize(
    root: &Value,
    names: &mut NameGenerator,
    options: &ConversionOptions,
) -> Result<Schema> {
    let Value::Object(map) = root else {
        return Err(ConvertError::RootNotObject { found: kind_of(root).label() });
    };
    let mut synth = Synthesizer { names, options, types: Vec::new() };
    synth.push_type(ROOT_TYPE_NAME.to_string());
    synth.visit_members(map, 0, "#")?;

    tracing::info!(
        types = synth.types.len(),
        fields = synth.types.iter().map(|t| t.fields.len()).sum::<usize>(),
        "schema synthesized"
    );
    Ok(Schema { root: ROOT_TYPE_NAME.to_string(), types: synth.types })
}

// ------------------------------- Walk ------------------------------------ //

struct Synthesizer<'a> {
    names: &'a mut NameGenerator,
    options: &'a ConversionOptions,
    types: Vec<RecordType>,       // discovery order; parents refer by index
}

impl Synthesizer<'_> {
    fn push_type(&mut self, name: String) -> usize {
        tracing::debug!(type_name = %name, "record type");
        self.types.push(RecordType { name, fields: Vec::new() });
        self.types.len() - 1
    }

    fn push_field(&mut self, owner: usize, name: String, ty: FieldType, cardinality: Cardinality) -> Result<()> {
        let number = self.names.next_field_number()?;
        self.types[owner].fields.push(FieldDef { name, ty, cardinality, number });
        Ok(())
    }

    /// New named record type hanging off `owner` by a singular message field.
    fn push_child_type(&mut self, owner: usize, context: &str) -> Result<usize> {
        let name = self.names.next_name(context);
        let child = self.push_type(name.type_name.clone());
        self.push_field(owner, name.field_name, FieldType::Message(name.type_name), Cardinality::Singular)?;
        Ok(child)
    }

    fn visit_members(&mut self, map: &Map<String, Value>, owner: usize, path: &str) -> Result<()> {
        for (key, value) in map {
            let path = naming::pointer_child(path, key);
            self.visit_value(value, &naming::sanitize_key(key), owner, &path)?;
        }
        Ok(())
    }

    fn visit_value(&mut self, value: &Value, key: &str, owner: usize, path: &str) -> Result<()> {
        match value {
            Value::Object(map) => {
                let child = self.push_child_type(owner, key)?;
                self.visit_members(map, child, path)
            }
            Value::Array(items) => self.visit_array(items, key, owner, path),
            scalar => {
                let ty = scalar_type(kind_of(scalar), path)?;
                self.push_field(owner, key.to_ascii_lowercase(), FieldType::Scalar(ty), Cardinality::Singular)
            }
        }
    }

    fn visit_array(&mut self, items: &[Value], key: &str, owner: usize, path: &str) -> Result<()> {
        let Some(first) = items.first() else {
            return match self.options.empty_arrays {
                EmptyArrayPolicy::Drop => {
                    tracing::warn!(path, "empty array dropped from schema");
                    Ok(())
                }
                EmptyArrayPolicy::Reject => Err(ConvertError::EmptyArray { path: path.to_string() }),
            };
        };

        let first_kind = kind_of(first);
        if !first_kind.is_container() {
            let ty = scalar_type(first_kind, &naming::pointer_child(path, "0"))?;
            if self.options.scalar_arrays == ScalarArrayPolicy::Strict {
                check_homogeneous(items, path)?;
            }
            return self.push_field(owner, key.to_ascii_lowercase(), FieldType::Scalar(ty), Cardinality::Repeated);
        }

        let wrapper = self.names.next_name(key);
        let wrapper_index = self.push_type(wrapper.type_name.clone());
        self.push_field(
            owner,
            wrapper.field_name.clone(),
            FieldType::Message(wrapper.type_name),
            Cardinality::Singular,
        )?;
        for (index, item) in items.iter().enumerate() {
            let element_key = self.names.next_name(&wrapper.field_name).field_name;
            let element_path = naming::pointer_child(path, &index.to_string());
            self.visit_value(item, &element_key, wrapper_index, &element_path)?;
        }
        Ok(())
    }
}

fn check_homogeneous(items: &[Value], path: &str) -> Result<()> {
    let expected = kind_of(&items[0]);
    for (index, item) in items.iter().enumerate().skip(1) {
        let found = kind_of(item);
        if found != expected {
            return Err(ConvertError::MixedArray {
                path: path.to_string(),
                index,
                expected: expected.label(),
                found: found.label(),
            });
        }
    }
    Ok(())
}

// ------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ScalarType;
    use serde_json::json;

    fn synth(doc: Value) -> Schema {
        synthesize(&doc, &mut NameGenerator::new(), &ConversionOptions::default()).unwrap()
    }

    fn type_named<'a>(schema: &'a Schema, name: &str) -> &'a RecordType {
        schema.types.iter().find(|t| t.name == name).unwrap_or_else(|| panic!("no type {name}"))
    }

    #[test]
    fn scalars_become_singular_fields_on_root() {
        let schema = synth(json!({"a": true, "b": 3, "c": 3.5, "d": "x"}));
        assert_eq!(schema.root, "ROOT");
        assert_eq!(schema.types.len(), 1);
        let root = &schema.types[0];
        let kinds: Vec<_> = root.fields.iter().map(|f| (f.name.as_str(), f.ty.clone(), f.number)).collect();
        assert_eq!(kinds, vec![
            ("a", FieldType::Scalar(ScalarType::Bool), 1),
            ("b", FieldType::Scalar(ScalarType::Int64), 2),
            ("c", FieldType::Scalar(ScalarType::Double), 3),
            ("d", FieldType::Scalar(ScalarType::String), 4),
        ]);
        assert!(root.fields.iter().all(|f| f.cardinality == Cardinality::Singular));
    }

    #[test]
    fn nested_object_gets_suffixed_type() {
        let schema = synth(json!({"user": {"name": "x", "Age": 4}}));
        let names: Vec<_> = schema.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ROOT", "USER_1"]);
        let link = &schema.types[0].fields[0];
        assert_eq!(link.name, "user_1");
        assert_eq!(link.ty, FieldType::Message("USER_1".into()));
        assert_eq!(link.number, 1);
        let user = type_named(&schema, "USER_1");
        assert_eq!(user.fields[1].name, "age");
        assert_eq!(user.fields[1].number, 3);
    }

    #[test]
    fn scalar_array_is_one_repeated_field() {
        let schema = synth(json!({"a": [1, 2, 3]}));
        assert_eq!(schema.types.len(), 1);
        let field = &schema.types[0].fields[0];
        assert_eq!(field.name, "a");
        assert_eq!(field.cardinality, Cardinality::Repeated);
        assert_eq!(field.ty, FieldType::Scalar(ScalarType::Int64));
    }

    #[test]
    fn object_array_gets_wrapper_with_field_per_element() {
        let schema = synth(json!({"a": [{"x": 1}, {"y": 2}]}));
        let names: Vec<_> = schema.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ROOT", "A_1", "A_1_2_3", "A_1_4_5"]);

        let wrapper = type_named(&schema, "A_1");
        assert_eq!(wrapper.fields.len(), 2);
        for field in &wrapper.fields {
            assert_eq!(field.cardinality, Cardinality::Singular);
            assert!(field.is_message());
        }
        assert_eq!(wrapper.fields[0].ty, FieldType::Message("A_1_2_3".into()));
        assert_eq!(wrapper.fields[1].ty, FieldType::Message("A_1_4_5".into()));
        assert_eq!(type_named(&schema, "A_1_4_5").fields[0].name, "y");
    }

    #[test]
    fn wrapper_elements_may_be_scalars_or_arrays() {
        let schema = synth(json!({"m": [[1, 2], "s", [{"k": true}]]}));
        let wrapper = type_named(&schema, "M_1");
        let fields: Vec<_> = wrapper.fields.iter().map(|f| (f.name.as_str(), f.cardinality)).collect();
        assert_eq!(fields, vec![
            ("m_1_2", Cardinality::Repeated),
            ("m_1_3", Cardinality::Singular),
            ("m_1_4_5", Cardinality::Singular),
        ]);
        let inner = type_named(&schema, "M_1_4_5");
        assert_eq!(inner.fields[0].ty, FieldType::Message("M_1_4_5_6_7".into()));
    }

    // Documented quirk: `[]` leaves no trace in the schema.
    #[test]
    fn empty_array_is_dropped() {
        let schema = synth(json!({"a": [], "b": 1}));
        assert!(schema.types.iter().all(|t| t.fields.iter().all(|f| f.name != "a")));
        assert_eq!(schema.types[0].fields[0].name, "b");
        assert_eq!(schema.types[0].fields[0].number, 1);
    }

    #[test]
    fn empty_array_reject_policy() {
        let options = ConversionOptions { empty_arrays: EmptyArrayPolicy::Reject, ..Default::default() };
        let err = synthesize(&json!({"x": {"a": []}}), &mut NameGenerator::new(), &options).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyArray { ref path } if path == "#/x/a"));
    }

    #[test]
    fn mixed_scalar_array_is_rejected_when_strict() {
        let err = synthesize(&json!({"a": [1, "two"]}), &mut NameGenerator::new(), &ConversionOptions::default())
            .unwrap_err();
        match err {
            ConvertError::MixedArray { path, index, expected, found } => {
                assert_eq!(path, "#/a");
                assert_eq!(index, 1);
                assert_eq!(expected, "integer");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn first_element_wins_takes_first_kind() {
        let options = ConversionOptions { scalar_arrays: ScalarArrayPolicy::FirstElementWins, ..Default::default() };
        let schema = synthesize(&json!({"a": [1.5, 2]}), &mut NameGenerator::new(), &options).unwrap();
        assert_eq!(schema.types[0].fields[0].ty, FieldType::Scalar(ScalarType::Double));
    }

    #[test]
    fn null_is_unsupported() {
        let err = synthesize(&json!({"o": {"n": null}}), &mut NameGenerator::new(), &ConversionOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedType { ref path, kind: "null" } if path == "#/o/n"));
    }

    #[test]
    fn root_must_be_object() {
        let err = synthesize(&json!([1]), &mut NameGenerator::new(), &ConversionOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::RootNotObject { found: "array" }));
    }

    #[test]
    fn field_numbers_strictly_increase_in_discovery_order() {
        let schema = synth(json!({"a": 1, "b": {"c": [{"d": 1}], "e": [true]}, "f": "x"}));
        let numbers = schema.field_numbers();
        assert_eq!(numbers, (1..=numbers.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn reusing_a_generator_changes_names() {
        let doc = json!({"a": {"b": 1}});
        let mut names = NameGenerator::new();
        let options = ConversionOptions::default();
        let first = synthesize(&doc, &mut names, &options).unwrap();
        let second = synthesize(&doc, &mut names, &options).unwrap();
        assert_eq!(first.types[1].name, "A_1");
        assert_eq!(second.types[1].name, "A_2");
    }
}
