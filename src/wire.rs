//! Lowering to protobuf: compiled schema -> `FileDescriptorProto`, message
//! instance -> `DynamicMessage` -> bytes.
use prost::Message as _;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, Value as PbValue};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use crate::config::ConversionOptions;
use crate::error::{ConvertError, Result};
use crate::ir::{Cardinality, FieldDef, FieldType, ScalarType};
use crate::message::{FieldValue, MessageInstance, ScalarValue};
use crate::registry::CompiledSchema;

// -------------------------- Schema lowering ------------------------------ //

pub fn file_descriptor(schema: &CompiledSchema, options: &ConversionOptions) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(options.file_name.clone()),
        package: Some(options.package.clone()),
        syntax: Some("proto2".to_string()),
        message_type: schema.types()
            .map(|ty| DescriptorProto {
                name: Some(ty.name.clone()),
                field: ty.fields.iter().map(|f| field_descriptor(f, &options.package)).collect(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn field_descriptor(field: &FieldDef, package: &str) -> FieldDescriptorProto {
    let label = match field.cardinality {
        Cardinality::Singular => Label::Optional,
        Cardinality::Repeated => Label::Repeated,
    };
    let (ty, type_name) = match &field.ty {
        FieldType::Scalar(s) => (scalar_wire_type(*s), None),
        FieldType::Message(name) => (Type::Message, Some(format!(".{package}.{name}"))),
    };
    // Pinned so protobuf's camel-casing cannot merge `a_b` and `a__b`.
    FieldDescriptorProto {
        name: Some(field.name.clone()),
        json_name: Some(field.name.clone()),
        number: Some(field.number as i32),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        type_name,
        ..Default::default()
    }
}

fn scalar_wire_type(ty: ScalarType) -> Type {
    match ty {
        ScalarType::Bool => Type::Bool,
        ScalarType::Int64 => Type::Int64,
        ScalarType::Uint64 => Type::Uint64,
        ScalarType::Double => Type::Double,
        ScalarType::String => Type::String,
    }
}

/// Compiled descriptors for one conversion.
pub struct WireSchema {
    pub file: FileDescriptorProto,
    pool: DescriptorPool,
    package: String,
}

impl WireSchema {
    pub fn build(schema: &CompiledSchema, options: &ConversionOptions) -> Result<Self> {
        let file = file_descriptor(schema, options);
        let pool = DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file.clone()] })
            .map_err(|e| ConvertError::Encode(e.to_string()))?;
        Ok(Self { file, pool, package: options.package.clone() })
    }

    pub fn descriptor(&self, type_name: &str) -> Result<MessageDescriptor> {
        self.pool
            .get_message_by_name(&format!("{}.{type_name}", self.package))
            .ok_or_else(|| ConvertError::UnknownType(type_name.to_string()))
    }

    /// Serialized `FileDescriptorSet`, for decoding the output elsewhere.
    pub fn descriptor_set_bytes(&self) -> Vec<u8> {
        FileDescriptorSet { file: vec![self.file.clone()] }.encode_to_vec()
    }

    pub fn to_dynamic(&self, message: &MessageInstance) -> Result<DynamicMessage> {
        let mut out = DynamicMessage::new(self.descriptor(&message.type_name)?);
        for (name, value) in &message.fields {
            let value = match value {
                FieldValue::Scalar(s) => scalar_value(s),
                FieldValue::Repeated(xs) => PbValue::List(xs.iter().map(scalar_value).collect()),
                FieldValue::Message(child) => PbValue::Message(self.to_dynamic(child)?),
            };
            out.try_set_field_by_name(name, value)
                .map_err(|e| ConvertError::Encode(format!("{}.{name}: {e}", message.type_name)))?;
        }
        Ok(out)
    }

    pub fn encode(&self, message: &MessageInstance) -> Result<Vec<u8>> {
        let bytes = self.to_dynamic(message)?.encode_to_vec();
        tracing::info!(bytes = bytes.len(), "message encoded");
        Ok(bytes)
    }
}

fn scalar_value(value: &ScalarValue) -> PbValue {
    match value {
        ScalarValue::Bool(b) => PbValue::Bool(*b),
        ScalarValue::Int64(i) => PbValue::I64(*i),
        ScalarValue::Uint64(u) => PbValue::U64(*u),
        ScalarValue::Double(f) => PbValue::F64(f.0),
        ScalarValue::String(s) => PbValue::String(s.clone()),
    }
}
