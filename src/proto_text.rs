//! `.proto` source for a compiled schema.
use std::fmt::{self, Write as _};

use crate::config::ConversionOptions;
use crate::ir::{Cardinality, FieldType};
use crate::registry::CompiledSchema;

pub fn render(schema: &CompiledSchema, options: &ConversionOptions) -> String {
    let mut out = String::new();
    write_file(&mut out, schema, options).expect("writing to a String cannot fail");
    out
}

fn write_file(out: &mut String, schema: &CompiledSchema, options: &ConversionOptions) -> fmt::Result {
    writeln!(out, "// {}", options.file_name)?;
    writeln!(out, "syntax = \"proto2\";\n")?;
    writeln!(out, "package {};", options.package)?;

    for ty in schema.types() {
        writeln!(out, "\nmessage {} {{", ty.name)?;
        for field in &ty.fields {
            let label = match field.cardinality {
                Cardinality::Singular => "optional",
                Cardinality::Repeated => "repeated",
            };
            let type_name = match &field.ty {
                FieldType::Scalar(s) => s.label(),
                FieldType::Message(name) => name.as_str(),
            };
            writeln!(out, "  {label} {type_name} {} = {};", field.name, field.number)?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}
