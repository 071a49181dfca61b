// Runtime message tree, isomorphic to the compiled schema.
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Double(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(ScalarValue),
    Repeated(Vec<ScalarValue>),
    Message(MessageInstance),
}

/// One populated record. Fields are keyed by field name, in the order they
/// were set (which is document order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageInstance {
    pub type_name: String,
    pub fields: IndexMap<String, FieldValue>,
}

impl MessageInstance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), fields: IndexMap::new() }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn message(&self, field: &str) -> Option<&MessageInstance> {
        match self.fields.get(field)? {
            FieldValue::Message(m) => Some(m),
            _ => None,
        }
    }

    /// This instance plus every nested instance.
    pub fn instance_count(&self) -> usize {
        1 + self.fields.values()
            .map(|v| match v {
                FieldValue::Message(m) => m.instance_count(),
                _ => 0,
            })
            .sum::<usize>()
    }
}

impl From<f64> for ScalarValue {
    fn from(x: f64) -> Self {
        ScalarValue::Double(OrderedFloat(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_plain_json_tree() {
        let mut child = MessageInstance::new("OWNER_1");
        child.fields.insert("ok".into(), FieldValue::Scalar(ScalarValue::Bool(true)));
        let mut root = MessageInstance::new("ROOT");
        root.fields.insert("ratio".into(), FieldValue::Scalar(0.5.into()));
        root.fields.insert("ids".into(), FieldValue::Repeated(vec![ScalarValue::Uint64(u64::MAX)]));
        root.fields.insert("owner_1".into(), FieldValue::Message(child));

        assert_eq!(root.instance_count(), 2);
        assert_eq!(serde_json::to_value(&root).unwrap(), json!({
            "type_name": "ROOT",
            "fields": {
                "ratio": 0.5,
                "ids": [u64::MAX],
                "owner_1": {"type_name": "OWNER_1", "fields": {"ok": true}},
            },
        }));
    }
}
