//! Schema descriptors for structured oracle answers.
//!
//! A descriptor names the fields an elicitation wants back, their types and
//! what they mean. It renders to a JSON Schema for providers that support
//! constrained output, and to plain text for the instructions themselves.
//!
//! Every field is declared nullable: the oracle is allowed to leave a value
//! unfilled, and must then explain itself in the always-present `reasoning`.

use serde_json::{json, Map, Value};

/// Name of the explanation field appended to every schema.
pub const REASONING_FIELD: &str = "reasoning";

/// Value type of a described field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Calendar date as `yyyy-mm-dd` text.
    Date,
    Text,
    TextList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: String,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name,
            kind,
            description: description.into(),
        }
    }

    fn json_schema(&self) -> Value {
        match self.kind {
            FieldKind::Date => json!({
                "type": ["string", "null"],
                "description": format!("{} (yyyy-mm-dd)", self.description),
            }),
            FieldKind::Text => json!({
                "type": ["string", "null"],
                "description": self.description,
            }),
            FieldKind::TextList => json!({
                "type": ["array", "null"],
                "items": { "type": "string" },
                "description": self.description,
            }),
        }
    }

    fn type_label(&self) -> &'static str {
        match self.kind {
            FieldKind::Date => "date (yyyy-mm-dd) or null",
            FieldKind::Text => "string or null",
            FieldKind::TextList => "list of strings or null",
        }
    }
}

/// Named set of fields the oracle is asked to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// JSON Schema with every field required-but-nullable plus `reasoning`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            properties.insert(field.name.to_string(), field.json_schema());
            required.push(Value::String(field.name.to_string()));
        }

        properties.insert(
            REASONING_FIELD.to_string(),
            json!({
                "type": "string",
                "description": "Why the values were chosen, or what the user must clarify when a value is null",
            }),
        );
        required.push(Value::String(REASONING_FIELD.to_string()));

        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": Value::Array(required),
            "additionalProperties": false,
        })
    }

    /// Plain-text rendering appended to the instructions.
    pub fn to_prompt_text(&self) -> String {
        let mut text = String::from("Respond with a single JSON object with these keys:\n");
        for field in &self.fields {
            text.push_str(&format!(
                "- {}: {}; {}\n",
                field.name,
                field.type_label(),
                field.description
            ));
        }
        text.push_str(&format!(
            "- {}: string; why the values were chosen, or what the user must clarify when a value is null\n",
            REASONING_FIELD
        ));
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaDescriptor {
        SchemaDescriptor::new("identify_period")
            .with_field(FieldDescriptor::new("date_from", FieldKind::Date, "first day"))
            .with_field(FieldDescriptor::new("columns", FieldKind::TextList, "columns"))
    }

    #[test]
    fn json_schema_requires_every_field_and_reasoning() {
        let schema = sample().to_json_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();

        assert_eq!(required, vec!["date_from", "columns", "reasoning"]);
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn json_schema_marks_fields_nullable() {
        let schema = sample().to_json_schema();
        assert_eq!(schema["properties"]["date_from"]["type"], json!(["string", "null"]));
        assert_eq!(schema["properties"]["columns"]["type"], json!(["array", "null"]));
        assert_eq!(schema["properties"]["reasoning"]["type"], json!("string"));
    }

    #[test]
    fn prompt_text_lists_fields_in_order() {
        let text = sample().to_prompt_text();
        let from = text.find("date_from").unwrap();
        let columns = text.find("columns").unwrap();
        let reasoning = text.find("reasoning").unwrap();
        assert!(from < columns && columns < reasoning);
    }
}
