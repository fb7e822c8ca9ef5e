//! Typed input/output contracts.
//!
//! Every flow input and output implements [`Schema`], which describes the
//! accepted JSON shape together with its field-level constraints. Values are
//! checked against a contract with [`Contract::validate`] before they are
//! rendered into a prompt (inputs) or handed back to a caller (outputs).

mod validate;

pub use validate::{ContractViolation, ViolationKind};

use serde_json::{json, Map, Value};

/// Implemented by every type that crosses a flow boundary.
pub trait Schema {
    fn contract() -> Contract;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Enum(Vec<&'static str>),
    Array {
        items: Box<FieldType>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(Contract),
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::String {
            min_len: None,
            max_len: None,
        }
    }

    /// A string that must contain at least one character.
    pub fn text() -> Self {
        FieldType::String {
            min_len: Some(1),
            max_len: None,
        }
    }

    pub fn text_up_to(max_len: usize) -> Self {
        FieldType::String {
            min_len: Some(1),
            max_len: Some(max_len),
        }
    }

    pub fn integer(min: i64, max: i64) -> Self {
        FieldType::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn number(min: f64, max: f64) -> Self {
        FieldType::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn one_of(values: &[&'static str]) -> Self {
        FieldType::Enum(values.to_vec())
    }

    pub fn list(items: FieldType) -> Self {
        FieldType::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn list_between(items: FieldType, min_items: usize, max_items: usize) -> Self {
        FieldType::Array {
            items: Box::new(items),
            min_items: Some(min_items),
            max_items: Some(max_items),
        }
    }

    pub fn exactly(items: FieldType, count: usize) -> Self {
        Self::list_between(items, count, count)
    }

    pub fn object<T: Schema>() -> Self {
        FieldType::Object(T::contract())
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } | FieldType::Enum(_) => "string",
            FieldType::Integer { .. } => "integer",
            FieldType::Number { .. } => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array { .. } => "array",
            FieldType::Object(_) => "object",
        }
    }

    /// Structured-output schema in the shape the hosted model expects.
    pub fn response_schema(&self) -> Value {
        match self {
            FieldType::String { .. } => json!({ "type": "STRING" }),
            FieldType::Integer { min, max } => {
                let mut schema = json!({ "type": "INTEGER" });
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            FieldType::Number { min, max } => {
                let mut schema = json!({ "type": "NUMBER" });
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            FieldType::Boolean => json!({ "type": "BOOLEAN" }),
            FieldType::Enum(values) => json!({ "type": "STRING", "enum": values }),
            FieldType::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut schema = json!({ "type": "ARRAY", "items": items.response_schema() });
                if let Some(min) = min_items {
                    schema["minItems"] = json!(min);
                }
                if let Some(max) = max_items {
                    schema["maxItems"] = json!(max);
                }
                schema
            }
            FieldType::Object(contract) => contract.response_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub description: Option<&'static str>,
}

/// Named set of fields describing one JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    name: &'static str,
    fields: Vec<Field>,
}

impl Contract {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn required(mut self, name: &'static str, ty: FieldType) -> Self {
        self.fields.push(Field {
            name,
            ty,
            required: true,
            description: None,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, ty: FieldType) -> Self {
        self.fields.push(Field {
            name,
            ty,
            required: false,
            description: None,
        });
        self
    }

    /// Attaches a description to the most recently added field.
    pub fn describe(mut self, description: &'static str) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.description = Some(description);
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self, value: &Value) -> Result<(), ContractViolation> {
        validate::validate_object(self, value, "$")
    }

    /// Turns integral floats in integer fields into integers. Run after
    /// [`Contract::validate`].
    pub fn normalize(&self, value: &mut Value) {
        validate::normalize_object(self, value);
    }

    pub fn response_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut schema = field.ty.response_schema();
            if let Some(description) = field.description {
                schema["description"] = json!(description);
            }
            if !field.required {
                schema["nullable"] = json!(true);
            } else {
                required.push(field.name);
            }
            properties.insert(field.name.to_string(), schema);
        }
        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        })
    }
}
