//! Decoder for the os-vif "versioned object" primitive format.
//!
//! Every object is wrapped as `{"versioned_object.data": {...}}` and lists of
//! objects are usually wrapped once more as
//! `{"versioned_object.data": {"objects": [...]}}`. Instead of writing a
//! parser per record, each record type declares a static [`Schema`] and the
//! single traversal in [`unwrap_object`] strips the envelopes, producing a
//! plain JSON object that serde deserializes into the record.

use std::error::Error;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const DATA_KEY: &str = "versioned_object.data";
pub const OBJECTS_KEY: &str = "objects";

/// Field layout of one versioned object type.
#[derive(Debug)]
pub struct Schema {
    /// Name used as the root of error paths.
    pub name: &'static str,
    pub fields: &'static [Field],
}

#[derive(Debug)]
pub struct Field {
    pub key: &'static str,
    pub shape: Shape,
    /// Absent or null optional fields are left out of the decoded object.
    pub required: bool,
}

impl Field {
    pub const fn required(key: &'static str, shape: Shape) -> Self {
        Field {
            key,
            shape,
            required: true,
        }
    }

    pub const fn optional(key: &'static str, shape: Shape) -> Self {
        Field {
            key,
            shape,
            required: false,
        }
    }
}

#[derive(Debug)]
pub enum Shape {
    Str,
    /// A plain JSON array or an `objects` collection wrapper.
    List(Item),
    Object(&'static Schema),
}

/// Element shape of a [`Shape::List`].
#[derive(Debug)]
pub enum Item {
    Str,
    Object(&'static Schema),
}

/// A record that can be decoded from a versioned object envelope.
pub trait VersionedObject: DeserializeOwned {
    fn schema() -> &'static Schema;
}

#[derive(Debug)]
pub enum DecodeErrorKind {
    /// The input is not JSON at all.
    Json(serde_json::Error),
    /// The value is not wrapped in `versioned_object.data`.
    MissingEnvelope,
    /// A required key is absent or null.
    MissingKey,
    /// A collection wrapper without an `objects` list.
    MissingObjects,
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
    /// The unwrapped object does not fit the target record.
    Record(serde_json::Error),
}

#[derive(Debug)]
pub struct DecodeError {
    /// Dotted path of the offending field, e.g. `VIF.network.subnets[0].cidr`.
    pub path: String,
    /// The key that was being read, if any.
    pub key: Option<&'static str>,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    fn new(path: &str, key: Option<&'static str>, kind: DecodeErrorKind) -> Self {
        DecodeError {
            path: path.to_string(),
            key,
            kind,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DecodeErrorKind::Json(e) => write!(f, "invalid JSON: {}", e),
            DecodeErrorKind::MissingEnvelope => {
                write!(f, "field {}: value is not wrapped in {:?}", self.path, DATA_KEY)
            }
            DecodeErrorKind::MissingKey => write!(
                f,
                "field {}: required key {:?} is missing",
                self.path,
                self.key.unwrap_or_default()
            ),
            DecodeErrorKind::MissingObjects => write!(
                f,
                "field {}: list wrapper has no {:?} array",
                self.path, OBJECTS_KEY
            ),
            DecodeErrorKind::WrongKind { expected, found } => write!(
                f,
                "field {}: expected {} for key {:?}, found {}",
                self.path,
                expected,
                self.key.unwrap_or_default(),
                found
            ),
            DecodeErrorKind::Record(e) => write!(f, "field {}: {}", self.path, e),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::Json(e) | DecodeErrorKind::Record(e) => Some(e),
            _ => None,
        }
    }
}

/// Decode raw bytes holding a versioned object envelope into `T`.
pub fn from_slice<T: VersionedObject>(data: &[u8]) -> Result<T, DecodeError> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|e| DecodeError::new(T::schema().name, None, DecodeErrorKind::Json(e)))?;
    from_value(&value)
}

/// Decode an already parsed versioned object envelope into `T`.
pub fn from_value<T: VersionedObject>(value: &Value) -> Result<T, DecodeError> {
    let schema = T::schema();
    let plain = unwrap_object(value, schema, schema.name)?;
    serde_json::from_value(Value::Object(plain))
        .map_err(|e| DecodeError::new(schema.name, None, DecodeErrorKind::Record(e)))
}

/// Strip the envelope of `value` and of every nested object the schema
/// describes, returning the plain field map.
pub fn unwrap_object(
    value: &Value,
    schema: &'static Schema,
    path: &str,
) -> Result<Map<String, Value>, DecodeError> {
    let data = envelope_data(value, path)?;

    let mut plain = Map::with_capacity(schema.fields.len());
    for field in schema.fields {
        let field_path = format!("{}.{}", path, field.key);
        match data.get(field.key) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(DecodeError::new(
                        &field_path,
                        Some(field.key),
                        DecodeErrorKind::MissingKey,
                    ));
                }
            }
            Some(v) => {
                let decoded = decode_field(v, &field.shape, &field_path, field.key)?;
                plain.insert(field.key.to_string(), decoded);
            }
        }
    }
    Ok(plain)
}

fn envelope_data<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    match value.get(DATA_KEY) {
        Some(Value::Object(data)) => Ok(data),
        Some(other) => Err(DecodeError::new(
            path,
            Some(DATA_KEY),
            DecodeErrorKind::WrongKind {
                expected: "an object",
                found: kind_of(other),
            },
        )),
        None => Err(DecodeError::new(
            path,
            None,
            DecodeErrorKind::MissingEnvelope,
        )),
    }
}

fn decode_field(
    value: &Value,
    shape: &Shape,
    path: &str,
    key: &'static str,
) -> Result<Value, DecodeError> {
    match shape {
        Shape::Str => expect_str(value, path, key),
        Shape::List(item) => {
            let elements = match value {
                Value::Array(elements) => elements,
                Value::Object(_) => collection_objects(value, path)?,
                other => {
                    return Err(DecodeError::new(
                        path,
                        Some(key),
                        DecodeErrorKind::WrongKind {
                            expected: "a list",
                            found: kind_of(other),
                        },
                    ))
                }
            };

            let mut decoded = Vec::with_capacity(elements.len());
            for (i, element) in elements.iter().enumerate() {
                let element_path = format!("{}[{}]", path, i);
                decoded.push(match item {
                    Item::Str => expect_str(element, &element_path, key)?,
                    Item::Object(schema) => {
                        Value::Object(unwrap_object(element, schema, &element_path)?)
                    }
                });
            }
            Ok(Value::Array(decoded))
        }
        Shape::Object(schema) => Ok(Value::Object(unwrap_object(value, schema, path)?)),
    }
}

/// Unwrap a `{"versioned_object.data": {"objects": [...]}}` list wrapper.
fn collection_objects<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, DecodeError> {
    let data = envelope_data(value, path)?;
    match data.get(OBJECTS_KEY) {
        Some(Value::Array(objects)) => Ok(objects),
        Some(other) => Err(DecodeError::new(
            path,
            Some(OBJECTS_KEY),
            DecodeErrorKind::WrongKind {
                expected: "a list",
                found: kind_of(other),
            },
        )),
        None => Err(DecodeError::new(
            path,
            Some(OBJECTS_KEY),
            DecodeErrorKind::MissingObjects,
        )),
    }
}

fn expect_str(value: &Value, path: &str, key: &'static str) -> Result<Value, DecodeError> {
    match value {
        Value::String(_) => Ok(value.clone()),
        other => Err(DecodeError::new(
            path,
            Some(key),
            DecodeErrorKind::WrongKind {
                expected: "a string",
                found: kind_of(other),
            },
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
