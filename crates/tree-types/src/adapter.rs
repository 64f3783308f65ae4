//! Adapter seam for external collaborators.
//!
//! DTO layers, ORM collections, and request objects expose themselves to
//! the engine through these traits; the core never reaches into a foreign
//! representation directly.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TreeError;
use crate::value::Value;

/// Exposes an external representation as a [`Value`] tree.
pub trait IntoTreeValue {
    fn into_value(&self) -> Value;
}

/// Rebuilds an external representation from a [`Value`] tree.
pub trait FromTreeValue: Sized {
    fn from_value(value: Value) -> Result<Self, TreeError>;
}

/// Converts any `Serialize` type into a [`Value`] via its serde shape.
pub fn to_value<T: Serialize>(input: &T) -> Result<Value, TreeError> {
    let json = serde_json::to_value(input).map_err(|e| TreeError::Conversion(e.to_string()))?;
    Ok(Value::from(json))
}

/// Converts a [`Value`] into any `DeserializeOwned` type.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, TreeError> {
    let json: serde_json::Value = value.into();
    serde_json::from_value(json).map_err(|e| TreeError::Conversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Contact {
        name: String,
        emails: Vec<String>,
    }

    impl IntoTreeValue for Contact {
        fn into_value(&self) -> Value {
            to_value(self).unwrap_or(Value::Null)
        }
    }

    impl FromTreeValue for Contact {
        fn from_value(value: Value) -> Result<Self, TreeError> {
            from_value(value)
        }
    }

    #[test]
    fn adapter_roundtrip() {
        let contact = Contact {
            name: "Alice".to_string(),
            emails: vec!["a@w".to_string(), "a@h".to_string()],
        };

        let value = contact.into_value();
        assert_eq!(
            value,
            Value::from(serde_json::json!({ "name": "Alice", "emails": ["a@w", "a@h"] }))
        );

        let back = Contact::from_value(value).unwrap();
        assert_eq!(back, contact);
    }

    #[test]
    fn from_value_rejects_mismatched_shape() {
        let result: Result<Contact, _> = from_value(Value::Int(3));
        assert!(result.is_err());
    }
}
