// 🔗 Multi-Value Joiner - list attributes packed into one field
// keywords, colors, frame effects, promo types

use crate::config::LedgerFormat;
use crate::error::{LedgerError, Result};

/// Reject values that would be split apart on read.
pub fn check_reserved(value: &str, format: &LedgerFormat) -> Result<()> {
    for separator in format.reserved() {
        if value.contains(separator) {
            return Err(LedgerError::ReservedSeparator {
                value: value.to_string(),
                separator,
            });
        }
    }
    Ok(())
}

/// Join scalar values with the value separator.
///
/// An empty list joins to an empty field, so a list whose only value is
/// empty has no field form of its own and is rejected.
pub fn join_values<S: AsRef<str>>(values: &[S], format: &LedgerFormat) -> Result<String> {
    if let [only] = values {
        if only.as_ref().is_empty() {
            return Err(LedgerError::LoneEmptyValue);
        }
    }

    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        let value = value.as_ref();
        check_reserved(value, format)?;
        if i > 0 {
            out.push(format.value_separator);
        }
        out.push_str(value);
    }
    Ok(out)
}

/// Inverse of `join_values`. An empty field is an empty list.
pub fn split_values(field: &str, format: &LedgerFormat) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field
        .split(format.value_separator)
        .map(str::to_string)
        .collect()
}

// ============================================================================
// FIELD VALUES
// ============================================================================

/// A value that knows its own textual field form.
///
/// Scalars map to a single token; `Vec<T>` maps through the joiner.
pub trait FieldValue: Sized {
    fn to_field(&self, format: &LedgerFormat) -> Result<String>;
    fn from_field(field: &str, format: &LedgerFormat) -> std::result::Result<Self, String>;
}

impl FieldValue for String {
    fn to_field(&self, format: &LedgerFormat) -> Result<String> {
        // scalars are never value-split, only face-split
        if self.contains(format.face_separator) {
            return Err(LedgerError::ReservedSeparator {
                value: self.clone(),
                separator: format.face_separator,
            });
        }
        Ok(self.clone())
    }

    fn from_field(field: &str, _format: &LedgerFormat) -> std::result::Result<Self, String> {
        Ok(field.to_string())
    }
}

impl FieldValue for uuid::Uuid {
    fn to_field(&self, _format: &LedgerFormat) -> Result<String> {
        Ok(self.to_string())
    }

    fn from_field(field: &str, _format: &LedgerFormat) -> std::result::Result<Self, String> {
        uuid::Uuid::parse_str(field).map_err(|e| format!("invalid uuid {:?}: {}", field, e))
    }
}

impl FieldValue for f64 {
    fn to_field(&self, _format: &LedgerFormat) -> Result<String> {
        Ok(self.to_string())
    }

    fn from_field(field: &str, _format: &LedgerFormat) -> std::result::Result<Self, String> {
        field
            .parse::<f64>()
            .map_err(|e| format!("invalid number {:?}: {}", field, e))
    }
}

impl<T: ListItem> FieldValue for Vec<T> {
    fn to_field(&self, format: &LedgerFormat) -> Result<String> {
        let tokens: Vec<String> = self.iter().map(|v| v.token()).collect();
        join_values(&tokens, format)
    }

    fn from_field(field: &str, format: &LedgerFormat) -> std::result::Result<Self, String> {
        split_values(field, format)
            .iter()
            .map(|t| T::from_token(t))
            .collect()
    }
}

/// Element of a list-typed attribute.
pub trait ListItem: Sized {
    fn token(&self) -> String;
    fn from_token(token: &str) -> std::result::Result<Self, String>;
}

impl ListItem for String {
    fn token(&self) -> String {
        self.clone()
    }

    fn from_token(token: &str) -> std::result::Result<Self, String> {
        Ok(token.to_string())
    }
}
