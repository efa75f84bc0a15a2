// 🃏 Multi-Face Flattener - per-face attributes as one field
// A card has 1..N printed faces; most catalog attributes exist once per face.
//
// Absent, Single and PerFace are distinct states: "the catalog had nothing"
// must never round-trip as "the catalog had an empty value".

use crate::config::LedgerFormat;
use crate::error::{LedgerError, Result};
use crate::values::FieldValue;
use serde::{Deserialize, Serialize};

/// Attribute whose arity depends on the card's faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FaceValue<T> {
    /// Not provided by the catalog at all
    Absent,

    /// Provided once for the whole card
    Single(T),

    /// Provided once per face, in face order
    PerFace(Vec<T>),
}

impl<T> Default for FaceValue<T> {
    fn default() -> Self {
        FaceValue::Absent
    }
}

impl<T> FaceValue<T> {
    /// Normalize a list of per-face values. One face collapses to `Single`,
    /// which is how a single-face field reads back.
    pub fn from_faces(mut values: Vec<T>) -> Self {
        match values.len() {
            0 => FaceValue::Absent,
            1 => match values.pop() {
                Some(v) => FaceValue::Single(v),
                None => FaceValue::Absent,
            },
            _ => FaceValue::PerFace(values),
        }
    }

    /// Apply the catalog policy: a root-level value wins, otherwise one
    /// value per face (missing faces get `T::default()`), otherwise absent.
    pub fn from_source<F>(
        root: Option<T>,
        faces: Option<&[F]>,
        pick: impl Fn(&F) -> Option<T>,
    ) -> Self
    where
        T: Default,
    {
        if let Some(value) = root {
            return FaceValue::Single(value);
        }

        let faces = match faces {
            Some(faces) if !faces.is_empty() => faces,
            _ => return FaceValue::Absent,
        };

        let picked: Vec<Option<T>> = faces.iter().map(pick).collect();
        if picked.iter().all(Option::is_none) {
            return FaceValue::Absent;
        }
        FaceValue::from_faces(picked.into_iter().map(Option::unwrap_or_default).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FaceValue::Absent)
    }

    /// Number of stored values (0 for absent).
    pub fn arity(&self) -> usize {
        match self {
            FaceValue::Absent => 0,
            FaceValue::Single(_) => 1,
            FaceValue::PerFace(values) => values.len(),
        }
    }

    /// Value for face `index`; a `Single` value applies to every face.
    pub fn face(&self, index: usize) -> Option<&T> {
        match self {
            FaceValue::Absent => None,
            FaceValue::Single(v) => Some(v),
            FaceValue::PerFace(values) => values.get(index),
        }
    }

    /// A per-face attribute must carry exactly one value per face, and a
    /// single face is always `Single`.
    pub fn check_arity(&self, attribute: &'static str, face_count: usize) -> Result<()> {
        if let FaceValue::PerFace(values) = self {
            if values.len() < 2 || values.len() != face_count {
                return Err(LedgerError::FaceCountMismatch {
                    attribute,
                    expected: face_count.max(2),
                    found: values.len(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// FLATTENING
// ============================================================================

/// Join face-level fields with the face separator.
///
/// Face fields may contain the value separator (nested lists) but never the
/// face separator itself.
pub fn flatten_faces<S: AsRef<str>>(faces: &[S], format: &LedgerFormat) -> Result<String> {
    let mut out = String::new();
    for (i, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.contains(format.face_separator) {
            return Err(LedgerError::ReservedSeparator {
                value: face.to_string(),
                separator: format.face_separator,
            });
        }
        if i > 0 {
            out.push(format.face_separator);
        }
        out.push_str(face);
    }
    Ok(out)
}

/// Inverse of `flatten_faces`.
pub fn unflatten_faces(field: &str, format: &LedgerFormat) -> Vec<String> {
    field
        .split(format.face_separator)
        .map(str::to_string)
        .collect()
}

impl<T: FieldValue> FaceValue<T> {
    pub fn to_field(&self, format: &LedgerFormat) -> Result<String> {
        match self {
            FaceValue::Absent => Ok(format.null_marker.clone()),
            FaceValue::Single(value) => value.to_field(format),
            // would read back as `Single`
            FaceValue::PerFace(values) if values.len() < 2 => Err(LedgerError::FaceCountMismatch {
                attribute: "per-face value",
                expected: 2,
                found: values.len(),
            }),
            FaceValue::PerFace(values) => {
                let faces = values
                    .iter()
                    .map(|v| v.to_field(format))
                    .collect::<Result<Vec<_>>>()?;
                flatten_faces(&faces, format)
            }
        }
    }

    pub fn from_field(field: &str, format: &LedgerFormat) -> std::result::Result<Self, String> {
        if field == format.null_marker {
            return Ok(FaceValue::Absent);
        }

        if field.contains(format.face_separator) {
            let faces = unflatten_faces(field, format)
                .iter()
                .map(|f| T::from_field(f, format))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            return Ok(FaceValue::PerFace(faces));
        }

        T::from_field(field, format).map(FaceValue::Single)
    }
}

/// `Option` attributes share the null marker with `FaceValue::Absent`.
pub fn optional_to_field<T: FieldValue>(value: &Option<T>, format: &LedgerFormat) -> Result<String> {
    match value {
        Some(v) => v.to_field(format),
        None => Ok(format.null_marker.clone()),
    }
}

pub fn optional_from_field<T: FieldValue>(
    field: &str,
    format: &LedgerFormat,
) -> std::result::Result<Option<T>, String> {
    if field == format.null_marker {
        return Ok(None);
    }
    T::from_field(field, format).map(Some)
}
