use serde::{Deserialize, Serialize};

use crate::database::collections;
use crate::database::store::{Document, Value};
use crate::error::AppError;

/// An ordered value list for UI pickers (offices, positions, signatories).
/// The category doubles as the document id; values are unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryList {
    pub category: String,
    pub entries: Vec<String>,
}

impl LibraryList {
    pub fn to_document(&self) -> Document {
        Document::new(self.category.clone())
            .with("category", self.category.as_str())
            .with(
                "entries",
                Value::Array(
                    self.entries
                        .iter()
                        .map(|entry| Value::Str(entry.clone()))
                        .collect(),
                ),
            )
    }

    pub fn from_document(doc: &Document) -> Result<LibraryList, AppError> {
        const C: &str = collections::LIBRARIES;
        let entries = match doc.get("entries") {
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| match value {
                    Value::Str(s) => Ok(s.clone()),
                    _ => Err(AppError::schema_drift(
                        C,
                        &doc.id,
                        "entries holds a non-string value",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(AppError::schema_drift(C, &doc.id, "entries is not an array"))
            }
            None => Vec::new(),
        };
        Ok(LibraryList {
            category: doc.str(C, "category")?,
            entries,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryUpdateInput {
    pub entries: Vec<String>,
}
