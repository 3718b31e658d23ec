//! Provider return-value normalization
//!
//! Every recognised provider shape converges on one ordered list of tuples.

use serde_json::Value;

use crate::error::ConfigurationError;
use crate::models::{ParameterTuple, ProviderOutput};

/// Normalize a provider's return value.
///
/// `method` and `declaring_type` only name the offender when the shape is
/// not recognised.
pub fn normalize(
    output: ProviderOutput,
    method: &str,
    declaring_type: &str,
) -> Result<Vec<ParameterTuple>, ConfigurationError> {
    match output {
        ProviderOutput::Array(rows) => Ok(rows.into_iter().map(ParameterTuple::new).collect()),
        ProviderOutput::Tuples(tuples) => Ok(tuples.collect()),
        ProviderOutput::Scalars(values) => Ok(values.map(ParameterTuple::single).collect()),
        ProviderOutput::Dynamic(document) => {
            normalize_document(document).ok_or_else(|| ConfigurationError::UnrecognizedShape {
                method: method.to_string(),
                declaring_type: declaring_type.to_string(),
            })
        }
    }
}

/// Interpret a JSON document as tuples.
///
/// An array whose elements are all arrays is an array of tuples; an array
/// with no array elements is a sequence of scalars. Anything else, including
/// a mix of the two, is not a recognised shape.
pub fn normalize_document(document: Value) -> Option<Vec<ParameterTuple>> {
    let Value::Array(items) = document else {
        return None;
    };

    let nested = items.iter().filter(|item| item.is_array()).count();
    if nested == items.len() {
        Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Array(values) => Some(ParameterTuple::new(values)),
                    _ => None,
                })
                .collect(),
        )
    } else if nested == 0 {
        Some(items.into_iter().map(ParameterTuple::single).collect())
    } else {
        None
    }
}
