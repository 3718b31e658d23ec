//! Parameter models
//!
//! Tuples, provider return shapes, and the declarative descriptors a test
//! method uses to say where its tuples come from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::class::ProviderType;
use crate::params::DataMapper;

/// Build a [`ParameterTuple`] from JSON-convertible expressions.
///
/// ```
/// use lambda_testkit::tuple;
///
/// let t = tuple![1, "Hello", true];
/// assert_eq!(t.len(), 3);
/// ```
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::models::ParameterTuple::new(::std::vec::Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::models::ParameterTuple::new(vec![$($crate::__serde_json::json!($value)),+])
    };
}

/// One ordered set of argument values for a single invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTuple(Vec<Value>);

impl ParameterTuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Wrap a bare scalar as a 1-tuple.
    pub fn single(value: Value) -> Self {
        Self(vec![value])
    }

    /// Tuple of string literals, as written in inline declarations.
    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            values
                .into_iter()
                .map(|s| Value::String(s.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for ParameterTuple {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for ParameterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{s}")?,
                other => write!(f, "{other}")?,
            }
        }
        write!(f, ")")
    }
}

/// What a provider or named method hands back.
///
/// Three recognised shapes plus a dynamically typed document whose shape is
/// only known once it is inspected.
pub enum ProviderOutput {
    /// Array of tuples.
    Array(Vec<Vec<Value>>),
    /// Sequence of tuples.
    Tuples(Box<dyn Iterator<Item = ParameterTuple> + Send>),
    /// Sequence of bare scalars, one parameter each.
    Scalars(Box<dyn Iterator<Item = Value> + Send>),
    /// A JSON document: an array of arrays or an array of scalars.
    Dynamic(Value),
}

impl ProviderOutput {
    pub fn array(rows: Vec<Vec<Value>>) -> Self {
        ProviderOutput::Array(rows)
    }

    pub fn tuples<I>(tuples: I) -> Self
    where
        I: IntoIterator<Item = ParameterTuple>,
        I::IntoIter: Send + 'static,
    {
        ProviderOutput::Tuples(Box::new(tuples.into_iter()))
    }

    pub fn scalars<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        ProviderOutput::Scalars(Box::new(values.into_iter()))
    }

    pub fn dynamic(value: Value) -> Self {
        ProviderOutput::Dynamic(value)
    }
}

impl fmt::Debug for ProviderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOutput::Array(rows) => f.debug_tuple("Array").field(rows).finish(),
            ProviderOutput::Tuples(_) => f.write_str("Tuples(..)"),
            ProviderOutput::Scalars(_) => f.write_str("Scalars(..)"),
            ProviderOutput::Dynamic(value) => f.debug_tuple("Dynamic").field(value).finish(),
        }
    }
}

/// A repeatable parameter declaration on a test method.
///
/// Any subset of the fields may be populated; all populated fields
/// contribute.
#[derive(Clone, Default)]
pub struct ParameterRecord {
    pub values: Vec<String>,
    pub source_types: Vec<Arc<ProviderType>>,
    pub method_name: Option<String>,
    pub lambda_field_name: Option<String>,
}

impl ParameterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record holding one literal tuple.
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn source(mut self, provider: Arc<ProviderType>) -> Self {
        self.source_types.push(provider);
        self
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    pub fn lambda_field(mut self, name: impl Into<String>) -> Self {
        self.lambda_field_name = Some(name.into());
        self
    }

}

/// File-backed parameters: a locator with an optional protocol prefix and
/// the mapper that turns the raw content into tuples.
#[derive(Clone)]
pub struct FileParameters {
    pub locator: String,
    pub mapper: Arc<dyn DataMapper>,
}

impl FileParameters {
    pub fn new(locator: impl Into<String>, mapper: impl DataMapper + 'static) -> Self {
        Self {
            locator: locator.into(),
            mapper: Arc::new(mapper),
        }
    }
}

/// One parameter source descriptor.
#[derive(Clone)]
pub enum ParameterSource {
    Inline {
        values: Vec<String>,
    },
    FileSource {
        locator: String,
        mapper: Arc<dyn DataMapper>,
    },
    ClassSource {
        provider_classes: Vec<Arc<ProviderType>>,
    },
    NamedMethod {
        /// Empty means the derived default name.
        method_names: Vec<String>,
        search_scopes: Vec<Arc<ProviderType>>,
    },
    LambdaSource {
        field_name: String,
    },
}

impl ParameterSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterSource::Inline { .. } => "inline",
            ParameterSource::FileSource { .. } => "file",
            ParameterSource::ClassSource { .. } => "class",
            ParameterSource::NamedMethod { .. } => "named-method",
            ParameterSource::LambdaSource { .. } => "lambda",
        }
    }
}

impl fmt::Debug for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSource::Inline { values } => {
                f.debug_struct("Inline").field("values", values).finish()
            }
            ParameterSource::FileSource { locator, .. } => {
                f.debug_struct("FileSource").field("locator", locator).finish()
            }
            ParameterSource::ClassSource { provider_classes } => f
                .debug_struct("ClassSource")
                .field(
                    "provider_classes",
                    &provider_classes.iter().map(|p| p.name()).collect::<Vec<_>>(),
                )
                .finish(),
            ParameterSource::NamedMethod {
                method_names,
                search_scopes,
            } => f
                .debug_struct("NamedMethod")
                .field("method_names", method_names)
                .field(
                    "search_scopes",
                    &search_scopes.iter().map(|p| p.name()).collect::<Vec<_>>(),
                )
                .finish(),
            ParameterSource::LambdaSource { field_name } => f
                .debug_struct("LambdaSource")
                .field("field_name", field_name)
                .finish(),
        }
    }
}

/// All parameter sources attached to one test method, built once from its
/// declarations.
#[derive(Clone, Debug, Default)]
pub struct ParameterSpec {
    pub sources: Vec<ParameterSource>,
}

impl ParameterSpec {
    /// Build the spec from a method's declarations.
    ///
    /// Returns `None` when the method declares no parameters at all.
    pub fn from_declarations(
        records: &[ParameterRecord],
        file: Option<&FileParameters>,
        csv_rows: &[String],
        class_scope: &Arc<ProviderType>,
    ) -> Option<Self> {
        if records.is_empty() && file.is_none() && csv_rows.is_empty() {
            return None;
        }

        let mut sources = Vec::new();

        for row in csv_rows {
            let values: Vec<String> = row.split(',').map(|v| v.trim().to_string()).collect();
            sources.push(ParameterSource::Inline { values });
        }
        for record in records {
            if !record.values.is_empty() {
                sources.push(ParameterSource::Inline {
                    values: record.values.clone(),
                });
            }
        }

        if let Some(file) = file {
            sources.push(ParameterSource::FileSource {
                locator: file.locator.clone(),
                mapper: file.mapper.clone(),
            });
        }

        for record in records {
            if !record.source_types.is_empty() {
                sources.push(ParameterSource::ClassSource {
                    provider_classes: record.source_types.clone(),
                });
            }
        }

        for record in records {
            let scopes = if record.source_types.is_empty() {
                vec![class_scope.clone()]
            } else {
                record.source_types.clone()
            };
            // an empty name list searches the derived default name
            let method_names = record
                .method_name
                .as_deref()
                .map(|names| {
                    names
                        .split(',')
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(String::from)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            sources.push(ParameterSource::NamedMethod {
                method_names,
                search_scopes: scopes,
            });
        }

        for record in records {
            if let Some(field_name) = &record.lambda_field_name {
                sources.push(ParameterSource::LambdaSource {
                    field_name: field_name.clone(),
                });
            }
        }

        Some(Self { sources })
    }
}
