//! Parameter source lookup table
//!
//! Built once per method when the plan is constructed: every type hierarchy
//! walk, static check and name lookup happens here. Resolution only walks
//! the resulting ordered binding list.

use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::file::{DataMapper, Locator};
use crate::error::ConfigurationError;
use crate::models::{
    MethodId, ParameterSource, ParameterSpec, ParameterTuple, ProviderFn, ProviderType,
    PullFactory, TestClass,
};

/// Name prefix of provider methods collected from source types.
pub const PROVIDER_PREFIX: &str = "provide";

/// Prefix of the derived default named-method name.
pub const DEFAULT_METHOD_PREFIX: &str = "parametersFor";

/// Merge stage, in the order stages contribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Inline,
    File,
    Class,
    Named,
    Lambda,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Inline,
        Stage::File,
        Stage::Class,
        Stage::Named,
        Stage::Lambda,
    ];

    fn accepts(&self, source: &ParameterSource) -> bool {
        matches!(
            (self, source),
            (Stage::Inline, ParameterSource::Inline { .. })
                | (Stage::File, ParameterSource::FileSource { .. })
                | (Stage::Class, ParameterSource::ClassSource { .. })
                | (Stage::Named, ParameterSource::NamedMethod { .. })
                | (Stage::Lambda, ParameterSource::LambdaSource { .. })
        )
    }
}

/// One callable entry of the table.
#[derive(Clone)]
pub enum Binding {
    Inline(ParameterTuple),
    File {
        locator: String,
        target: Locator,
        mapper: Arc<dyn DataMapper>,
    },
    Provider {
        stage: Stage,
        declaring_type: String,
        method: String,
        call: ProviderFn,
    },
    Pull {
        field: String,
        factory: PullFactory,
    },
}

impl Binding {
    pub fn stage(&self) -> Stage {
        match self {
            Binding::Inline(_) => Stage::Inline,
            Binding::File { .. } => Stage::File,
            Binding::Provider { stage, .. } => *stage,
            Binding::Pull { .. } => Stage::Lambda,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Inline(tuple) => write!(f, "Inline{tuple}"),
            Binding::File { locator, .. } => write!(f, "File({locator})"),
            Binding::Provider {
                stage,
                declaring_type,
                method,
                ..
            } => write!(f, "{stage:?}({declaring_type}::{method})"),
            Binding::Pull { field, .. } => write!(f, "Pull({field})"),
        }
    }
}

/// Ordered, pre-bound parameter sources of one test method.
#[derive(Clone, Debug)]
pub struct LookupTable {
    method: MethodId,
    bindings: Vec<Binding>,
}

impl LookupTable {
    /// Bind every source of `spec` for `method` declared on `class`.
    pub fn build(
        spec: &ParameterSpec,
        class: &TestClass,
        method: &MethodId,
    ) -> Result<Self, ConfigurationError> {
        let mut bindings = Vec::new();

        for stage in Stage::ALL {
            for source in spec.sources.iter().filter(|s| stage.accepts(s)) {
                bind_source(source, class, method, &mut bindings)?;
            }
        }

        Ok(Self {
            method: method.clone(),
            bindings,
        })
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

fn bind_source(
    source: &ParameterSource,
    class: &TestClass,
    method: &MethodId,
    bindings: &mut Vec<Binding>,
) -> Result<(), ConfigurationError> {
    match source {
        ParameterSource::Inline { values } => {
            bindings.push(Binding::Inline(ParameterTuple::from_strings(
                values.iter().cloned(),
            )));
        }
        ParameterSource::FileSource { locator, mapper } => {
            bindings.push(Binding::File {
                locator: locator.clone(),
                target: Locator::parse(locator)?,
                mapper: mapper.clone(),
            });
        }
        ParameterSource::ClassSource { provider_classes } => {
            for provider in provider_classes {
                bind_providers(provider, bindings)?;
            }
        }
        ParameterSource::NamedMethod {
            method_names,
            search_scopes,
        } => {
            let names = if method_names.is_empty() {
                vec![default_method_name(&method.name)]
            } else {
                method_names.clone()
            };
            for name in &names {
                for scope in search_scopes {
                    bind_named(name, scope, bindings);
                }
            }
        }
        ParameterSource::LambdaSource { field_name } => {
            let field =
                class
                    .lambda_field(field_name)
                    .ok_or_else(|| ConfigurationError::MissingLambdaField {
                        class: class.name().to_string(),
                        field: field_name.clone(),
                    })?;
            bindings.push(Binding::Pull {
                field: field.name.clone(),
                factory: field.factory.clone(),
            });
        }
    }
    Ok(())
}

/// Collect every `provide*` method of a type and its ancestors.
fn bind_providers(
    provider: &ProviderType,
    bindings: &mut Vec<Binding>,
) -> Result<(), ConfigurationError> {
    let before = bindings.len();

    for level in provider.lineage() {
        for m in level
            .methods()
            .iter()
            .filter(|m| m.name.starts_with(PROVIDER_PREFIX))
        {
            if !m.is_static {
                return Err(ConfigurationError::NonStaticProvider {
                    method: m.name.clone(),
                    declaring_type: level.name().to_string(),
                });
            }
            bindings.push(Binding::Provider {
                stage: Stage::Class,
                declaring_type: level.name().to_string(),
                method: m.name.clone(),
                call: m.call.clone(),
            });
        }
    }

    if bindings.len() == before {
        trace!(
            "No {}* method could be found in {} or its ancestors",
            PROVIDER_PREFIX,
            provider.name()
        );
    }
    Ok(())
}

/// Bind the nearest method called `name` in `scope`'s hierarchy.
fn bind_named(name: &str, scope: &ProviderType, bindings: &mut Vec<Binding>) {
    let found = scope.lineage().into_iter().find_map(|level| {
        level
            .methods()
            .iter()
            .find(|m| m.name == name)
            .map(|m| (level.name().to_string(), m))
    });

    match found {
        Some((declaring_type, m)) => bindings.push(Binding::Provider {
            stage: Stage::Named,
            declaring_type,
            method: m.name.clone(),
            call: m.call.clone(),
        }),
        None => trace!("No method {} could be found in {}", name, scope.name()),
    }
}

/// `parametersFor` followed by the test name with its first letter
/// capitalized.
pub fn default_method_name(test_name: &str) -> String {
    let mut chars = test_name.chars();
    match chars.next() {
        Some(first) => format!(
            "{DEFAULT_METHOD_PREFIX}{}{}",
            first.to_uppercase(),
            chars.as_str()
        ),
        None => DEFAULT_METHOD_PREFIX.to_string(),
    }
}
