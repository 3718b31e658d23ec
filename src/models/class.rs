//! Test class models
//!
//! A test class is described explicitly: its candidate methods, the scopes
//! parameter providers are looked up in, and its named pull-function fields.

use std::fmt;
use std::sync::Arc;

use super::method::MethodDecl;
use super::params::{ParameterTuple, ProviderOutput};

/// Zero-argument callable behind a provider or named method.
pub type ProviderFn = Arc<dyn Fn() -> anyhow::Result<ProviderOutput> + Send + Sync>;

/// Factory for a fresh lazy tuple sequence.
pub type PullFactory =
    Arc<dyn Fn() -> Box<dyn Iterator<Item = ParameterTuple> + Send> + Send + Sync>;

/// A zero-argument method on a provider type.
#[derive(Clone)]
pub struct ProviderMethod {
    pub name: String,
    pub is_static: bool,
    pub call: ProviderFn,
}

impl fmt::Debug for ProviderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderMethod")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// A type that can supply parameter tuples.
///
/// The parent link forms the inheritance chain walked for `provide*`
/// methods and named-method lookups.
#[derive(Clone, Debug)]
pub struct ProviderType {
    name: String,
    parent: Option<Arc<ProviderType>>,
    methods: Vec<ProviderMethod>,
}

impl ProviderType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: Arc<ProviderType>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn static_method<F>(self, name: impl Into<String>, call: F) -> Self
    where
        F: Fn() -> anyhow::Result<ProviderOutput> + Send + Sync + 'static,
    {
        self.method(name, true, call)
    }

    pub fn instance_method<F>(self, name: impl Into<String>, call: F) -> Self
    where
        F: Fn() -> anyhow::Result<ProviderOutput> + Send + Sync + 'static,
    {
        self.method(name, false, call)
    }

    fn method<F>(mut self, name: impl Into<String>, is_static: bool, call: F) -> Self
    where
        F: Fn() -> anyhow::Result<ProviderOutput> + Send + Sync + 'static,
    {
        self.methods.push(ProviderMethod {
            name: name.into(),
            is_static,
            call: Arc::new(call),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ProviderType>> {
        self.parent.as_ref()
    }

    /// Methods declared directly on this type, in declaration order.
    pub fn methods(&self) -> &[ProviderMethod] {
        &self.methods
    }

    /// This type followed by its ancestors, nearest first.
    pub fn lineage(&self) -> Vec<&ProviderType> {
        let mut chain = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(ty) = current {
            chain.push(ty);
            current = ty.parent.as_deref();
        }
        chain
    }
}

/// A named pull-function field.
#[derive(Clone)]
pub struct LambdaField {
    pub name: String,
    pub factory: PullFactory,
}

impl LambdaField {
    /// Field backed by an iterator factory.
    pub fn new<F, I>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = ParameterTuple> + Send + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || -> Box<dyn Iterator<Item = ParameterTuple> + Send> {
                Box::new(factory())
            }),
        }
    }

    /// Field backed by a pull function: each resolution gets a fresh puller
    /// that yields tuples until it returns `None`.
    pub fn pull<F, P>(name: impl Into<String>, make_puller: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: FnMut() -> Option<ParameterTuple> + Send + 'static,
    {
        Self::new(name, move || std::iter::from_fn(make_puller()))
    }
}

impl fmt::Debug for LambdaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaField")
            .field("name", &self.name)
            .finish()
    }
}

/// Explicit description of a test class.
pub struct TestClass {
    name: String,
    parallel: Option<bool>,
    scope: Arc<ProviderType>,
    fields: Vec<LambdaField>,
    methods: Vec<MethodDecl>,
}

impl TestClass {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            scope: Arc::new(ProviderType::new(name.clone())),
            name,
            parallel: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// `ParallelExecution` marker.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = Some(enabled);
        self
    }

    /// The class's own helper methods, searched by named-method lookups
    /// that declare no source types.
    pub fn scope(mut self, scope: ProviderType) -> Self {
        self.scope = Arc::new(scope);
        self
    }

    pub fn field(mut self, field: LambdaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parallel_marker(&self) -> Option<bool> {
        self.parallel
    }

    pub fn class_scope(&self) -> &Arc<ProviderType> {
        &self.scope
    }

    pub fn lambda_field(&self, name: &str) -> Option<&LambdaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Candidate methods in discovery order.
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }
}

impl fmt::Debug for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClass")
            .field("name", &self.name)
            .field("parallel", &self.parallel)
            .field("methods", &self.methods.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple;

    #[test]
    fn test_lineage_nearest_first() {
        let root = Arc::new(ProviderType::new("Base"));
        let mid = Arc::new(ProviderType::new("Mid").extends(root));
        let leaf = ProviderType::new("Leaf").extends(mid);

        let names: Vec<_> = leaf.lineage().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Leaf", "Mid", "Base"]);
    }

    #[test]
    fn test_pull_field_is_fresh_per_call() {
        let field = LambdaField::pull("numbers", || {
            let mut n = 0;
            move || {
                n += 1;
                (n <= 2).then(|| tuple![n])
            }
        });

        assert_eq!((field.factory)().count(), 2);
        assert_eq!((field.factory)().count(), 2);
    }

    #[test]
    fn test_class_lookup_field() {
        let class = TestClass::new("Suite")
            .parallel(true)
            .field(LambdaField::new("empty", std::iter::empty::<ParameterTuple>));

        assert_eq!(class.parallel_marker(), Some(true));
        assert!(class.lambda_field("empty").is_some());
        assert!(class.lambda_field("missing").is_none());
        assert_eq!(class.class_scope().name(), "Suite");
    }
}
