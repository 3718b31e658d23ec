//! Test method models
//!
//! `MethodDecl` is a discovered candidate with its markers; classification
//! turns it into an immutable `TestMethod` with a role.

use anyhow::Context;
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::params::{FileParameters, ParameterRecord};
use crate::error::ConfigurationError;
use crate::params::LookupTable;

pub type AsyncBody = Arc<dyn Fn(Arguments) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
pub type BlockingBody = Arc<dyn Fn(Arguments) -> anyhow::Result<()> + Send + Sync>;

/// The code under a test method.
#[derive(Clone)]
pub enum TestBody {
    /// Runs as a task on the async runtime.
    Async(AsyncBody),
    /// Runs on the blocking thread pool.
    Blocking(BlockingBody),
}

impl TestBody {
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        TestBody::Async(Arc::new(move |args| f(args).boxed()))
    }

    pub fn from_blocking<F>(f: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        TestBody::Blocking(Arc::new(f))
    }
}

impl fmt::Debug for TestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestBody::Async(_) => f.write_str("TestBody::Async"),
            TestBody::Blocking(_) => f.write_str("TestBody::Blocking"),
        }
    }
}

/// Declared type of one test method parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Any,
    Str,
    Int,
    Float,
    Bool,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Any => "any",
            ParamKind::Str => "string",
            ParamKind::Int => "integer",
            ParamKind::Float => "float",
            ParamKind::Bool => "boolean",
        }
    }

    /// Convert a value to this kind, parsing string literals where needed.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (ParamKind::Any, v) => Some(v),
            (ParamKind::Str, Value::String(s)) => Some(Value::String(s)),
            (ParamKind::Str, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamKind::Str, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ParamKind::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(Value::Number(n))
            }
            (ParamKind::Int, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(|i| Value::Number(i.into()))
            }
            (ParamKind::Float, Value::Number(n)) => Some(Value::Number(n)),
            (ParamKind::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (ParamKind::Bool, Value::Bool(b)) => Some(Value::Bool(b)),
            (ParamKind::Bool, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Positionally bound argument values handed to a test body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
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

    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserialize the argument at `index`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        let value = self
            .0
            .get(index)
            .cloned()
            .with_context(|| format!("no argument at position {index}"))?;
        serde_json::from_value(value)
            .with_context(|| format!("argument {index} has an unexpected type"))
    }
}

/// Scheduling role assigned during classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    First,
    Normal,
    Last,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::First => write!(f, "first"),
            Role::Normal => write!(f, "normal"),
            Role::Last => write!(f, "last"),
        }
    }
}

/// Declaring class plus method name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId {
    pub class: String,
    pub name: String,
}

impl MethodId {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class, self.name)
    }
}

/// A discovered candidate test method and its declarative markers.
#[derive(Clone)]
pub struct MethodDecl {
    pub name: String,
    pub first: bool,
    pub last: bool,
    pub ignored: bool,
    pub params: Vec<ParamKind>,
    pub records: Vec<ParameterRecord>,
    pub file: Option<FileParameters>,
    pub csv_rows: Vec<String>,
    pub body: TestBody,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, body: TestBody) -> Self {
        Self {
            name: name.into(),
            first: false,
            last: false,
            ignored: false,
            params: Vec::new(),
            records: Vec::new(),
            file: None,
            csv_rows: Vec::new(),
            body,
        }
    }

    /// Candidate with an async body.
    pub fn test<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(name, TestBody::from_async(f))
    }

    /// Candidate with a blocking body.
    pub fn blocking<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(name, TestBody::from_blocking(f))
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    pub fn last(mut self) -> Self {
        self.last = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn params<I: IntoIterator<Item = ParamKind>>(mut self, kinds: I) -> Self {
        self.params = kinds.into_iter().collect();
        self
    }

    /// Declare `n` untyped parameters.
    pub fn arity(self, n: usize) -> Self {
        self.params(std::iter::repeat(ParamKind::Any).take(n))
    }

    pub fn record(mut self, record: ParameterRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn file(mut self, file: FileParameters) -> Self {
        self.file = Some(file);
        self
    }

    /// Comma-separated inline rows, one tuple per row.
    pub fn rows<I, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.csv_rows.extend(rows.into_iter().map(Into::into));
        self
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("first", &self.first)
            .field("last", &self.last)
            .field("ignored", &self.ignored)
            .field("params", &self.params)
            .finish()
    }
}

/// A classified test method. Immutable once built.
pub struct TestMethod {
    pub id: MethodId,
    pub role: Role,
    pub params: Vec<ParamKind>,
    pub ignored: bool,
    pub body: TestBody,
    /// Bound parameter sources; `None` when the method takes no declared
    /// parameters. A binding error is kept here and reported when the
    /// method is scheduled.
    pub parameters: Option<Result<LookupTable, ConfigurationError>>,
}

impl TestMethod {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_parameterized(&self) -> bool {
        self.parameters.is_some()
    }
}

impl fmt::Debug for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("params", &self.params)
            .field("ignored", &self.ignored)
            .field("parameterized", &self.is_parameterized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_strings() {
        assert_eq!(ParamKind::Int.coerce(json!("1")), Some(json!(1)));
        assert_eq!(ParamKind::Bool.coerce(json!("TRUE")), Some(json!(true)));
        assert_eq!(ParamKind::Float.coerce(json!("2.5")), Some(json!(2.5)));
        assert_eq!(ParamKind::Str.coerce(json!(7)), Some(json!("7")));
        assert_eq!(ParamKind::Int.coerce(json!("seven")), None);
        assert_eq!(ParamKind::Bool.coerce(json!(1)), None);
    }

    #[test]
    fn test_coerce_any_is_identity() {
        let value = json!({"k": [1, 2]});
        assert_eq!(ParamKind::Any.coerce(value.clone()), Some(value));
    }

    #[test]
    fn test_arguments_get() {
        let args = Arguments::new(vec![json!(3), json!("Hi"), json!(false)]);
        assert_eq!(args.get::<i64>(0).unwrap(), 3);
        assert_eq!(args.get::<String>(1).unwrap(), "Hi");
        assert!(!args.get::<bool>(2).unwrap());
        assert!(args.get::<i64>(1).is_err());
        assert!(args.get::<i64>(5).is_err());
    }

    #[test]
    fn test_method_id_display() {
        assert_eq!(MethodId::new("Suite", "check").to_string(), "Suite#check");
    }

    #[test]
    fn test_decl_builder() {
        let decl = MethodDecl::blocking("check", |_| Ok(()))
            .first()
            .arity(2)
            .rows(["1, 2"]);
        assert!(decl.first);
        assert!(!decl.last);
        assert_eq!(decl.params, vec![ParamKind::Any, ParamKind::Any]);
        assert_eq!(decl.csv_rows.len(), 1);
    }
}
