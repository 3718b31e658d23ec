//! Data models for test execution
//!
//! Test classes and methods, parameter descriptors and tuples, and the
//! results a run produces.

mod class;
mod method;
mod outcome;
mod params;

pub use class::{LambdaField, ProviderFn, ProviderMethod, ProviderType, PullFactory, TestClass};
pub use method::{
    Arguments, AsyncBody, BlockingBody, MethodDecl, MethodId, ParamKind, Role, TestBody,
    TestMethod,
};
pub use outcome::{RunSummary, UnitDescription, UnitResult, UnitStatus};
pub use params::{
    FileParameters, ParameterRecord, ParameterSource, ParameterSpec, ParameterTuple,
    ProviderOutput,
};
