//! Test classification
//!
//! Partitions a class's candidate methods into at most one first method, at
//! most one last method and the normal rest, binding each method's parameter
//! sources along the way.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ConfigurationError;
use crate::models::{MethodDecl, MethodId, ParameterSpec, Role, TestClass, TestMethod};
use crate::params::LookupTable;

/// Prunes candidate methods before a plan is built.
pub type Filter = Arc<dyn Fn(&MethodDecl) -> bool + Send + Sync>;

/// Orders normal methods; ties keep discovery order.
pub type Sorter = Arc<dyn Fn(&TestMethod, &TestMethod) -> Ordering + Send + Sync>;

/// Keep methods whose name contains `keyword`.
pub fn name_filter(keyword: impl Into<String>) -> Filter {
    let keyword = keyword.into();
    Arc::new(move |decl: &MethodDecl| decl.name.contains(&keyword))
}

/// Order normal methods by name.
pub fn alphabetical() -> Sorter {
    Arc::new(|a: &TestMethod, b: &TestMethod| a.id.name.cmp(&b.id.name))
}

/// Immutable partition of one class, consumed by a single run.
pub struct SchedulingPlan {
    pub class: String,
    pub first: Option<Arc<TestMethod>>,
    pub normal: Vec<Arc<TestMethod>>,
    pub last: Option<Arc<TestMethod>>,
    pub parallel: bool,
}

impl SchedulingPlan {
    pub fn method_count(&self) -> usize {
        self.normal.len() + usize::from(self.first.is_some()) + usize::from(self.last.is_some())
    }
}

impl fmt::Debug for SchedulingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulingPlan")
            .field("class", &self.class)
            .field("first", &self.first.as_ref().map(|m| &m.id.name))
            .field(
                "normal",
                &self.normal.iter().map(|m| &m.id.name).collect::<Vec<_>>(),
            )
            .field("last", &self.last.as_ref().map(|m| &m.id.name))
            .field("parallel", &self.parallel)
            .finish()
    }
}

/// Builds scheduling plans.
#[derive(Clone, Default)]
pub struct Classifier {
    filter: Option<Filter>,
    sorter: Option<Sorter>,
    parallel_default: bool,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sorter(mut self, sorter: Sorter) -> Self {
        self.sorter = Some(sorter);
        self
    }

    /// Parallelism for classes without a `ParallelExecution` marker.
    pub fn with_parallel_default(mut self, parallel: bool) -> Self {
        self.parallel_default = parallel;
        self
    }

    /// Build the plan for `class`.
    ///
    /// Marker validation covers every declared method, so a malformed class
    /// is rejected before anything runs, whatever the filter keeps.
    pub fn classify(&self, class: &TestClass) -> Result<SchedulingPlan, ConfigurationError> {
        validate_markers(class)?;

        let candidates: Vec<&MethodDecl> = class
            .methods()
            .iter()
            .filter(|decl| self.filter.as_ref().map_or(true, |keep| keep(decl)))
            .collect();

        if candidates.is_empty() {
            return Err(ConfigurationError::NoTestsRemain {
                class: class.name().to_string(),
            });
        }

        let mut first = None;
        let mut last = None;
        let mut normal = Vec::new();

        for decl in candidates {
            let method = Arc::new(bind_method(decl, class));
            match method.role {
                Role::First => first = Some(method),
                Role::Last => last = Some(method),
                Role::Normal => normal.push(method),
            }
        }

        if let Some(sorter) = &self.sorter {
            normal.sort_by(|a, b| sorter(a, b));
        }

        let plan = SchedulingPlan {
            class: class.name().to_string(),
            first,
            normal,
            last,
            parallel: class.parallel_marker().unwrap_or(self.parallel_default),
        };
        debug!("Built plan {:?}", plan);
        Ok(plan)
    }
}

/// Classify with no filter, no sorter and sequential default.
pub fn classify(class: &TestClass) -> Result<SchedulingPlan, ConfigurationError> {
    Classifier::new().classify(class)
}

fn validate_markers(class: &TestClass) -> Result<(), ConfigurationError> {
    if let Some(both) = class.methods().iter().find(|m| m.first && m.last) {
        return Err(ConfigurationError::FirstAndLast {
            method: MethodId::new(class.name(), &both.name).to_string(),
        });
    }

    let marked = |pick: fn(&MethodDecl) -> bool| -> Vec<String> {
        class
            .methods()
            .iter()
            .filter(|m| pick(m))
            .map(|m| m.name.clone())
            .collect()
    };

    let firsts = marked(|m| m.first);
    if firsts.len() > 1 {
        return Err(ConfigurationError::MultipleFirst {
            class: class.name().to_string(),
            methods: firsts,
        });
    }

    let lasts = marked(|m| m.last);
    if lasts.len() > 1 {
        return Err(ConfigurationError::MultipleLast {
            class: class.name().to_string(),
            methods: lasts,
        });
    }

    Ok(())
}

fn bind_method(decl: &MethodDecl, class: &TestClass) -> TestMethod {
    let id = MethodId::new(class.name(), &decl.name);
    let role = if decl.first {
        Role::First
    } else if decl.last {
        Role::Last
    } else {
        Role::Normal
    };

    let parameters = ParameterSpec::from_declarations(
        &decl.records,
        decl.file.as_ref(),
        &decl.csv_rows,
        class.class_scope(),
    )
    .map(|spec| {
        LookupTable::build(&spec, class, &id).inspect_err(|e| {
            warn!("Parameter sources of {} cannot be bound: {}", id, e);
        })
    });

    TestMethod {
        id,
        role,
        params: decl.params.clone(),
        ignored: decl.ignored,
        body: decl.body.clone(),
        parameters,
    }
}
