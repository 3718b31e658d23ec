//! Parameter resolution
//!
//! Merges tuples from five kinds of sources, always in this order:
//!
//! 1. Comma-separated rows, then inline literal records
//! 2. File sources (`classpath:`, `file:` or a bare path) through a mapper
//! 3. `provide*` methods of source types and their ancestors
//! 4. Named methods, or the derived `parametersFor<Test>` default
//! 5. Lazy pull-function fields, drained once per resolution

mod extractor;
mod file;
mod lookup;
mod normalize;

pub use extractor::ParameterExtractor;
pub use file::{read_tuples, CsvMapper, DataMapper, JsonMapper, Locator, YamlMapper};
pub use lookup::{
    default_method_name, Binding, LookupTable, Stage, DEFAULT_METHOD_PREFIX, PROVIDER_PREFIX,
};
pub use normalize::{normalize, normalize_document};
