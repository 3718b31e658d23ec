//! File-backed parameter sources
//!
//! Locator parsing, reading, and the bundled data mappers.

use anyhow::Context;
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::normalize::normalize_document;
use crate::error::ConfigurationError;
use crate::models::ParameterTuple;

/// Turns raw file content into tuples.
pub trait DataMapper: Send + Sync {
    fn map(&self, content: &str) -> anyhow::Result<Vec<ParameterTuple>>;
}

/// Where a file source reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    /// `classpath:` - relative to the configured resource directory.
    Classpath(PathBuf),
    /// `file:` - a filesystem path.
    File(PathBuf),
    /// No protocol prefix.
    Bare(PathBuf),
}

impl Locator {
    pub fn parse(locator: &str) -> Result<Self, ConfigurationError> {
        let Some((protocol, path)) = locator.split_once(':') else {
            return Ok(Locator::Bare(PathBuf::from(locator)));
        };

        match protocol {
            "classpath" => Ok(Locator::Classpath(PathBuf::from(path))),
            "file" => Ok(Locator::File(PathBuf::from(path))),
            other => Err(ConfigurationError::UnknownProtocol {
                locator: locator.to_string(),
                protocol: other.to_string(),
            }),
        }
    }

    pub fn path(&self, resource_dir: &Path) -> PathBuf {
        match self {
            Locator::Classpath(path) => resource_dir.join(path),
            Locator::File(path) | Locator::Bare(path) => path.clone(),
        }
    }
}

/// Read a located file and map it to tuples.
pub fn read_tuples(
    locator: &str,
    target: &Locator,
    mapper: &dyn DataMapper,
    resource_dir: &Path,
) -> Result<Vec<ParameterTuple>, ConfigurationError> {
    let path = target.path(resource_dir);
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigurationError::FileRead {
        locator: locator.to_string(),
        reason: format!("{}: {e}", path.display()),
    })?;

    mapper
        .map(&content)
        .map_err(|e| ConfigurationError::Mapping {
            locator: locator.to_string(),
            reason: format!("{e:#}"),
        })
}

/// One tuple per CSV record, every field a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvMapper {
    has_headers: bool,
}

impl CsvMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the first record.
    pub fn with_headers(mut self) -> Self {
        self.has_headers = true;
        self
    }
}

impl DataMapper for CsvMapper {
    fn map(&self, content: &str) -> anyhow::Result<Vec<ParameterTuple>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(content.as_bytes());

        let mut tuples = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("malformed CSV record {}", line + 1))?;
            tuples.push(ParameterTuple::from_strings(record.iter()));
        }
        Ok(tuples)
    }
}

/// JSON array of arrays, or array of scalars.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMapper;

impl DataMapper for JsonMapper {
    fn map(&self, content: &str) -> anyhow::Result<Vec<ParameterTuple>> {
        let document: Value = serde_json::from_str(content).context("invalid JSON document")?;
        normalize_document(document)
            .context("JSON document must be an array of arrays or an array of scalars")
    }
}

/// YAML sequence of sequences, or sequence of scalars.
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlMapper;

impl DataMapper for YamlMapper {
    fn map(&self, content: &str) -> anyhow::Result<Vec<ParameterTuple>> {
        let document: Value = serde_yaml::from_str(content).context("invalid YAML document")?;
        normalize_document(document)
            .context("YAML document must be a sequence of sequences or a sequence of scalars")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple;
    use tempfile::tempdir;

    #[test]
    fn test_parse_locators() {
        assert_eq!(
            Locator::parse("classpath:data/greetings.csv").unwrap(),
            Locator::Classpath(PathBuf::from("data/greetings.csv"))
        );
        assert_eq!(
            Locator::parse("file:/tmp/x.csv").unwrap(),
            Locator::File(PathBuf::from("/tmp/x.csv"))
        );
        assert_eq!(
            Locator::parse("relative/x.csv").unwrap(),
            Locator::Bare(PathBuf::from("relative/x.csv"))
        );
    }

    #[test]
    fn test_unknown_protocol() {
        let err = Locator::parse("http://example.com/data.csv").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownProtocol {
                locator: "http://example.com/data.csv".to_string(),
                protocol: "http".to_string(),
            }
        );
    }

    #[test]
    fn test_classpath_resolves_against_resource_dir() {
        let locator = Locator::parse("classpath:a.csv").unwrap();
        assert_eq!(
            locator.path(Path::new("res")),
            PathBuf::from("res").join("a.csv")
        );
    }

    #[test]
    fn test_csv_mapper() {
        let tuples = CsvMapper::new()
            .map("1, Hello, true\n# comment\n2,Hi,false\n")
            .unwrap();
        assert_eq!(
            tuples,
            vec![tuple!["1", "Hello", "true"], tuple!["2", "Hi", "false"]]
        );
    }

    #[test]
    fn test_csv_mapper_with_headers() {
        let tuples = CsvMapper::new()
            .with_headers()
            .map("number,word\n3,three\n")
            .unwrap();
        assert_eq!(tuples, vec![tuple!["3", "three"]]);
    }

    #[test]
    fn test_json_and_yaml_mappers() {
        let json = JsonMapper.map(r#"[[1, "a"], [2, "b"]]"#).unwrap();
        let yaml = YamlMapper.map("- [1, a]\n- [2, b]\n").unwrap();
        assert_eq!(json, vec![tuple![1, "a"], tuple![2, "b"]]);
        assert_eq!(json, yaml);

        assert!(JsonMapper.map(r#"{"not": "a list"}"#).is_err());
    }

    #[test]
    fn test_read_tuples_from_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), "a,b\nc,d\n").unwrap();

        let target = Locator::parse("classpath:data.csv").unwrap();
        let tuples = read_tuples("classpath:data.csv", &target, &CsvMapper::new(), dir.path())
            .unwrap();
        assert_eq!(tuples.len(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let target = Locator::parse("classpath:missing.csv").unwrap();
        let err = read_tuples("classpath:missing.csv", &target, &CsvMapper::new(), dir.path())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::FileRead { .. }));
    }
}
