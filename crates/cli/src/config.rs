//! Project configuration for `castor`.
//!
//! The project file declares the host types that type strings may name,
//! since the CLI has no host program to reflect on. Every section is
//! optional.
//!
//! # Example
//!
//! ```toml
//! [options]
//! coerce_primitives = true
//! max_depth = 128
//!
//! [parser]
//! max_depth = 64
//!
//! [aliases]
//! UserId = "positive-int"
//!
//! [enums]
//! Status = ["Active", "Suspended"]
//!
//! [datetimes]
//! Instant = "rfc3339"
//! Day = "[year]-[month]-[day]"
//!
//! [constants]
//! "Limits::MAX" = 10
//! "Status::DEFAULT" = { enum = "Status", case = "Active" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use castor_core::{DateTimeFormat, LiteralValue, Parser, ParserConfig, TypeRegistry};
use castor_schema::{Executor, ParseOptions};
use serde::Deserialize;

/// Looked up in the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "castor.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProjectConfig {
    #[serde(default)]
    pub options: ParseOptions,
    #[serde(default)]
    pub parser: ParserSection,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<String>>,
    /// Type name to `"rfc3339"` or a `time` format description.
    #[serde(default)]
    pub datetimes: BTreeMap<String, String>,
    /// `"Class::NAME"` to value.
    #[serde(default)]
    pub constants: BTreeMap<String, ConstantValue>,
}

/// `[parser]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct ParserSection {
    pub max_depth: usize,
}

impl Default for ParserSection {
    fn default() -> Self {
        ParserSection {
            max_depth: ParserConfig::default().max_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConstantValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    EnumCase {
        #[serde(rename = "enum")]
        enumeration: String,
        case: String,
    },
}

impl From<&ConstantValue> for LiteralValue {
    fn from(value: &ConstantValue) -> Self {
        match value {
            ConstantValue::Bool(b) => LiteralValue::Bool(*b),
            ConstantValue::Int(n) => LiteralValue::Int(*n),
            ConstantValue::Float(x) => LiteralValue::Float(*x),
            ConstantValue::String(s) => LiteralValue::String(s.clone()),
            ConstantValue::EnumCase { enumeration, case } => LiteralValue::EnumCase {
                name: enumeration.clone(),
                case: case.clone(),
            },
        }
    }
}

/// A loaded project: the configuration plus the registry built from it.
pub(crate) struct Project {
    pub config: ProjectConfig,
    types: Arc<TypeRegistry>,
}

impl Project {
    /// Load `path`, or `./castor.toml` if it exists, or an empty project.
    pub fn load(path: Option<&Path>) -> Result<Project, String> {
        let config = match path {
            Some(p) => read_config(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => read_config(Path::new(DEFAULT_CONFIG_FILE))?,
            None => ProjectConfig::default(),
        };
        Project::from_config(config)
    }

    pub fn from_config(config: ProjectConfig) -> Result<Project, String> {
        let types = Arc::new(build_registry(&config)?);
        tracing::debug!(registry = ?types, "loaded project");
        Ok(Project { config, types })
    }

    pub fn parser(&self) -> Parser {
        Parser::new(self.types.clone()).with_config(ParserConfig {
            max_depth: self.config.parser.max_depth,
        })
    }

    /// Executor with the project options, `coerce` forcing coercion on.
    pub fn executor(&self, coerce: bool) -> Executor {
        let mut options = self.config.options;
        options.coerce_primitives |= coerce;
        Executor::new(self.types.clone()).with_options(options)
    }
}

pub(crate) fn read_config(path: &Path) -> Result<ProjectConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

fn build_registry(config: &ProjectConfig) -> Result<TypeRegistry, String> {
    let mut reg = TypeRegistry::new();
    for (name, cases) in &config.enums {
        if cases.is_empty() {
            return Err(format!("enum '{}' must have at least one case", name));
        }
        let cases: Vec<&str> = cases.iter().map(String::as_str).collect();
        reg.register_enum(name.clone(), &cases);
    }
    for (name, format) in &config.datetimes {
        reg.register_datetime(name.clone(), DateTimeFormat::from_config(format));
    }
    for (name, type_str) in &config.aliases {
        reg.register_alias(name.clone(), type_str.clone());
    }
    for (key, value) in &config.constants {
        let Some((class, constant)) = key.split_once("::") else {
            return Err(format!("constant key '{}' must look like Class::NAME", key));
        };
        if let ConstantValue::EnumCase { enumeration, case } = value {
            let known = config
                .enums
                .get(enumeration)
                .is_some_and(|cases| cases.contains(case));
            if !known {
                return Err(format!(
                    "constant '{}' refers to unknown enum case {}::{}",
                    key, enumeration, case
                ));
            }
        }
        reg.register_constant(class, constant, value.into());
    }
    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(toml_src: &str) -> Result<Project, String> {
        let config: ProjectConfig = toml::from_str(toml_src).map_err(|e| e.to_string())?;
        Project::from_config(config)
    }

    #[test]
    fn empty_file_is_a_valid_project() {
        let p = project("").unwrap();
        assert!(!p.config.options.coerce_primitives);
        assert_eq!(p.config.parser.max_depth, ParserConfig::default().max_depth);
    }

    #[test]
    fn sections_populate_the_registry() {
        let p = project(
            r#"
            [options]
            coerce_primitives = true

            [aliases]
            UserId = "positive-int"

            [enums]
            Status = ["Active", "Suspended"]

            [datetimes]
            Day = "[year]-[month]-[day]"

            [constants]
            "Limits::MAX" = 10
            "Limits::RATIO" = 0.5
            "Status::DEFAULT" = { enum = "Status", case = "Active" }
            "#,
        )
        .unwrap();
        assert!(p.config.options.coerce_primitives);
        assert_eq!(
            p.config.constants["Limits::RATIO"],
            ConstantValue::Float(0.5)
        );
        let parser = p.parser();
        assert_eq!(parser.parse("UserId").unwrap().to_string(), "constrained<int, int_range(1, max)>");
        assert_eq!(parser.parse("Limits::MAX").unwrap().to_string(), "10");
        assert_eq!(parser.parse("Status::DEFAULT").unwrap().to_string(), "Status::Active");
        assert_eq!(parser.parse("Day").unwrap().to_string(), "datetime<Day, '[year]-[month]-[day]'>");
    }

    #[test]
    fn bad_constant_keys_are_rejected() {
        let err = project("[constants]\nMAX = 1\n").err().unwrap();
        assert_eq!(err, "constant key 'MAX' must look like Class::NAME");
        let err = project("[constants]\n\"A::B\" = { enum = \"Nope\", case = \"X\" }\n").err().unwrap();
        assert_eq!(err, "constant 'A::B' refers to unknown enum case Nope::X");
    }

    #[test]
    fn unknown_sections_are_errors() {
        assert!(project("[typos]\nx = 1\n").is_err());
    }
}
