//! JSON table definitions: a declarative way to describe an option table.

use serde::Deserialize;
use thiserror::Error;

use crate::table::{Opt, OptError, OptTable, DEFAULT_ERROR_LIMIT};

/// Errors that can occur while parsing or building a table definition.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON table definition: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("duplicate option name: {0}")]
    DuplicateName(String),

    #[error("'pattern' is required on regex option '{0}'")]
    MissingPattern(String),

    #[error("'format' is required on date option '{0}'")]
    MissingFormat(String),

    #[error("invalid option '{name}': {source}")]
    BadOpt { name: String, source: OptError },
}

/// The kind of an option entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptKind {
    /// A valueless switch (e.g. --verbose)
    Flag,
    /// An integer-valued option
    Int,
    /// A double-valued option
    Double,
    /// A free-form string option
    String,
    /// A string option constrained by a regular expression
    Regex,
    /// A filename option
    File,
    /// A date option parsed against a strftime format
    Date,
    /// A free-text glossary line; never matches arguments
    Remark,
}

fn default_max() -> usize {
    1
}

fn default_error_limit() -> usize {
    DEFAULT_ERROR_LIMIT
}

/// Definition of a single option entry.
#[derive(Debug, Clone, Deserialize)]
pub struct OptConfig {
    /// The name of the entry (used as the key in parse output)
    pub name: String,
    /// Short option characters (e.g. "v" for -v); empty for none
    #[serde(default)]
    pub shorts: String,
    /// Comma-separated long option names (e.g. "verbose"); empty for none
    #[serde(default)]
    pub longs: String,
    /// The kind of entry
    pub kind: OptKind,
    /// Value placeholder shown in syntax and glossary text; omit for the
    /// kind default, give "" to suppress
    pub label: Option<String>,
    /// Minimum number of occurrences (default: 0)
    #[serde(default)]
    pub min: usize,
    /// Maximum number of occurrences; also sizes value storage (default: 1)
    #[serde(default = "default_max")]
    pub max: usize,
    /// Regular expression for regex entries
    pub pattern: Option<String>,
    /// strftime format for date entries
    pub format: Option<String>,
    /// Glossary text; entries without it are omitted from the glossary
    pub help: Option<String>,
}

/// Top-level table definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// Name of the program (used as the error-report prefix)
    pub name: Option<String>,
    /// Description of the program
    pub description: Option<String>,
    /// Capacity of the error log (default: 20)
    #[serde(default = "default_error_limit")]
    pub error_limit: usize,
    /// The option entries, in table order
    #[serde(default)]
    pub opts: Vec<OptConfig>,
}

impl TableConfig {
    /// Parse a JSON string into a table definition.
    pub fn from_json(json: &str) -> Result<TableConfig, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the definition without building descriptors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use std::collections::HashSet;

        let mut names = HashSet::new();
        for opt in &self.opts {
            if !names.insert(&opt.name) {
                return Err(ConfigError::DuplicateName(opt.name.clone()));
            }
            if opt.kind == OptKind::Regex && opt.pattern.is_none() {
                return Err(ConfigError::MissingPattern(opt.name.clone()));
            }
            if opt.kind == OptKind::Date && opt.format.is_none() {
                return Err(ConfigError::MissingFormat(opt.name.clone()));
            }
        }
        Ok(())
    }

    /// Build an [`OptTable`] from this definition. Entry order in the table
    /// matches definition order.
    pub fn build(&self) -> Result<OptTable, ConfigError> {
        self.validate()?;

        let mut entries = Vec::with_capacity(self.opts.len());
        for opt in &self.opts {
            entries.push(opt.build()?);
        }
        Ok(OptTable::new(entries, self.error_limit))
    }
}

impl OptConfig {
    fn build(&self) -> Result<Opt, ConfigError> {
        let label = self.label.as_deref();
        let help = self.help.as_deref();
        let result = match self.kind {
            OptKind::Flag => Opt::flag(&self.shorts, &self.longs, self.min, self.max, help),
            OptKind::Int => Opt::int(&self.shorts, &self.longs, label, self.min, self.max, help),
            OptKind::Double => {
                Opt::double(&self.shorts, &self.longs, label, self.min, self.max, help)
            }
            OptKind::String => {
                Opt::string(&self.shorts, &self.longs, label, self.min, self.max, help)
            }
            OptKind::Regex => {
                // validate() guarantees the pattern is present.
                let pattern = self.pattern.as_deref().unwrap_or_default();
                Opt::regex(
                    &self.shorts,
                    &self.longs,
                    pattern,
                    label,
                    self.min,
                    self.max,
                    help,
                )
            }
            OptKind::File => Opt::file(&self.shorts, &self.longs, label, self.min, self.max, help),
            OptKind::Date => {
                let format = self.format.as_deref().unwrap_or_default();
                Opt::date(
                    &self.shorts,
                    &self.longs,
                    format,
                    label,
                    self.min,
                    self.max,
                    help,
                )
            }
            OptKind::Remark => {
                Opt::remark(label.unwrap_or_default(), help.unwrap_or_default())
            }
        };
        result.map_err(|source| ConfigError::BadOpt {
            name: self.name.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_definition() {
        let json = r#"{
            "name": "myprog",
            "description": "My program",
            "error_limit": 10,
            "opts": [
                {"name": "verbose", "shorts": "v", "longs": "verbose",
                 "kind": "flag", "help": "verbose output"},
                {"name": "level", "longs": "level", "kind": "int",
                 "label": "<n>", "help": "level"},
                {"name": "files", "kind": "file", "min": 1, "max": 100,
                 "help": "input files"}
            ]
        }"#;

        let config = TableConfig::from_json(json).unwrap();
        assert_eq!(config.name, Some("myprog".to_string()));
        assert_eq!(config.error_limit, 10);
        assert_eq!(config.opts.len(), 3);

        let verbose = &config.opts[0];
        assert_eq!(verbose.shorts, "v");
        assert_eq!(verbose.kind, OptKind::Flag);
        assert_eq!(verbose.min, 0);
        assert_eq!(verbose.max, 1);

        let files = &config.opts[2];
        assert_eq!(files.kind, OptKind::File);
        assert_eq!(files.min, 1);
        assert_eq!(files.max, 100);

        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let json = r#"{"opts": [{"name": "n", "longs": "n", "kind": "int"}]}"#;
        let config = TableConfig::from_json(json).unwrap();
        assert_eq!(config.error_limit, DEFAULT_ERROR_LIMIT);
        assert_eq!(config.opts[0].min, 0);
        assert_eq!(config.opts[0].max, 1);
        assert!(config.opts[0].label.is_none());
    }

    #[test]
    fn test_error_on_duplicate_names() {
        let json = r#"{"opts": [
            {"name": "dup", "shorts": "a", "kind": "flag"},
            {"name": "dup", "shorts": "b", "kind": "flag"}
        ]}"#;
        let config = TableConfig::from_json(json).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::DuplicateName(name)) if name == "dup"));
    }

    #[test]
    fn test_error_on_missing_pattern() {
        let json = r#"{"opts": [{"name": "id", "longs": "id", "kind": "regex"}]}"#;
        let config = TableConfig::from_json(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingPattern(name)) if name == "id"
        ));
    }

    #[test]
    fn test_error_on_missing_format() {
        let json = r#"{"opts": [{"name": "since", "longs": "since", "kind": "date"}]}"#;
        let config = TableConfig::from_json(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFormat(name)) if name == "since"
        ));
    }

    #[test]
    fn test_build_surfaces_descriptor_errors() {
        let json = r#"{"opts": [
            {"name": "n", "longs": "n", "kind": "int", "min": 5, "max": 1}
        ]}"#;
        let config = TableConfig::from_json(json).unwrap();
        let result = config.build();
        assert!(matches!(
            result,
            Err(ConfigError::BadOpt { name, source: OptError::BadBounds { .. } }) if name == "n"
        ));
    }

    #[test]
    fn test_build_and_parse() {
        let json = r#"{
            "name": "cp",
            "opts": [
                {"name": "recursive", "shorts": "r", "longs": "recursive",
                 "kind": "flag", "help": "copy directories recursively"},
                {"name": "sources", "kind": "file", "label": "<src>",
                 "min": 1, "max": 50, "help": "source files"},
                {"name": "dest", "kind": "file", "label": "<dst>",
                 "min": 1, "max": 1, "help": "destination"}
            ]
        }"#;
        let config = TableConfig::from_json(json).unwrap();
        let mut table = config.build().unwrap();

        let args: Vec<String> = ["-r", "a", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let n = table.parse(&args);
        // The greedy source entry absorbs all tokens; dest stays empty.
        assert_eq!(n, 1);
        assert_eq!(table.entries()[1].count(), 3);
        assert_eq!(table.entries()[2].count(), 0);
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let json = r#"{"opts": [{"name": "x", "kind": "tristate"}]}"#;
        assert!(matches!(
            TableConfig::from_json(json),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_remark_entry() {
        let json = r#"{"opts": [
            {"name": "note", "kind": "remark", "label": "MODES:",
             "help": "pick exactly one"}
        ]}"#;
        let config = TableConfig::from_json(json).unwrap();
        let table = config.build().unwrap();
        assert!(!table.entries()[0].is_positional());
        assert_eq!(table.entries()[0].value_label(), "MODES:");
    }
}
