//! opttab - table-driven command-line option parsing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opttab::{
    generate_errors, generate_glossary, generate_syntax, OptKind, OptTable, TableConfig,
    GLOSSARY_FORMAT,
};
use serde_json::json;

/// Table-driven command-line option parsing.
#[derive(Parser, Debug)]
#[command(name = "opttab", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments against a JSON table definition
    Parse {
        /// JSON table definition
        #[arg(long)]
        config: String,

        /// Program name used when rendering errors (overrides the definition)
        #[arg(long)]
        name: Option<String>,

        /// Arguments to parse
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the usage syntax line for a table definition
    Syntax {
        /// JSON table definition
        #[arg(long)]
        config: String,

        /// List every form of every option instead of the compact syntax
        #[arg(long)]
        verbose: bool,
    },

    /// Print the option glossary for a table definition
    Glossary {
        /// JSON table definition
        #[arg(long)]
        config: String,

        /// Line template with two {} placeholders (syntax, description)
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { config, name, args } => {
            let cfg =
                TableConfig::from_json(&config).context("failed to parse table definition")?;
            let mut table = cfg.build().context("invalid table definition")?;

            let errors = table.parse(&args);
            if errors > 0 {
                let prog = name.as_deref().or(cfg.name.as_deref());
                eprint!("{}", generate_errors(table.errors(), prog));
                std::process::exit(1);
            }

            let summary = summarize(&cfg, &table);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Syntax { config, verbose } => {
            let cfg =
                TableConfig::from_json(&config).context("failed to parse table definition")?;
            let table = cfg.build().context("invalid table definition")?;
            print!("{}", generate_syntax(&table, verbose, "\n"));
        }
        Commands::Glossary { config, format } => {
            let cfg =
                TableConfig::from_json(&config).context("failed to parse table definition")?;
            let table = cfg.build().context("invalid table definition")?;
            let template = format.as_deref().unwrap_or(GLOSSARY_FORMAT);
            print!("{}", generate_glossary(&table, template));
        }
    }

    Ok(())
}

/// Collect the matched values of every entry into a JSON object keyed by
/// entry name: occurrence counts for flags, converted value arrays for the
/// value-carrying kinds.
fn summarize(cfg: &TableConfig, table: &OptTable) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (opt_cfg, entry) in cfg.opts.iter().zip(table.entries()) {
        let n = entry.count();
        let value = match opt_cfg.kind {
            OptKind::Remark => continue,
            OptKind::Flag => json!(n),
            OptKind::Int => json!(&entry.ints()[..n]),
            OptKind::Double => json!(&entry.doubles()[..n]),
            OptKind::String | OptKind::Regex => json!(&entry.strings()[..n]),
            OptKind::File => json!(entry.files()[..n]
                .iter()
                .map(|f| json!({"full": f.full, "base": f.base, "ext": f.ext}))
                .collect::<Vec<_>>()),
            OptKind::Date => json!(entry.dates()[..n]
                .iter()
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
                .collect::<Vec<_>>()),
        };
        map.insert(opt_cfg.name.clone(), value);
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const SAMPLE: &str = r#"{
        "name": "sample",
        "opts": [
            {"name": "verbose", "shorts": "v", "longs": "verbose", "kind": "flag"},
            {"name": "level", "longs": "level", "kind": "int", "label": "<n>"},
            {"name": "files", "kind": "file", "min": 1, "max": 100}
        ]
    }"#;

    #[test]
    fn test_parse_subcommand_parses_config_and_args() {
        let cli = Cli::try_parse_from([
            "opttab", "parse", "--config", SAMPLE, "--", "-v", "--level=7", "a.txt",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse { config, name, args } => {
                assert_eq!(config, SAMPLE);
                assert!(name.is_none());
                assert_eq!(args, vec!["-v", "--level=7", "a.txt"]);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_parse_subcommand_requires_config() {
        let result = Cli::try_parse_from(["opttab", "parse", "--"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_syntax_subcommand_verbose_flag() {
        let cli =
            Cli::try_parse_from(["opttab", "syntax", "--config", SAMPLE, "--verbose"]).unwrap();
        match cli.command {
            Commands::Syntax { verbose, .. } => assert!(verbose),
            _ => panic!("Expected Syntax command"),
        }
    }

    #[test]
    fn test_glossary_subcommand_custom_format() {
        let cli = Cli::try_parse_from([
            "opttab", "glossary", "--config", SAMPLE, "--format", "{} - {}\n",
        ])
        .unwrap();
        match cli.command {
            Commands::Glossary { format, .. } => {
                assert_eq!(format, Some("{} - {}\n".to_string()));
            }
            _ => panic!("Expected Glossary command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["opttab"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_summarize_output() {
        let cfg = TableConfig::from_json(SAMPLE).unwrap();
        let mut table = cfg.build().unwrap();
        let args: Vec<String> = ["-v", "--level=7", "a.txt", "b.txt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(table.parse(&args), 0);

        let summary = summarize(&cfg, &table);
        assert_eq!(summary["verbose"], json!(1));
        assert_eq!(summary["level"], json!([7]));
        assert_eq!(summary["files"][0]["full"], json!("a.txt"));
        assert_eq!(summary["files"][1]["base"], json!("b.txt"));
    }

    #[test]
    fn test_summarize_skips_remarks() {
        let json_cfg = r#"{"opts": [
            {"name": "note", "kind": "remark", "label": "N", "help": "h"},
            {"name": "flag", "shorts": "f", "kind": "flag"}
        ]}"#;
        let cfg = TableConfig::from_json(json_cfg).unwrap();
        let mut table = cfg.build().unwrap();
        table.parse(&[]);

        let summary = summarize(&cfg, &table);
        assert!(summary.get("note").is_none());
        assert_eq!(summary["flag"], json!(0));
    }
}
