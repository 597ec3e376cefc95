pub(crate) mod check;
pub(crate) mod compile;
pub(crate) mod parse;
pub(crate) mod serialize;

use std::io::Read;
use std::process;

use castor_core::{InvalidSyntax, Node};
use castor_schema::SchemaError;

use crate::config::Project;
use crate::{report_error, OutputFormat};

/// Parse `type_str` or print the syntax error and exit 1.
pub(crate) fn parse_type_or_exit(project: &Project, type_str: &str, output: OutputFormat, quiet: bool) -> Node {
    match project.parser().parse(type_str) {
        Ok(node) => node,
        Err(e) => {
            report_syntax_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_syntax_error(e: &InvalidSyntax, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("syntax error: {}", e.message);
                eprintln!("{}", e.pointer());
            }
        }
    }
}

/// Print the issues of a failed `parse`/`serialize` call and exit 1.
pub(crate) fn exit_with_failure(err: &SchemaError, output: OutputFormat, quiet: bool) -> ! {
    match (output, err.failure()) {
        (OutputFormat::Json, _) => {
            let err_json = serde_json::to_string_pretty(&err.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err));
            eprintln!("{}", err_json);
        }
        (OutputFormat::Text, Some(failure)) if !quiet => {
            eprintln!("invalid data ({} issue(s)):", failure.len());
            for (path, issues) in failure.issues() {
                for issue in issues {
                    eprintln!("  {}: {}", path, issue.key);
                }
            }
        }
        (OutputFormat::Text, _) => report_error(&err.to_string(), output, quiet),
    }
    process::exit(1);
}

/// Read JSON from `source`, a file path or `-` for stdin.
pub(crate) fn read_input(source: &str) -> Result<serde_json::Value, String> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("could not read stdin: {}", e))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| format!("could not read '{}': {}", source, e))?
    };
    serde_json::from_str(&content).map_err(|e| format!("invalid JSON in '{}': {}", source, e))
}

pub(crate) fn print_json(value: &serde_json::Value) {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}
