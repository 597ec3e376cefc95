use std::process;

use crate::commands::{exit_with_failure, parse_type_or_exit, print_json, read_input};
use crate::config::Project;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_parse(
    project: &Project,
    type_str: &str,
    input: &str,
    coerce: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let node = parse_type_or_exit(project, type_str, output, quiet);
    let wire = match read_input(input) {
        Ok(v) => v,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    match project.executor(coerce).parse(&node, &wire) {
        Ok(value) => {
            if quiet {
                return;
            }
            // Host instances have no wire form; the CLI never builds any.
            let json = value.to_json().unwrap_or(serde_json::Value::Null);
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "type": value.type_name(),
                    "value": json,
                })),
                OutputFormat::Text => print_json(&json),
            }
        }
        Err(e) => exit_with_failure(&e, output, quiet),
    }
}
