use std::process;

use crate::commands::{exit_with_failure, parse_type_or_exit, print_json, read_input};
use crate::config::Project;
use crate::{report_error, OutputFormat};

/// Round trip: the printed wire value is what the type's output side
/// produces for the parsed input.
pub(crate) fn cmd_serialize(
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

    let executor = project.executor(coerce);
    let value = match executor.parse(&node, &wire) {
        Ok(v) => v,
        Err(e) => exit_with_failure(&e, output, quiet),
    };
    match executor.serialize(&node, &value) {
        Ok(json) => {
            if !quiet {
                print_json(&json);
            }
        }
        Err(e) => exit_with_failure(&e, output, quiet),
    }
}
