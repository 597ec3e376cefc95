use crate::commands::{parse_type_or_exit, print_json};
use crate::config::Project;
use crate::OutputFormat;

pub(crate) fn cmd_check(project: &Project, type_str: &str, output: OutputFormat, quiet: bool) {
    let node = parse_type_or_exit(project, type_str, output, quiet);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let tree = serde_json::to_value(&node).unwrap_or(serde_json::Value::Null);
            print_json(&serde_json::json!({
                "canonical": node.to_string(),
                "tree": tree,
            }));
        }
        OutputFormat::Text => println!("{}", node),
    }
}
