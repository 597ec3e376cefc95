use std::collections::BTreeMap;
use std::path::Path;
use std::process;

use castor_core::Node;
use castor_optimizer::Optimizer;

use crate::commands::{print_json, report_syntax_error};
use crate::config::Project;
use crate::{report_error, OutputFormat};

/// Read `{ "schema name": "type string", ... }`, parse every entry and
/// write the optimized table as Rust source.
pub(crate) fn cmd_compile(
    project: &Project,
    schemas_path: &Path,
    out: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let content = match std::fs::read_to_string(schemas_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!("could not read '{}': {}", schemas_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let sources: BTreeMap<String, String> = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!(
                "'{}' must be a JSON object of schema name to type string: {}",
                schemas_path.display(),
                e
            );
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let parser = project.parser();
    let mut schemas: BTreeMap<String, Node> = BTreeMap::new();
    for (name, type_str) in &sources {
        match parser.parse(type_str) {
            Ok(node) => {
                schemas.insert(name.clone(), node);
            }
            Err(e) => {
                report_error(&format!("schema '{}' does not parse", name), output, quiet);
                report_syntax_error(&e, output, quiet);
                process::exit(1);
            }
        }
    }

    let compiled = match Optimizer::new().compile(&schemas) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let source = compiled.emit_source();

    let Some(out) = out else {
        print!("{}", source);
        return;
    };
    if let Err(e) = std::fs::write(out, &source) {
        let msg = format!("could not write '{}': {}", out.display(), e);
        report_error(&msg, output, quiet);
        process::exit(1);
    }
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schemas": compiled.roots().len(),
            "shared": compiled.table().len(),
            "out": out.display().to_string(),
        })),
        OutputFormat::Text => println!(
            "compiled {} schema(s), {} shared node(s) -> {}",
            compiled.roots().len(),
            compiled.table().len(),
            out.display()
        ),
    }
}
