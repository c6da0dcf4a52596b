use std::fs;
use std::io::Read;

use ecow::{EcoString, eco_format};
use sleuth_eval::Vm;
use sleuth_library::collection::Collection;
use sleuth_library::foundations::{Object, ops};
use sleuth_library::host::{self, DomApiChecker};
use sleuth_syntax::ast;

use crate::args::{RunCommand, SerializationFormat};

/// Execute the `run` command.
pub fn run(command: &RunCommand) -> Result<(), EcoString> {
    let json = read_input(command)?;
    let program: ast::Program = serde_json::from_str(&json)
        .map_err(|error| eco_format!("failed to read the AST: {error}"))?;

    let url = match &command.url {
        Some(url) => EcoString::from(url.as_str()),
        None => command
            .input
            .file_name()
            .map(|name| EcoString::from(name.to_string_lossy().as_ref()))
            .unwrap_or_else(|| "script.js".into()),
    };

    let context = host::browser();
    let mut vm = Vm::new(context, &DomApiChecker, url);
    let output =
        sleuth_eval::eval(&program, &mut vm).map_err(|error| eco_format!("{error}"))?;

    if command.value {
        println!("{}", output.repr());
    }

    let collection = vm.into_collection();
    match command.format {
        SerializationFormat::Plain => print_plain(&collection),
        SerializationFormat::Json => print_json(&collection)?,
    }

    Ok(())
}

fn read_input(command: &RunCommand) -> Result<String, EcoString> {
    if command.input.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|error| eco_format!("failed to read stdin: {error}"))?;
        Ok(buffer)
    } else {
        fs::read_to_string(&command.input).map_err(|error| {
            eco_format!("failed to read {}: {error}", command.input.display())
        })
    }
}

fn print_plain(collection: &Collection) {
    for entry in collection.entries() {
        println!(
            "{:8} {:20} {}  ({})",
            entry.kind,
            describe(&entry.element),
            entry.info.code,
            entry.info.loc,
        );
    }
}

fn print_json(collection: &Collection) -> Result<(), EcoString> {
    let entries: Vec<serde_json::Value> = collection
        .entries()
        .iter()
        .map(|entry| {
            serde_json::json!({
                "element": describe(&entry.element).as_str(),
                "kind": entry.kind.as_str(),
                "code": entry.info.code.as_str(),
                "loc": entry.info.loc.as_str(),
            })
        })
        .collect();
    let rendered = serde_json::to_string_pretty(&entries)
        .map_err(|error| eco_format!("failed to serialize the trace: {error}"))?;
    println!("{rendered}");
    Ok(())
}

/// A short, stable description of an element for the report.
fn describe(element: &Object) -> EcoString {
    let tag = ops::to_string(&element.get("tagName")).to_lowercase();
    let tag = if tag.is_empty() { "node".into() } else { tag };
    if element.has("id") {
        eco_format!("<{tag} id={}>", ops::to_string(&element.get("id")))
    } else {
        eco_format!("<{tag}>")
    }
}
