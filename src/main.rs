//! Command line front end over the editing engine.
//!
//! ```text
//! annotator summary  <file.json>
//! annotator merge    <file.json> <id_a> <id_b>
//! annotator subtract <file.json> <id_a> <id_b>
//! ```
//!
//! The input file holds `{ "classes": [...], "annotations": [...] }` with
//! optional `width` and `height`. Results are printed as JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use annotator::error::SerializationError;
use annotator::model::{AnnotationCollection, ClassCatalog};
use annotator::serializer::deserialize_annotation;
use annotator::{Editor, EngineConfig, EngineError};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

const USAGE: &str = "usage: annotator <summary|merge|subtract> <file.json> [id_a id_b]";

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    classes: ClassCatalog,
    #[serde(default)]
    annotations: Vec<Value>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
}

enum Operation {
    Summary,
    Merge(String, String),
    Subtract(String, String),
}

fn parse_args(args: &[String]) -> Result<(Operation, PathBuf), CliError> {
    let usage = || CliError::Usage(USAGE.to_string());
    let (command, rest) = args.split_first().ok_or_else(usage)?;
    let (path, ids) = rest.split_first().ok_or_else(usage)?;
    let operation = match (command.as_str(), ids) {
        ("summary", []) => Operation::Summary,
        ("merge", [a, b]) => Operation::Merge(a.clone(), b.clone()),
        ("subtract", [a, b]) => Operation::Subtract(a.clone(), b.clone()),
        _ => return Err(usage()),
    };
    Ok((operation, PathBuf::from(path)))
}

fn run(args: &[String], config: EngineConfig) -> Result<Value, CliError> {
    let (operation, path) = parse_args(args)?;
    let text = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    let document: Document = serde_json::from_str(&text)?;

    let mut editor = Editor::with_builtin_plugins(config, document.classes)?;
    let annotations = document
        .annotations
        .iter()
        .map(|value| deserialize_annotation(editor.core().serializers(), value))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Loaded {} annotations from {:?}", annotations.len(), path);
    editor.core_mut().open_image(
        document.width,
        document.height,
        AnnotationCollection::from_vec(annotations),
    );

    let command = match &operation {
        Operation::Summary => return summary(&editor).map_err(CliError::from),
        Operation::Merge(..) => "edit.merge",
        Operation::Subtract(..) => "edit.subtract",
    };
    if let Operation::Merge(a, b) | Operation::Subtract(a, b) = operation {
        let view = editor.view_mut()?;
        view.select(a.as_str().into());
        view.toggle_selection(b.as_str().into());
    }
    editor.run_command(command)?;
    Ok(json!({ "annotations": editor.core().export_view()? }))
}

fn summary(editor: &Editor) -> Result<Value, EngineError> {
    let view = editor.view()?;
    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for annotation in view.collection().iter() {
        *by_type.entry(annotation.ty().name()).or_default() += 1;
    }
    Ok(json!({
        "count": view.collection().len(),
        "types": by_type,
    }))
}

fn main() -> ExitCode {
    let config = EngineConfig::load_or_default();
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args, config) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
