//! fc-project: flowsheet document format and validation.

pub mod convert;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use convert::{doc_to_graph, graph_to_doc};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_doc};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Codec error: {0}")]
    Codec(#[from] fc_core::CodecError),

    #[error("Graph error: {0}")]
    Graph(#[from] fc_graph::GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<FlowsheetDoc> {
    let content = std::fs::read_to_string(path)?;
    let doc: FlowsheetDoc = serde_yaml::from_str(&content)?;
    validate_doc(&doc)?;
    Ok(doc)
}

pub fn save_yaml(path: &Path, doc: &FlowsheetDoc) -> ProjectResult<()> {
    validate_doc(doc)?;
    let content = serde_yaml::to_string(doc)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<FlowsheetDoc> {
    let content = std::fs::read_to_string(path)?;
    let doc: FlowsheetDoc = serde_json::from_str(&content)?;
    validate_doc(&doc)?;
    Ok(doc)
}

pub fn save_json(path: &Path, doc: &FlowsheetDoc) -> ProjectResult<()> {
    validate_doc(doc)?;
    let content = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &Path) -> ProjectResult<FlowsheetDoc> {
    if is_json(path) {
        load_json(path)
    } else {
        load_yaml(path)
    }
}

/// Save by extension: `.json` as JSON, anything else as YAML.
pub fn save(path: &Path, doc: &FlowsheetDoc) -> ProjectResult<()> {
    if is_json(path) {
        save_json(path, doc)
    } else {
        save_yaml(path, doc)
    }
}
