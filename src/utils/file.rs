//! Loading the project catalog.

use std::io::{self, Read};
use std::path::Path;

use crate::error::IngestError;
use crate::models::ProjectRecord;

/// Read the catalog from a file, or from stdin when `path` is `-`.
pub fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Parse a JSON array of project records. Unknown fields are ignored.
pub fn parse_projects(input: &str) -> Result<Vec<ProjectRecord>, IngestError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(input)
        .map_err(|e| IngestError::InputError(format!("invalid project catalog: {e}")))
}

/// Read and parse the catalog at `path`.
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>, IngestError> {
    let input = read_input(path)
        .map_err(|e| IngestError::InputError(format!("{}: {e}", path.display())))?;
    parse_projects(&input)
}
