//! JSON schema documents.
//!
//! A document is either an array of tables or a single table object. The
//! desired schema can be spread over a directory of such documents.

use std::fs;
use std::path::{Path, PathBuf};

use joinery_core::Table;
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Reads tables from a JSON file, or from every `*.json` file of a
/// directory in file name order.
pub fn read_tables(path: impl AsRef<Path>) -> Result<Vec<Table>> {
    let path = path.as_ref();
    if !path.is_dir() {
        return read_file(path);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    files.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"));
    files.sort();

    let mut tables = Vec::new();
    for file in &files {
        tables.extend(read_file(file)?);
    }
    Ok(tables)
}

fn read_file(path: &Path) -> Result<Vec<Table>> {
    let text = fs::read_to_string(path)?;
    let tables = parse_tables(&text).map_err(|source| MigrateError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), tables = tables.len(), "Read schema file");
    Ok(tables)
}

/// Parses a JSON document holding an array of tables or a single table.
pub fn parse_tables(text: &str) -> std::result::Result<Vec<Table>, serde_json::Error> {
    if text.trim_start().starts_with('[') {
        serde_json::from_str(text)
    } else {
        serde_json::from_str::<Table>(text).map(|table| vec![table])
    }
}

/// Renders tables as a pretty-printed JSON array.
pub fn to_document(tables: &[Table]) -> Result<String> {
    let mut document = serde_json::to_string_pretty(tables)?;
    document.push('\n');
    Ok(document)
}

/// Writes tables to `path` as a pretty-printed JSON array.
pub fn write_tables(path: impl AsRef<Path>, tables: &[Table]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_document(tables)?)?;
    debug!(path = %path.display(), tables = tables.len(), "Wrote schema file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_core::{Column, Key};

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", 1, "int(11)", "int").not_null())
            .column(
                Column::new("email", 2, "varchar(255)", "varchar")
                    .not_null()
                    .charset("utf8mb4", "utf8mb4_general_ci"),
            )
            .key(Key::primary(["id"]))
    }

    #[test]
    fn single_table_document() {
        let json = serde_json::to_string(&users()).unwrap();
        assert_eq!(parse_tables(&json).unwrap(), vec![users()]);
    }

    #[test]
    fn array_document_with_leading_whitespace() {
        let json = format!("\n  {}", to_document(&[users()]).unwrap());
        assert_eq!(parse_tables(&json).unwrap(), vec![users()]);
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.json");
        write_tables(&path, &[users()]).unwrap();
        assert_eq!(read_tables(&path).unwrap(), vec![users()]);
    }

    #[test]
    fn directory_is_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let orders = Table::new("orders").column(Column::new("id", 1, "int(11)", "int"));
        write_tables(dir.path().join("b.json"), &[orders.clone()]).unwrap();
        write_tables(dir.path().join("a.json"), &[users()]).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let names: Vec<String> = read_tables(dir.path())
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["users", "orders"]);
    }

    #[test]
    fn malformed_document_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"name": "users"}"#).unwrap();

        match read_tables(&path) {
            Err(MigrateError::Decode { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_tables(dir.path().join("absent.json"));
        assert!(matches!(result, Err(MigrateError::Io(_))));
    }
}
