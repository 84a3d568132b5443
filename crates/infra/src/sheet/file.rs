use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use medinv_inventory::Row;

use super::{header_row, RowStore, SheetError, SheetResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SheetFile {
    header: Row,
    rows: Vec<Row>,
}

/// Sheet persisted as one JSON document, rewritten after every mutation.
///
/// The header row is written when the file is created and restored if an
/// existing file has lost it.
#[derive(Debug)]
pub struct JsonFileSheet {
    name: String,
    path: PathBuf,
    state: RwLock<SheetFile>,
}

impl JsonFileSheet {
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>, columns: &[&str]) -> SheetResult<Self> {
        let name = name.into();
        let path = path.as_ref().to_path_buf();

        let mut state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str::<SheetFile>(&raw)?
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            SheetFile::default()
        };

        let created = state.header.is_empty();
        if created {
            state.header = header_row(columns);
        }

        let sheet = Self {
            name,
            path,
            state: RwLock::new(state),
        };
        if created {
            let state = sheet.state.read().map_err(|_| sheet.poisoned())?;
            sheet.persist(&state)?;
        }
        Ok(sheet)
    }

    fn poisoned(&self) -> SheetError {
        SheetError::Poisoned(self.name.clone())
    }

    fn persist(&self, state: &SheetFile) -> SheetResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(sheet = %self.name, rows = state.rows.len(), "sheet persisted");
        Ok(())
    }

    fn mutate<F>(&self, f: F) -> SheetResult<()>
    where
        F: FnOnce(&mut Vec<Row>) -> SheetResult<()>,
    {
        let mut state = self.state.write().map_err(|_| self.poisoned())?;
        let mut rows = state.rows.clone();
        f(&mut rows)?;
        let next = SheetFile {
            header: state.header.clone(),
            rows,
        };
        self.persist(&next)?;
        *state = next;
        Ok(())
    }
}

impl RowStore for JsonFileSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> SheetResult<Row> {
        let state = self.state.read().map_err(|_| self.poisoned())?;
        Ok(state.header.clone())
    }

    fn rows(&self) -> SheetResult<Vec<Row>> {
        let state = self.state.read().map_err(|_| self.poisoned())?;
        Ok(state.rows.clone())
    }

    fn append_row(&self, row: Row) -> SheetResult<()> {
        self.mutate(|rows| {
            rows.push(row);
            Ok(())
        })
    }

    fn set_row(&self, index: usize, row: Row) -> SheetResult<()> {
        let sheet = self.name.clone();
        self.mutate(|rows| {
            let slot = rows
                .get_mut(index)
                .ok_or(SheetError::OutOfRange { sheet, index })?;
            *slot = row;
            Ok(())
        })
    }

    fn delete_row(&self, index: usize) -> SheetResult<()> {
        let sheet = self.name.clone();
        self.mutate(|rows| {
            if index >= rows.len() {
                return Err(SheetError::OutOfRange { sheet, index });
            }
            rows.remove(index);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medinv_inventory::Cell;

    #[test]
    fn rows_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");

        {
            let sheet = JsonFileSheet::open("inventory", &path, &["ID", "Name"]).unwrap();
            sheet.append_row(vec![Cell::text("OBJ_1"), Cell::text("Scale")]).unwrap();
            sheet.append_row(vec![Cell::text("OBJ_2"), Cell::text("Lamp")]).unwrap();
            sheet.delete_row(0).unwrap();
        }

        let reopened = JsonFileSheet::open("inventory", &path, &["ID", "Name"]).unwrap();
        let rows = reopened.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1].as_text(), "Lamp");
        assert_eq!(reopened.header().unwrap()[0].as_text(), "ID");
    }

    #[test]
    fn missing_file_is_created_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("transfers.json");

        JsonFileSheet::open("transfers", &path, &["ID"]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn failed_mutation_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = JsonFileSheet::open("inventory", dir.path().join("i.json"), &["ID"]).unwrap();
        sheet.append_row(vec![Cell::text("OBJ_1")]).unwrap();

        assert!(sheet.set_row(5, vec![Cell::text("OBJ_9")]).is_err());
        assert_eq!(sheet.rows().unwrap(), vec![vec![Cell::text("OBJ_1")]]);
    }
}
