//! Row-oriented table storage.
//!
//! A sheet holds one header row plus data rows. Rows are addressed by their
//! zero-based position among the data rows; removing a row shifts every row
//! after it, so positions are only stable while the caller holds the
//! service's write lock.

pub mod file;

use std::sync::{Arc, RwLock};

use medinv_core::DomainError;
use medinv_inventory::{Cell, Row};

pub use file::JsonFileSheet;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("sheet {sheet}: row {index} out of range")]
    OutOfRange { sheet: String, index: usize },

    #[error("sheet {0}: lock poisoned")]
    Poisoned(String),

    #[error("sheet io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sheet encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<SheetError> for DomainError {
    fn from(err: SheetError) -> Self {
        DomainError::storage(err.to_string())
    }
}

pub type SheetResult<T> = Result<T, SheetError>;

/// Storage abstraction for one table.
pub trait RowStore: Send + Sync {
    fn name(&self) -> &str;

    fn header(&self) -> SheetResult<Row>;

    /// All data rows, header excluded, in storage order.
    fn rows(&self) -> SheetResult<Vec<Row>>;

    fn append_row(&self, row: Row) -> SheetResult<()>;

    /// Overwrite the data row at `index` in place.
    fn set_row(&self, index: usize, row: Row) -> SheetResult<()>;

    fn delete_row(&self, index: usize) -> SheetResult<()>;
}

impl<S> RowStore for Arc<S>
where
    S: RowStore + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn header(&self) -> SheetResult<Row> {
        (**self).header()
    }

    fn rows(&self) -> SheetResult<Vec<Row>> {
        (**self).rows()
    }

    fn append_row(&self, row: Row) -> SheetResult<()> {
        (**self).append_row(row)
    }

    fn set_row(&self, index: usize, row: Row) -> SheetResult<()> {
        (**self).set_row(index, row)
    }

    fn delete_row(&self, index: usize) -> SheetResult<()> {
        (**self).delete_row(index)
    }
}

pub(crate) fn header_row(columns: &[&str]) -> Row {
    columns.iter().map(|c| Cell::text(*c)).collect()
}

/// In-memory sheet for tests/dev.
#[derive(Debug)]
pub struct InMemorySheet {
    name: String,
    header: Row,
    rows: RwLock<Vec<Row>>,
}

impl InMemorySheet {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            header: header_row(columns),
            rows: RwLock::new(Vec::new()),
        }
    }

    fn poisoned(&self) -> SheetError {
        SheetError::Poisoned(self.name.clone())
    }

    fn out_of_range(&self, index: usize) -> SheetError {
        SheetError::OutOfRange {
            sheet: self.name.clone(),
            index,
        }
    }
}

impl RowStore for InMemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> SheetResult<Row> {
        Ok(self.header.clone())
    }

    fn rows(&self) -> SheetResult<Vec<Row>> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.clone())
    }

    fn append_row(&self, row: Row) -> SheetResult<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        rows.push(row);
        Ok(())
    }

    fn set_row(&self, index: usize, row: Row) -> SheetResult<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        let slot = rows.get_mut(index).ok_or_else(|| self.out_of_range(index))?;
        *slot = row;
        Ok(())
    }

    fn delete_row(&self, index: usize) -> SheetResult<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        if index >= rows.len() {
            return Err(self.out_of_range(index));
        }
        rows.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> Row {
        vec![Cell::text(id), Cell::Bool(true)]
    }

    #[test]
    fn header_is_kept_apart_from_data_rows() {
        let sheet = InMemorySheet::new("inventory", &["ID", "Flag"]);
        assert_eq!(sheet.header().unwrap(), vec![Cell::text("ID"), Cell::text("Flag")]);
        assert!(sheet.rows().unwrap().is_empty());
    }

    #[test]
    fn set_and_delete_address_data_rows() {
        let sheet = InMemorySheet::new("inventory", &["ID", "Flag"]);
        sheet.append_row(row("a")).unwrap();
        sheet.append_row(row("b")).unwrap();
        sheet.append_row(row("c")).unwrap();

        sheet.set_row(1, row("B")).unwrap();
        sheet.delete_row(0).unwrap();

        let ids: Vec<String> = sheet.rows().unwrap().iter().map(|r| r[0].as_text()).collect();
        assert_eq!(ids, vec!["B", "c"]);
    }

    #[test]
    fn out_of_range_rows_are_errors() {
        let sheet = InMemorySheet::new("transfers", &["ID"]);
        assert!(matches!(sheet.set_row(0, row("x")), Err(SheetError::OutOfRange { index: 0, .. })));
        assert!(sheet.delete_row(3).is_err());
    }

    #[test]
    fn sheet_errors_surface_as_storage_errors() {
        let err: DomainError = SheetError::Poisoned("inventory".into()).into();
        assert_eq!(err.kind(), "storage_error");
    }
}
