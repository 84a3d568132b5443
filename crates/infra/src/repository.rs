//! Entity repositories over row stores.

use std::marker::PhantomData;
use std::sync::Arc;

use medinv_core::{DomainError, DomainResult, Entity};
use medinv_inventory::{Row, RowCodec};
use tracing::warn;

use crate::sheet::RowStore;

/// CRUD access to one entity table.
pub trait Repository<E: Entity>: Send + Sync {
    fn get_by_id(&self, id: &E::Id) -> DomainResult<Option<E>>;

    /// Every record that decodes; rows that don't are logged and skipped.
    fn get_all(&self) -> DomainResult<Vec<E>>;

    /// `(id, value)` of one column for every non-blank row, read without
    /// decoding the rest of the record.
    fn column_values(&self, column: usize) -> DomainResult<Vec<(String, String)>>;

    fn insert(&self, entity: &E) -> DomainResult<()>;

    /// Overwrite an existing record; `NotFound` when the id is absent.
    fn update(&self, entity: &E) -> DomainResult<()>;

    /// `NotFound` when the id is absent; other rows are left untouched.
    fn delete(&self, id: &E::Id) -> DomainResult<()>;
}

impl<E, R> Repository<E> for Arc<R>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    fn get_by_id(&self, id: &E::Id) -> DomainResult<Option<E>> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> DomainResult<Vec<E>> {
        (**self).get_all()
    }

    fn column_values(&self, column: usize) -> DomainResult<Vec<(String, String)>> {
        (**self).column_values(column)
    }

    fn insert(&self, entity: &E) -> DomainResult<()> {
        (**self).insert(entity)
    }

    fn update(&self, entity: &E) -> DomainResult<()> {
        (**self).update(entity)
    }

    fn delete(&self, id: &E::Id) -> DomainResult<()> {
        (**self).delete(id)
    }
}

/// Repository that scans a sheet linearly, matching on the first column.
#[derive(Debug)]
pub struct SheetRepository<E, S> {
    sheet: S,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> SheetRepository<E, S>
where
    E: Entity + RowCodec,
    S: RowStore,
{
    pub fn new(sheet: S) -> Self {
        Self {
            sheet,
            _entity: PhantomData,
        }
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    fn row_id(row: &Row) -> Option<String> {
        row.first()
            .map(|cell| cell.as_text())
            .filter(|id| !id.is_empty())
    }

    fn row_matches(row: &Row, id: &E::Id) -> bool {
        row.first().is_some_and(|cell| cell.as_text() == id.to_string())
    }

    fn position(&self, id: &E::Id) -> DomainResult<Option<usize>> {
        let rows = self.sheet.rows()?;
        Ok(rows.iter().position(|row| Self::row_matches(row, id)))
    }

    fn not_found(id: &E::Id) -> DomainError {
        DomainError::not_found(format!("{} {id}", E::KIND))
    }
}

impl<E, S> Repository<E> for SheetRepository<E, S>
where
    E: Entity + RowCodec,
    S: RowStore,
{
    fn get_by_id(&self, id: &E::Id) -> DomainResult<Option<E>> {
        let rows = self.sheet.rows()?;
        rows.iter()
            .find(|row| Self::row_matches(row, id))
            .map(|row| E::from_row(row))
            .transpose()
    }

    fn get_all(&self) -> DomainResult<Vec<E>> {
        let mut entities = Vec::new();
        for row in self.sheet.rows()? {
            let Some(id) = Self::row_id(&row) else {
                continue;
            };
            match E::from_row(&row) {
                Ok(entity) => entities.push(entity),
                Err(err) => warn!(
                    sheet = %self.sheet.name(),
                    row_id = %id,
                    error = %err,
                    "skipping undecodable row"
                ),
            }
        }
        Ok(entities)
    }

    fn column_values(&self, column: usize) -> DomainResult<Vec<(String, String)>> {
        Ok(self
            .sheet
            .rows()?
            .iter()
            .filter_map(|row| {
                let id = Self::row_id(row)?;
                let value = row.get(column).map(|cell| cell.as_text()).unwrap_or_default();
                Some((id, value))
            })
            .collect())
    }

    fn insert(&self, entity: &E) -> DomainResult<()> {
        self.sheet.append_row(entity.to_row())?;
        Ok(())
    }

    fn update(&self, entity: &E) -> DomainResult<()> {
        let index = self
            .position(entity.id())?
            .ok_or_else(|| Self::not_found(entity.id()))?;
        self.sheet.set_row(index, entity.to_row())?;
        Ok(())
    }

    fn delete(&self, id: &E::Id) -> DomainResult<()> {
        let index = self.position(id)?.ok_or_else(|| Self::not_found(id))?;
        self.sheet.delete_row(index)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use medinv_core::{Actor, ItemId};
    use medinv_inventory::{Cell, InventoryItem};

    use crate::sheet::InMemorySheet;

    fn repo() -> SheetRepository<InventoryItem, InMemorySheet> {
        SheetRepository::new(InMemorySheet::new("inventory", InventoryItem::COLUMNS))
    }

    fn item(code: &str) -> InventoryItem {
        InventoryItem::new("Scale", code, "Storage", &Actor::system(), Utc::now())
    }

    #[test]
    fn insert_then_find_by_id() {
        let repo = repo();
        let a = item("EO-AGE-001-0824");
        repo.insert(&a).unwrap();

        assert_eq!(repo.get_by_id(a.id()).unwrap(), Some(a));
        assert_eq!(repo.get_by_id(&ItemId::from("OBJ_missing")).unwrap(), None);
    }

    #[test]
    fn update_overwrites_in_place() {
        let repo = repo();
        let mut a = item("EO-AGE-001-0824");
        let b = item("EO-AGE-002-0824");
        repo.insert(&a).unwrap();
        repo.insert(&b).unwrap();

        a.name = "Renamed".into();
        repo.update(&a).unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all[0].name, "Renamed");
        assert_eq!(all[1], b);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let err = repo().update(&item("EO-AGE-001-0824")).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn delete_missing_id_leaves_rows_unchanged() {
        let repo = repo();
        repo.insert(&item("EO-AGE-001-0824")).unwrap();
        let before = repo.sheet().rows().unwrap();

        let err = repo.delete(&ItemId::from("OBJ_missing")).unwrap_err();
        assert_eq!(err.to_string(), "item OBJ_missing not found");
        assert_eq!(repo.sheet().rows().unwrap(), before);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let repo = repo();
        repo.insert(&item("EO-AGE-001-0824")).unwrap();
        repo.sheet().append_row(vec![Cell::Empty; 15]).unwrap();
        assert_eq!(repo.get_all().unwrap().len(), 1);
    }

    fn legacy_row(id: &str, code: &str) -> Row {
        let mut row = item(code).to_row();
        row[0] = Cell::text(id);
        row[4] = Cell::text("Disponible");
        row
    }

    #[test]
    fn undecodable_rows_are_skipped_by_scans() {
        let repo = repo();
        let good = item("EO-AGE-001-0824");
        repo.insert(&good).unwrap();
        repo.sheet().append_row(legacy_row("OBJ_legacy", "EO-AGE-002-0824")).unwrap();

        assert_eq!(repo.get_all().unwrap(), vec![good.clone()]);
        assert_eq!(repo.get_by_id(good.id()).unwrap(), Some(good));
        assert!(repo.get_by_id(&ItemId::from("OBJ_legacy")).is_err());
    }

    #[test]
    fn column_values_do_not_decode_rows() {
        let repo = repo();
        repo.insert(&item("EO-AGE-001-0824")).unwrap();
        repo.sheet().append_row(legacy_row("OBJ_legacy", "EO-AGE-002-0824")).unwrap();
        repo.sheet().append_row(vec![Cell::Empty; 15]).unwrap();

        let codes: Vec<String> = repo
            .column_values(InventoryItem::CODE_COLUMN)
            .unwrap()
            .into_iter()
            .map(|(_, code)| code)
            .collect();
        assert_eq!(codes, vec!["EO-AGE-001-0824", "EO-AGE-002-0824"]);
    }
}
