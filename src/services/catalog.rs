use std::sync::Arc;

use crate::{
    db::{CatalogReader, CatalogWriter, HistoryReader, HistoryWriter},
    error::{AppError, AppResult},
    models::{HistoryEntry, Item, ItemId},
};

/// Item management and per-user view history
pub struct CatalogService {
    reader: Arc<dyn CatalogReader>,
    writer: Arc<dyn CatalogWriter>,
    history_reader: Arc<dyn HistoryReader>,
    history_writer: Arc<dyn HistoryWriter>,
}

impl CatalogService {
    pub fn new(
        reader: Arc<dyn CatalogReader>,
        writer: Arc<dyn CatalogWriter>,
        history_reader: Arc<dyn HistoryReader>,
        history_writer: Arc<dyn HistoryWriter>,
    ) -> Self {
        Self {
            reader,
            writer,
            history_reader,
            history_writer,
        }
    }

    pub async fn create_item(&self, title: &str, year: i32) -> AppResult<Item> {
        let item = self.writer.insert_item(title, year).await?;
        tracing::info!(item_id = item.id(), title = item.title(), "Item created");
        Ok(item)
    }

    /// Direct lookup; unlike similarity queries a missing item is an error here
    pub async fn get_item(&self, id: ItemId) -> AppResult<Item> {
        self.reader
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    pub async fn update_title(&self, id: ItemId, title: &str) -> AppResult<Item> {
        self.writer
            .update_title(id, title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    pub async fn delete_item(&self, id: ItemId) -> AppResult<()> {
        if !self.writer.delete_item(id).await? {
            return Err(AppError::NotFound(format!("item {}", id)));
        }
        tracing::info!(item_id = id, "Item deleted");
        Ok(())
    }

    pub async fn list_items(&self) -> AppResult<Vec<Item>> {
        self.reader.list_items().await
    }

    /// The first `n` items by id
    pub async fn top_n_items(&self, n: usize) -> AppResult<Vec<Item>> {
        let mut items = self.reader.list_items().await?;
        items.truncate(n);
        Ok(items)
    }

    pub async fn record_view(&self, user_id: &str, item_id: ItemId) -> AppResult<HistoryEntry> {
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidInput("User id must not be empty".to_string()));
        }
        self.get_item(item_id).await?;

        let entry = HistoryEntry::now(user_id, item_id);
        self.history_writer.record_view(entry.clone()).await?;
        Ok(entry)
    }

    /// Total title length over everything the user has viewed.
    /// Entries pointing at deleted items count as zero.
    pub async fn sum_title_length(&self, user_id: &str) -> AppResult<usize> {
        let mut total = 0;
        for item_id in self.history_reader.interacted_item_ids(user_id).await? {
            match self.reader.get_item(item_id).await? {
                Some(item) => total += item.derived_length(),
                None => tracing::debug!(user_id, item_id, "History references a missing item"),
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryMediaStore;

    fn service() -> CatalogService {
        let store = Arc::new(InMemoryMediaStore::new());
        CatalogService::new(store.clone(), store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn test_get_missing_item_is_not_found() {
        let catalog = service();
        assert!(matches!(
            catalog.get_item(3).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_title_recomputes_length() {
        let catalog = service();
        let item = catalog.create_item("Up", 2009).await.unwrap();
        let updated = catalog.update_title(item.id(), "Inside Out").await.unwrap();
        assert_eq!(updated.derived_length(), 10);
        assert_eq!(catalog.get_item(item.id()).await.unwrap().derived_length(), 10);
        assert!(matches!(
            catalog.update_title(99, "Soul").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let catalog = service();
        assert!(matches!(
            catalog.create_item("", 2000).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_top_n_items_by_id() {
        let catalog = service();
        for (title, year) in [("A", 2001), ("B", 2002), ("C", 2003)] {
            catalog.create_item(title, year).await.unwrap();
        }
        let top: Vec<_> = catalog
            .top_n_items(2)
            .await
            .unwrap()
            .iter()
            .map(|item| item.id())
            .collect();
        assert_eq!(top, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_sum_title_length_tolerates_deleted_items() {
        let catalog = service();
        let alien = catalog.create_item("Alien", 1979).await.unwrap();
        let heat = catalog.create_item("Heat", 1995).await.unwrap();

        catalog.record_view("user1", alien.id()).await.unwrap();
        catalog.record_view("user1", heat.id()).await.unwrap();
        catalog.record_view("user1", heat.id()).await.unwrap();
        assert_eq!(catalog.sum_title_length("user1").await.unwrap(), 13);

        catalog.delete_item(heat.id()).await.unwrap();
        assert_eq!(catalog.sum_title_length("user1").await.unwrap(), 5);
        assert_eq!(catalog.sum_title_length("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_view_requires_item() {
        let catalog = service();
        assert!(matches!(
            catalog.record_view("user1", 8).await,
            Err(AppError::NotFound(_))
        ));
    }
}
