use crate::database::models::LibraryList;
use crate::database::{collections, Store};
use crate::error::AppResult;

#[derive(Clone)]
pub struct LibraryRepository {
    store: Store,
}

impl LibraryRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn get(&self, category: &str) -> AppResult<LibraryList> {
        match self.store.get(collections::LIBRARIES, category).await? {
            Some(doc) => LibraryList::from_document(&doc),
            None => Ok(LibraryList {
                category: category.to_string(),
                entries: Vec::new(),
            }),
        }
    }

    pub async fn put(&self, category: &str, entries: Vec<String>) -> AppResult<LibraryList> {
        let list = LibraryList {
            category: category.to_string(),
            entries,
        };
        self.store
            .upsert(collections::LIBRARIES, list.to_document())
            .await?;
        Ok(list)
    }
}
