use crate::page::{Cursor, Page};
use shellindex_core::{Document, DocumentKey, ElementRecord, Expression, Result, StoredDocument};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub cursor: Cursor,
    pub limit: usize,
    pub query: Option<Expression>,
    // restricts the scan to one endpoint
    pub endpoint: Option<String>,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: Cursor::First,
            limit,
            query: None,
            endpoint: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_query(mut self, query: Option<Expression>) -> Self {
        self.query = query;
        self
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Inserts or replaces the document under its key.
    async fn put(&self, document: Document) -> Result<Arc<StoredDocument>>;
    async fn get(&self, key: &DocumentKey) -> Result<Arc<StoredDocument>>;
    /// Element projection of a stored document, in depth-first order.
    async fn elements(&self, key: &DocumentKey) -> Result<Arc<[ElementRecord]>>;
    async fn delete(&self, key: &DocumentKey) -> Result<()>;
    async fn page(&self, request: PageRequest) -> Result<Page<Arc<StoredDocument>>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Export all documents in key order (for dumps)
    fn all_documents(&self) -> Vec<Arc<StoredDocument>> {
        Vec::new()
    }
}
