use crate::page::{self, Page};
use crate::traits::{PageRequest, Storage};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus::{register_histogram_vec, HistogramVec};
use shellindex_core::{
    Document, DocumentKey, ElementRecord, IndexError, Result, StoredDocument,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

static PAGE_SCAN_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "shell_page_scan_seconds",
        "Latency of one filtered page scan",
        &["cursor", "filtered"]
    )
    .expect("page scan histogram registers once")
});

/// Catalog kept entirely in memory, ordered by `(endpoint, id)`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    documents: BTreeMap<DocumentKey, Entry>,
}

struct Entry {
    document: Arc<StoredDocument>,
    // projection is rebuilt on every put, never patched
    elements: Arc<[ElementRecord]>,
}

impl Entry {
    fn build(document: Document) -> Self {
        let elements: Arc<[ElementRecord]> = document.element_records().into();
        Self {
            document: Arc::new(StoredDocument::new(document)),
            elements,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk load used at startup. Later documents replace earlier ones with
    /// the same key.
    pub fn load<I>(&self, documents: I) -> Result<usize>
    where
        I: IntoIterator<Item = Document>,
    {
        let entries = documents
            .into_iter()
            .map(|d| validate(&d.key).map(|_| Entry::build(d)))
            .collect::<Result<Vec<_>>>()?;
        let count = entries.len();
        let mut inner = self.inner.write();
        for entry in entries {
            inner.documents.insert(entry.document.key().clone(), entry);
        }
        debug!(count, total = inner.documents.len(), "loaded documents");
        Ok(count)
    }
}

fn validate(key: &DocumentKey) -> Result<()> {
    if key.endpoint.trim().is_empty() {
        return Err(IndexError::Invalid("endpoint must not be empty".into()));
    }
    if key.id.trim().is_empty() {
        return Err(IndexError::Invalid("id must not be empty".into()));
    }
    Ok(())
}

#[async_trait::async_trait]
impl Storage for InMemoryStore {
    async fn put(&self, document: Document) -> Result<Arc<StoredDocument>> {
        validate(&document.key)?;
        let entry = Entry::build(document);
        let stored = entry.document.clone();
        let replaced = self
            .inner
            .write()
            .documents
            .insert(stored.key().clone(), entry)
            .is_some();
        debug!(key = %stored.key(), revision = %stored.revision, replaced, "stored document");
        Ok(stored)
    }

    async fn get(&self, key: &DocumentKey) -> Result<Arc<StoredDocument>> {
        let inner = self.inner.read();
        inner
            .documents
            .get(key)
            .map(|e| e.document.clone())
            .ok_or(IndexError::NotFound)
    }

    async fn elements(&self, key: &DocumentKey) -> Result<Arc<[ElementRecord]>> {
        let inner = self.inner.read();
        inner
            .documents
            .get(key)
            .map(|e| e.elements.clone())
            .ok_or(IndexError::NotFound)
    }

    async fn delete(&self, key: &DocumentKey) -> Result<()> {
        let removed = self.inner.write().documents.remove(key);
        match removed {
            Some(_) => {
                debug!(%key, "deleted document");
                Ok(())
            }
            None => Err(IndexError::NotFound),
        }
    }

    async fn page(&self, request: PageRequest) -> Result<Page<Arc<StoredDocument>>> {
        let started = Instant::now();
        let PageRequest {
            cursor,
            limit,
            query,
            endpoint,
        } = request;
        let structural = query
            .as_ref()
            .map(|q| q.has_structural_predicates())
            .unwrap_or(false);
        let inner = self.inner.read();
        let result = page::scan(&inner.documents, &cursor, limit, |entry| {
            let document = &entry.document.document;
            if let Some(endpoint) = &endpoint {
                if &document.key.endpoint != endpoint {
                    return false;
                }
            }
            match &query {
                None => true,
                Some(q) if structural => q.matches(document, &entry.elements),
                Some(q) => q.matches(document, &[]),
            }
        })
        .map(|entry| entry.document.clone());
        drop(inner);

        PAGE_SCAN_SECONDS
            .with_label_values(&[cursor.label(), if query.is_some() { "true" } else { "false" }])
            .observe(started.elapsed().as_secs_f64());
        debug!(
            cursor = cursor.label(),
            limit,
            returned = result.documents.len(),
            has_previous = result.previous.is_some(),
            has_next = result.next.is_some(),
            "page scanned"
        );
        Ok(result)
    }

    fn len(&self) -> usize {
        self.inner.read().documents.len()
    }

    fn all_documents(&self) -> Vec<Arc<StoredDocument>> {
        self.inner
            .read()
            .documents
            .values()
            .map(|e| e.document.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Cursor;

    fn doc(endpoint: &str, id: &str) -> Document {
        Document {
            key: DocumentKey::new(endpoint, id),
            id_short: format!("shell-{id}"),
            asset_id: None,
            thumbnail: None,
            submodels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn put_replaces_and_revision_tracks_content() {
        let store = InMemoryStore::new();
        let first = store.put(doc("ep", "1")).await.unwrap();
        let same = store.put(doc("ep", "1")).await.unwrap();
        assert_eq!(first.revision, same.revision);

        let mut changed = doc("ep", "1");
        changed.id_short = "renamed".into();
        let second = store.put(changed).await.unwrap();
        assert_ne!(first.revision, second.revision);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn blank_keys_are_rejected() {
        let store = InMemoryStore::new();
        let err = store.put(doc(" ", "1")).await.unwrap_err();
        assert!(matches!(err, IndexError::Invalid(_)));
        let err = store.put(doc("ep", "")).await.unwrap_err();
        assert!(matches!(err, IndexError::Invalid(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = InMemoryStore::new();
        store.put(doc("ep", "1")).await.unwrap();
        store.delete(&DocumentKey::new("ep", "1")).await.unwrap();
        let err = store.delete(&DocumentKey::new("ep", "1")).await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound));
        assert!(matches!(
            store.get(&DocumentKey::new("ep", "1")).await,
            Err(IndexError::NotFound)
        ));
    }

    #[tokio::test]
    async fn endpoint_restriction_applies_inside_scan() {
        let store = InMemoryStore::new();
        store
            .load(vec![doc("a", "1"), doc("b", "1"), doc("a", "2"), doc("b", "2")])
            .unwrap();
        let page = store
            .page(PageRequest::first(1).with_endpoint(Some("b".into())))
            .await
            .unwrap();
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.documents[0].key(), &DocumentKey::new("b", "1"));
        assert_eq!(page.next, Some(DocumentKey::new("b", "2")));

        let page = store
            .page(
                PageRequest::first(1)
                    .with_endpoint(Some("b".into()))
                    .with_cursor(Cursor::Last),
            )
            .await
            .unwrap();
        assert_eq!(page.documents[0].key(), &DocumentKey::new("b", "2"));
        assert_eq!(page.previous, Some(DocumentKey::new("b", "1")));
    }
}
