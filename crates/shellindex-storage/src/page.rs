//! Keyset pagination over a collection kept sorted by [`DocumentKey`].
//!
//! Each page is produced by one linear scan that applies the filter inline
//! and stops after `limit + 1` accepted entries. The extra entry is never
//! returned; it only proves that another page exists in the scan direction.

use serde::{Deserialize, Serialize};
use shellindex_core::{DocumentKey, StoredDocument};
use std::collections::BTreeMap;
use std::ops::Bound::{self, Excluded, Unbounded};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum Cursor {
    First,
    Last,
    /// Page starting behind this key, exclusive.
    After(DocumentKey),
    /// Page ending before this key, exclusive.
    Before(DocumentKey),
}

impl Cursor {
    pub fn label(&self) -> &'static str {
        match self {
            Cursor::First => "first",
            Cursor::Last => "last",
            Cursor::After(_) => "next",
            Cursor::Before(_) => "previous",
        }
    }
}

/// One page of documents in ascending key order.
///
/// `previous` / `next` are `None` exactly when the page touches the first /
/// last matching document. When set they name a document beyond the page
/// boundary; to continue, request [`Page::next_cursor`] or
/// [`Page::previous_cursor`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub documents: Vec<T>,
    pub previous: Option<DocumentKey>,
    pub next: Option<DocumentKey>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            previous: None,
            next: None,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            documents: self.documents.into_iter().map(f).collect(),
            previous: self.previous,
            next: self.next,
        }
    }
}

pub trait Keyed {
    fn key(&self) -> &DocumentKey;
}

impl Keyed for StoredDocument {
    fn key(&self) -> &DocumentKey {
        &self.document.key
    }
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn key(&self) -> &DocumentKey {
        (**self).key()
    }
}

impl<T: Keyed + ?Sized> Keyed for Arc<T> {
    fn key(&self) -> &DocumentKey {
        (**self).key()
    }
}

impl<T: Keyed> Page<T> {
    /// Continues behind the last returned document. An empty page that still
    /// reports `next` (a `Before` cursor with no match ahead of its key)
    /// continues from the first page, which then holds every match behind it.
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.next.as_ref()?;
        Some(match self.documents.last() {
            Some(d) => Cursor::After(d.key().clone()),
            None => Cursor::First,
        })
    }

    /// Mirror of [`Page::next_cursor`]; an empty `After` page leads back to
    /// the last page.
    pub fn previous_cursor(&self) -> Option<Cursor> {
        self.previous.as_ref()?;
        Some(match self.documents.first() {
            Some(d) => Cursor::Before(d.key().clone()),
            None => Cursor::Last,
        })
    }
}

type Window<'a, V> = Vec<(&'a DocumentKey, &'a V)>;

/// Computes the page selected by `cursor`. `accept` is the inline filter;
/// a `limit` of zero is treated as one.
///
/// An `After` cursor with nothing behind it yields the last page, a
/// `Before` cursor with nothing ahead of it yields the first page.
pub fn scan<'a, V, F>(
    entries: &'a BTreeMap<DocumentKey, V>,
    cursor: &Cursor,
    limit: usize,
    mut accept: F,
) -> Page<&'a V>
where
    F: FnMut(&V) -> bool,
{
    let limit = limit.max(1);
    if entries.is_empty() {
        return Page::empty();
    }
    match cursor {
        Cursor::First => first_page(entries, limit, &mut accept),
        Cursor::Last => last_page(entries, limit, &mut accept),
        Cursor::After(key) => {
            let bounds: (Bound<&DocumentKey>, Bound<&DocumentKey>) = (Excluded(key), Unbounded);
            if entries.range(bounds).next().is_none() {
                return last_page(entries, limit, &mut accept);
            }
            let mut window = collect(entries.range(bounds), limit, &mut accept);
            let next = overflow_tail(&mut window, limit);
            finish(window, Some(key.clone()), next)
        }
        Cursor::Before(key) => {
            let bounds: (Bound<&DocumentKey>, Bound<&DocumentKey>) = (Unbounded, Excluded(key));
            if entries.range(bounds).next_back().is_none() {
                return first_page(entries, limit, &mut accept);
            }
            let mut window = collect(entries.range(bounds).rev(), limit, &mut accept);
            window.reverse();
            let previous = overflow_head(&mut window, limit);
            finish(window, previous, Some(key.clone()))
        }
    }
}

fn first_page<'a, V, F>(entries: &'a BTreeMap<DocumentKey, V>, limit: usize, accept: &mut F) -> Page<&'a V>
where
    F: FnMut(&V) -> bool,
{
    let mut window = collect(entries.iter(), limit, accept);
    let next = overflow_tail(&mut window, limit);
    finish(window, None, next)
}

fn last_page<'a, V, F>(entries: &'a BTreeMap<DocumentKey, V>, limit: usize, accept: &mut F) -> Page<&'a V>
where
    F: FnMut(&V) -> bool,
{
    let mut window = collect(entries.iter().rev(), limit, accept);
    window.reverse();
    let previous = overflow_head(&mut window, limit);
    finish(window, previous, None)
}

fn collect<'a, V, I, F>(iter: I, limit: usize, accept: &mut F) -> Window<'a, V>
where
    I: Iterator<Item = (&'a DocumentKey, &'a V)>,
    F: FnMut(&V) -> bool,
{
    let mut window = Vec::with_capacity(limit + 1);
    for (key, value) in iter {
        if accept(value) {
            window.push((key, value));
            if window.len() > limit {
                break;
            }
        }
    }
    window
}

fn overflow_tail<V>(window: &mut Window<'_, V>, limit: usize) -> Option<DocumentKey> {
    if window.len() > limit {
        window.pop().map(|(key, _)| key.clone())
    } else {
        None
    }
}

fn overflow_head<V>(window: &mut Window<'_, V>, limit: usize) -> Option<DocumentKey> {
    if window.len() > limit {
        Some(window.remove(0).0.clone())
    } else {
        None
    }
}

fn finish<'a, V>(
    window: Window<'a, V>,
    previous: Option<DocumentKey>,
    next: Option<DocumentKey>,
) -> Page<&'a V> {
    Page {
        documents: window.into_iter().map(|(_, v)| v).collect(),
        previous,
        next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(ids: &[&str]) -> BTreeMap<DocumentKey, String> {
        ids.iter()
            .map(|id| (DocumentKey::new("ep", *id), id.to_string()))
            .collect()
    }

    fn ids(page: &Page<&String>) -> Vec<String> {
        page.documents.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_collection_yields_empty_page_for_every_cursor() {
        let entries = collection(&[]);
        for cursor in [
            Cursor::First,
            Cursor::Last,
            Cursor::After(DocumentKey::new("ep", "1")),
            Cursor::Before(DocumentKey::new("ep", "1")),
        ] {
            let page = scan(&entries, &cursor, 3, |_| true);
            assert_eq!(page, Page::empty(), "{cursor:?}");
        }
    }

    #[test]
    fn first_page_probes_one_beyond_limit() {
        let entries = collection(&["111", "222", "333", "444", "555", "666"]);
        let page = scan(&entries, &Cursor::First, 2, |id| id.as_str() >= "444");
        assert_eq!(ids(&page), ["444", "555"]);
        assert_eq!(page.previous, None);
        assert_eq!(page.next, Some(DocumentKey::new("ep", "666")));
    }

    #[test]
    fn last_page_is_returned_ascending() {
        let entries = collection(&["1", "2", "3", "4", "5"]);
        let page = scan(&entries, &Cursor::Last, 2, |_| true);
        assert_eq!(ids(&page), ["4", "5"]);
        assert_eq!(page.previous, Some(DocumentKey::new("ep", "3")));
        assert_eq!(page.next, None);
    }

    #[test]
    fn after_vouches_for_previous_unconditionally() {
        let entries = collection(&["1", "2", "3", "4", "5"]);
        let page = scan(&entries, &Cursor::After(DocumentKey::new("ep", "2")), 2, |_| true);
        assert_eq!(ids(&page), ["3", "4"]);
        assert_eq!(page.previous, Some(DocumentKey::new("ep", "2")));
        assert_eq!(page.next, Some(DocumentKey::new("ep", "5")));
    }

    #[test]
    fn before_takes_overflow_from_reversed_head() {
        let entries = collection(&["1", "2", "3", "4", "5"]);
        let page = scan(&entries, &Cursor::Before(DocumentKey::new("ep", "4")), 2, |_| true);
        assert_eq!(ids(&page), ["2", "3"]);
        assert_eq!(page.previous, Some(DocumentKey::new("ep", "1")));
        assert_eq!(page.next, Some(DocumentKey::new("ep", "4")));
    }

    #[test]
    fn stale_cursors_fall_back_to_edge_pages() {
        let entries = collection(&["1", "2", "3"]);
        let page = scan(&entries, &Cursor::After(DocumentKey::new("ep", "9")), 2, |_| true);
        assert_eq!(ids(&page), ["2", "3"]);
        assert_eq!(page.next, None);
        let page = scan(&entries, &Cursor::Before(DocumentKey::new("ap", "1")), 2, |_| true);
        assert_eq!(ids(&page), ["1", "2"]);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn empty_pages_still_lead_back() {
        let entries = collection(&["1", "2", "3", "4", "5"]);
        let low = |id: &String| id.as_str() <= "2";
        let page = scan(&entries, &Cursor::After(DocumentKey::new("ep", "3")), 2, low);
        assert!(page.documents.is_empty());
        assert_eq!(page.previous, Some(DocumentKey::new("ep", "3")));
        assert_eq!(page.next_cursor(), None);
        let back = page.previous_cursor().unwrap();
        assert_eq!(back, Cursor::Last);
        assert_eq!(ids(&scan(&entries, &back, 2, low)), ["1", "2"]);

        let high = |id: &String| id.as_str() >= "4";
        let page = scan(&entries, &Cursor::Before(DocumentKey::new("ep", "3")), 2, high);
        assert!(page.documents.is_empty());
        assert_eq!(page.previous_cursor(), None);
        let forward = page.next_cursor().unwrap();
        assert_eq!(forward, Cursor::First);
        assert_eq!(ids(&scan(&entries, &forward, 2, high)), ["4", "5"]);
    }

    #[test]
    fn zero_limit_behaves_like_one() {
        let entries = collection(&["1", "2"]);
        let page = scan(&entries, &Cursor::First, 0, |_| true);
        assert_eq!(ids(&page), ["1"]);
        assert_eq!(page.next, Some(DocumentKey::new("ep", "2")));
    }
}
