use shellindex_core::{parse, Document, DocumentKey, Element, ValueType};
use shellindex_storage::{Cursor, InMemoryStore, PageRequest, Storage};

fn shell(id: &str, id_short: &str) -> Document {
    Document {
        key: DocumentKey::new("plant", id),
        id_short: id_short.to_string(),
        asset_id: None,
        thumbnail: None,
        submodels: Vec::new(),
    }
}

fn ids<T: AsRef<shellindex_core::StoredDocument>>(documents: &[T]) -> Vec<String> {
    documents.iter().map(|d| d.as_ref().document.key.id.clone()).collect()
}

async fn store_of(docs: Vec<Document>) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.load(docs).unwrap();
    store
}

fn numbered(n: usize) -> Vec<Document> {
    (0..n).map(|i| shell(&format!("{i:03}"), &format!("shell{i}"))).collect()
}

#[tokio::test]
async fn filtered_first_page_reports_overflow_as_next() {
    let store = store_of(vec![
        shell("111", "name1"),
        shell("222", "name2"),
        shell("333", "name3"),
        shell("444", "name4"),
        shell("555", "name45"),
        shell("666", "name46"),
    ])
    .await;
    let query = parse("name4", "en").unwrap();
    let page = store
        .page(PageRequest::first(2).with_query(Some(query.clone())))
        .await
        .unwrap();
    assert_eq!(ids(&page.documents), ["444", "555"]);
    assert_eq!(page.previous, None);
    assert_eq!(page.next, Some(DocumentKey::new("plant", "666")));

    let cursor = page.next_cursor().unwrap();
    let page = store
        .page(PageRequest::first(2).with_query(Some(query)).with_cursor(cursor))
        .await
        .unwrap();
    assert_eq!(ids(&page.documents), ["666"]);
    assert_eq!(page.next, None);
    assert!(page.previous.is_some());
}

#[tokio::test]
async fn forward_and_backward_walks_cover_collection_once() {
    for (n, limit) in [(1, 1), (5, 2), (6, 3), (7, 3), (10, 4), (4, 10)] {
        let docs = numbered(n);
        let expected: Vec<String> = docs.iter().map(|d| d.key.id.clone()).collect();
        let store = store_of(docs).await;

        let mut forward = Vec::new();
        let mut request = PageRequest::first(limit);
        loop {
            let page = store.page(request.clone()).await.unwrap();
            forward.extend(ids(&page.documents));
            match page.next_cursor() {
                Some(cursor) => request = request.with_cursor(cursor),
                None => break,
            }
        }
        assert_eq!(forward, expected, "forward n={n} limit={limit}");

        let mut backward = Vec::new();
        let mut request = PageRequest::first(limit).with_cursor(Cursor::Last);
        loop {
            let page = store.page(request.clone()).await.unwrap();
            backward.extend(ids(&page.documents).into_iter().rev());
            match page.previous_cursor() {
                Some(cursor) => request = request.with_cursor(cursor),
                None => break,
            }
        }
        let mut reversed = expected.clone();
        reversed.reverse();
        assert_eq!(backward, reversed, "backward n={n} limit={limit}");
    }
}

#[tokio::test]
async fn single_page_collection_has_no_neighbours() {
    let store = store_of(numbered(3)).await;
    for limit in [3, 4, 50] {
        let page = store.page(PageRequest::first(limit)).await.unwrap();
        assert_eq!(page.documents.len(), 3);
        assert_eq!(page.previous, None);
        assert_eq!(page.next, None);
    }
}

#[tokio::test]
async fn filter_traversal_never_leaks_non_matches() {
    // matches clustered at both ends and one in the middle
    let docs: Vec<Document> = (0..12)
        .map(|i| {
            let label = if [0, 1, 6, 10, 11].contains(&i) { "pump" } else { "valve" };
            shell(&format!("{i:02}"), &format!("{label}-{i}"))
        })
        .collect();
    let store = store_of(docs).await;
    let query = parse("pump", "en").unwrap();

    let mut seen = Vec::new();
    let mut request = PageRequest::first(2).with_query(Some(query));
    loop {
        let page = store.page(request.clone()).await.unwrap();
        assert!(page.documents.iter().all(|d| d.document.id_short.starts_with("pump")));
        seen.extend(ids(&page.documents));
        match page.next_cursor() {
            Some(cursor) => request = request.with_cursor(cursor),
            None => break,
        }
    }
    assert_eq!(seen, ["00", "01", "06", "10", "11"]);

    let mut seen = Vec::new();
    let mut request = request.with_cursor(Cursor::Last);
    loop {
        let page = store.page(request.clone()).await.unwrap();
        assert!(page.documents.iter().all(|d| d.document.id_short.starts_with("pump")));
        seen.extend(ids(&page.documents).into_iter().rev());
        match page.previous_cursor() {
            Some(cursor) => request = request.with_cursor(cursor),
            None => break,
        }
    }
    assert_eq!(seen, ["11", "10", "06", "01", "00"]);
}

#[tokio::test]
async fn structural_predicates_see_element_records() {
    let mut heavy = shell("1", "motor-a");
    heavy.submodels = vec![Element::Submodel {
        id_short: "TechnicalData".into(),
        id: None,
        submodel_elements: vec![Element::Property {
            id_short: "MaxPower".into(),
            value_type: Some(ValueType::Double),
            value: Some("5000.0000005".into()),
        }],
    }];
    let mut light = shell("2", "motor-b");
    light.submodels = vec![Element::Submodel {
        id_short: "TechnicalData".into(),
        id: None,
        submodel_elements: vec![Element::Property {
            id_short: "MaxPower".into(),
            value_type: Some(ValueType::Double),
            value: Some("750".into()),
        }],
    }];
    let store = store_of(vec![heavy, light]).await;

    let query = parse("#Prop:MaxPower=5000", "en").unwrap();
    let page = store
        .page(PageRequest::first(10).with_query(Some(query)))
        .await
        .unwrap();
    assert_eq!(ids(&page.documents), ["1"]);

    let query = parse("motor && #Prop:MaxPower<1000", "en").unwrap();
    let page = store
        .page(PageRequest::first(10).with_query(Some(query)))
        .await
        .unwrap();
    assert_eq!(ids(&page.documents), ["2"]);
}

#[tokio::test]
async fn replaced_document_is_rescanned_with_new_elements() {
    let store = InMemoryStore::new();
    let mut doc = shell("1", "sensor");
    doc.submodels = vec![Element::Property {
        id_short: "Range".into(),
        value_type: Some(ValueType::Int),
        value: Some("10".into()),
    }];
    store.put(doc.clone()).await.unwrap();
    doc.submodels = vec![Element::Property {
        id_short: "Range".into(),
        value_type: Some(ValueType::Int),
        value: Some("20".into()),
    }];
    store.put(doc).await.unwrap();

    let records = store.elements(&DocumentKey::new("plant", "1")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value.as_deref(), Some("20"));

    let query = parse("#Prop:Range=10", "en").unwrap();
    let page = store
        .page(PageRequest::first(5).with_query(Some(query)))
        .await
        .unwrap();
    assert!(page.documents.is_empty());
}
