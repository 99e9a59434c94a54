use engine::service::EMPTY_QUERY_STATUS;
use engine::{Item, Recommender, Vectorizer};

fn item(id: u64, title: &str, text: &str) -> Item {
    Item { id, title: title.into(), text: text.into(), image_ref: Some(format!("/{id}.jpg")) }
}

fn three() -> Recommender {
    let items = vec![
        item(1, "Alpha", "space adventure action 2001"),
        item(2, "Beta", "space adventure drama 2002"),
        item(3, "Gamma", "cooking competition reality 2010"),
    ];
    Recommender::from_items(&items, &Vectorizer::default()).unwrap()
}

#[test]
fn closest_item_ranks_first() {
    let r = three();
    let out = r.recommend("Alpha", 1);
    assert_eq!(out.items.len(), 1);
    assert_eq!(out.items[0].id, 2);
    assert_eq!(out.items[0].title, "Beta");
    assert_eq!(out.items[0].image_ref.as_deref(), Some("/2.jpg"));
    assert_eq!(out.status, "Recommendations for 'Alpha'");

    let out = r.recommend("Alpha", 2);
    let ids: Vec<u64> = out.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert!(out.items[0].score > out.items[1].score);
}

#[test]
fn empty_query_status() {
    let out = three().recommend("", 5);
    assert!(out.items.is_empty());
    assert_eq!(out.status, EMPTY_QUERY_STATUS);
    assert_eq!(out.status, "please enter a title");
    assert!(three().recommend("   ", 5).items.is_empty());
}

#[test]
fn not_found_names_query() {
    let out = three().recommend("Nonexistent Title", 5);
    assert!(out.items.is_empty());
    assert!(out.status.contains("Nonexistent Title"));
    assert_eq!(out.matched, None);
}

#[test]
fn n_is_clamped() {
    let r = three();
    assert_eq!(r.recommend("Alpha", 100).items.len(), 2);
    assert_eq!(r.recommend("Alpha", 0).items.len(), 1);
    assert!(r.recommend("Alpha", 100).items.iter().all(|i| i.id != 1));
}

#[test]
fn status_names_matched_title() {
    let out = three().recommend("amm", 1);
    assert_eq!(out.matched, Some(3));
    assert_eq!(out.status, "Recommendations for 'Gamma'");
}

#[test]
fn exact_title_wins_over_substring() {
    let items = vec![
        item(1, "Up and Away", "balloon house adventure"),
        item(2, "Up", "balloon house adventure old man"),
        item(3, "Down", "submarine thriller"),
    ];
    let r = Recommender::from_items(&items, &Vectorizer::default()).unwrap();
    let out = r.recommend("up", 1);
    assert_eq!(out.matched, Some(2));
    assert_eq!(out.items[0].id, 1);
}

#[test]
fn single_item_corpus_has_no_neighbors() {
    let r = Recommender::from_items(&[item(1, "Solo", "lonely drama")], &Vectorizer::default()).unwrap();
    let out = r.recommend("Solo", 3);
    assert!(out.items.is_empty());
    assert_eq!(out.matched, Some(1));
}

#[test]
fn titles_sorted_for_picker() {
    let r = three();
    assert_eq!(r.titles(), vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(r.len(), 3);
    assert_eq!(r.title(3), Some("Gamma"));
}

#[test]
fn possessive_overview_matches_bare_name() {
    let items = vec![
        item(1, "A", "Batman's war Joker"),
        item(2, "B", "Batman war Joker"),
        item(3, "C", "war cooking"),
    ];
    let r = Recommender::from_items(&items, &Vectorizer::default()).unwrap();
    let out = r.recommend("A", 2);
    assert_eq!(out.items[0].id, 2);
    assert!((out.items[0].score - 1.0).abs() < 1e-6);
}
