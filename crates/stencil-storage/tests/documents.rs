use serde_json::json;
use stencil_storage::{Document, Filter, Namespace, Update};

fn doc(value: serde_json::Value) -> Document {
    value.as_object().cloned().expect("object")
}

#[test]
fn empty_filter_matches_everything() {
    let filter = Filter::all();
    assert!(filter.is_empty());
    assert!(filter.matches(&doc(json!({}))));
    assert!(filter.matches(&doc(json!({"id": "a", "items": []}))));
}

#[test]
fn equality_filter_requires_every_condition() {
    let filter = Filter::all().where_eq("id", "a").where_eq("kind", "x");
    assert!(filter.matches(&doc(json!({"id": "a", "kind": "x", "other": 1}))));
    assert!(!filter.matches(&doc(json!({"id": "a", "kind": "y"}))));
    assert!(!filter.matches(&doc(json!({"id": "a"}))));
}

#[test]
fn equality_compares_json_values_strictly() {
    let filter = Filter::all().where_eq("n", 1);
    assert!(filter.matches(&doc(json!({"n": 1}))));
    assert!(!filter.matches(&doc(json!({"n": "1"}))));
}

#[test]
fn equality_lookup_returns_the_constrained_value() {
    let filter = Filter::all().where_eq("id", "abc");
    assert_eq!(filter.equality("id"), Some(&json!("abc")));
    assert_eq!(filter.equality("items"), None);
}

#[test]
fn update_reports_whether_anything_changed() {
    let mut document = doc(json!({"id": "a", "items": ["x"]}));

    let same = Update::new().set("items", json!(["x"]));
    assert!(!same.apply(&mut document));

    let changed = Update::new().set("items", json!(["x", "y"])).set("updated", "t2");
    assert!(changed.apply(&mut document));
    assert_eq!(document["items"], json!(["x", "y"]));
    assert_eq!(document["updated"], json!("t2"));
    assert_eq!(document["id"], json!("a"));
}

#[test]
fn update_knows_which_fields_it_touches() {
    let update = Update::new().set("items", json!([]));
    assert!(update.touches("items"));
    assert!(!update.touches("id"));
    assert!(Update::new().is_empty());
}

#[test]
fn namespace_displays_dotted() {
    assert_eq!(Namespace::new("template", "template").to_string(), "template.template");
}
