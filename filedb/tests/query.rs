use filedb::prelude::*;
use serde_json::json;
use tempfile::{TempDir, tempdir};

async fn people() -> (TempDir, Collection<JsonFileStore>) {
    let dir = tempdir().unwrap();
    let db = filedb::connect(Some(dir.path())).await.unwrap();
    db.create_collection("people", json!({"name": "String", "age": "Number"}))
        .await
        .unwrap();

    let people = db.collection("people").await;
    people
        .insert_many(vec![
            json!({"name": "Alice", "age": 30, "city": "Oslo"}),
            json!({"name": "bob", "age": 10, "city": "Rome"}),
            json!({"name": "Carol", "age": 20, "city": "Oslo"}),
            json!({"name": "alfred", "age": 40}),
        ])
        .await
        .unwrap();

    (dir, people)
}

fn names(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn sort_skip_limit() {
    let (_dir, people) = people().await;

    let page = people
        .find(json!({}))
        .sort(("age", SortDirection::Asc))
        .skip(1)
        .limit(2)
        .exec()
        .await
        .unwrap();

    assert_eq!(names(&page), ["Carol", "Alice"]);
}

#[tokio::test]
async fn descending_sort_from_a_sort_document() {
    let (_dir, people) = people().await;

    let sorted = people
        .find(json!({}))
        .sort_json(json!({"age": -1}))
        .exec()
        .await
        .unwrap();

    assert_eq!(names(&sorted), ["alfred", "Alice", "Carol", "bob"]);
}

#[tokio::test]
async fn without_sort_stored_order_is_kept() {
    let (_dir, people) = people().await;

    let all = people.find(json!({})).exec().await.unwrap();

    assert_eq!(names(&all), ["Alice", "bob", "Carol", "alfred"]);
}

#[tokio::test]
async fn range_operators_combine() {
    let (_dir, people) = people().await;

    let found = people
        .find(json!({"age": {"$gte": 20, "$lt": 40}}))
        .exec()
        .await
        .unwrap();

    assert_eq!(names(&found), ["Alice", "Carol"]);
}

#[tokio::test]
async fn operators_and_literals_mix_across_fields() {
    let (_dir, people) = people().await;

    let filter = Filter::new()
        .eq("city", "Oslo")
        .field("age", OperatorSet::new().gt(25));
    let found = people.find(filter).exec().await.unwrap();

    assert_eq!(names(&found), ["Alice"]);
}

#[tokio::test]
async fn ne_matches_missing_fields() {
    let (_dir, people) = people().await;

    let found = people
        .find(json!({"city": {"$ne": "Oslo"}}))
        .exec()
        .await
        .unwrap();

    assert_eq!(names(&found), ["bob", "alfred"]);
}

#[tokio::test]
async fn in_matches_any_listed_value() {
    let (_dir, people) = people().await;

    let found = people
        .find(Filter::new().field("age", OperatorSet::new().any_of([10, 40])))
        .exec()
        .await
        .unwrap();

    assert_eq!(names(&found), ["bob", "alfred"]);
}

#[tokio::test]
async fn regex_with_case_insensitive_option() {
    let (_dir, people) = people().await;

    let found = people
        .find(json!({"name": {"$regex": "^al", "$options": "i"}}))
        .exec()
        .await
        .unwrap();
    assert_eq!(names(&found), ["Alice", "alfred"]);

    let case_sensitive = people
        .find(json!({"name": {"$regex": "^al"}}))
        .exec()
        .await
        .unwrap();
    assert_eq!(names(&case_sensitive), ["alfred"]);
}

#[tokio::test]
async fn regex_tests_stringified_values() {
    let (_dir, people) = people().await;

    let found = people
        .find(json!({"age": {"$regex": "^[34]0$"}}))
        .exec()
        .await
        .unwrap();

    assert_eq!(names(&found), ["Alice", "alfred"]);
}

#[tokio::test]
async fn invalid_regex_is_reported() {
    let (_dir, people) = people().await;

    let err = people
        .find(json!({"name": {"$regex": "("}}))
        .exec()
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidRegex(_)));
}

#[tokio::test]
async fn unsupported_operators_fail() {
    let (_dir, people) = people().await;

    for tag in ["$foo", "$eq"] {
        let mut operators = serde_json::Map::new();
        operators.insert(tag.to_string(), json!(30));

        let err = people
            .find(json!({"age": operators}))
            .exec()
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UnsupportedOperator(ref op) if op == tag), "{err}");
    }
}

#[tokio::test]
async fn unsupported_operators_fail_on_an_empty_collection() {
    let dir = tempdir().unwrap();
    let db = filedb::connect(Some(dir.path())).await.unwrap();
    db.create_collection("empty", SchemaDefinition::new()).await.unwrap();

    let err = db
        .collection("empty")
        .await
        .find(json!({"x": {"$foo": 1}}))
        .exec()
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::UnsupportedOperator(op) if op == "$foo"));
}

#[tokio::test]
async fn limit_zero_returns_nothing() {
    let (_dir, people) = people().await;

    assert!(people.find(json!({})).limit(0).exec().await.unwrap().is_empty());
    assert_eq!(people.find(json!({})).limit(0).first().await.unwrap(), None);
}

#[tokio::test]
async fn first_returns_the_top_result() {
    let (_dir, people) = people().await;

    let youngest = people
        .find(json!({}))
        .sort(("age", SortDirection::Asc))
        .first()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(youngest["name"], json!("bob"));
}

#[tokio::test]
async fn malformed_filter_or_sort_fails_at_exec() {
    let (_dir, people) = people().await;

    let err = people.find(json!(["not", "an", "object"])).exec().await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidFilter(_)));

    let err = people
        .find(json!({}))
        .sort_json(json!({"age": "up"}))
        .exec()
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFilter(_)));
}

#[tokio::test]
async fn builder_is_inert_until_exec() {
    let (_dir, people) = people().await;

    let query = people
        .find(json!({"age": {"$gt": 15}}))
        .sort(("name", SortDirection::Desc))
        .skip(1);
    people.insert_one(&json!({"name": "Zed", "age": 99})).await.unwrap();

    assert_eq!(query.plan().skip, 1);
    let found = query.exec().await.unwrap();
    assert_eq!(names(&found), ["Zed", "Carol", "Alice"]);
}

#[tokio::test]
async fn query_on_missing_collection_fails() {
    let dir = tempdir().unwrap();
    let db = filedb::connect(Some(dir.path())).await.unwrap();

    let err = db
        .collection("ghosts")
        .await
        .find(json!({}))
        .exec()
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::CollectionNotFound(name) if name == "ghosts"));
}

#[tokio::test]
async fn array_filter_values_are_read_as_operators() {
    let (_dir, people) = people().await;
    people
        .insert_one(&json!({"name": "Dan", "age": 50, "tags": ["a"]}))
        .await
        .unwrap();

    let err = people.find(json!({"tags": ["a"]})).exec().await.unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedOperator(ref op) if op == "0"));

    let everyone = people.find(json!({"tags": []})).exec().await.unwrap();
    assert_eq!(everyone.len(), 5);

    assert_eq!(people.find_one(json!({"tags": ["a"]})).await.unwrap(), None);
}
