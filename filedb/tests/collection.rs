use filedb::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::{TempDir, tempdir};

async fn setup() -> (TempDir, Database<JsonFileStore>, Collection<JsonFileStore>) {
    let dir = tempdir().unwrap();
    let db = filedb::connect(Some(dir.path())).await.unwrap();
    db.create_collection("users", json!({"name": "String", "age": "Number"}))
        .await
        .unwrap();
    let users = db.collection("users").await;

    (dir, db, users)
}

fn data_file(base: &Path) -> std::path::PathBuf {
    base.join("users").join("data.json")
}

fn names(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn insert_one_assigns_system_fields() {
    let (_dir, _db, users) = setup().await;

    let stored = users
        .insert_one(&json!({"name": "Ada", "age": 36}))
        .await
        .unwrap();

    let keys: Vec<&String> = stored.keys().collect();
    assert_eq!(keys, [ID_FIELD, CREATED_AT_FIELD, "name", "age"]);

    let id = stored[ID_FIELD].as_str().unwrap();
    assert!(!id.is_empty());

    let created_at = stored[CREATED_AT_FIELD].as_str().unwrap();
    assert_eq!(created_at.len(), "2024-01-01T00:00:00.000Z".len());
    assert!(created_at.ends_with('Z'));

    let found = users.find_one(json!({"_id": id})).await.unwrap();
    assert_eq!(found, Some(stored));
}

#[tokio::test]
async fn inserted_ids_are_unique() {
    let (_dir, _db, users) = setup().await;

    let a = users.insert_one(&json!({"name": "A"})).await.unwrap();
    let b = users.insert_one(&json!({"name": "B"})).await.unwrap();

    assert_ne!(a[ID_FIELD], b[ID_FIELD]);
}

#[tokio::test]
async fn caller_supplied_id_is_replaced() {
    let (_dir, _db, users) = setup().await;

    let stored = users
        .insert_one(&json!({"_id": "mine", "createdAt": "yesterday", "name": "Ada"}))
        .await
        .unwrap();

    assert_ne!(stored[ID_FIELD], json!("mine"));
    assert_ne!(stored[CREATED_AT_FIELD], json!("yesterday"));
    assert_eq!(users.find_one(json!({"_id": "mine"})).await.unwrap(), None);
}

#[tokio::test]
async fn insert_rejects_non_objects() {
    let (_dir, _db, users) = setup().await;

    let err = users.insert_one(&json!([1, 2, 3])).await.unwrap_err();

    assert!(matches!(err, StoreError::InvalidDocument(_)));
}

#[tokio::test]
async fn records_round_trip_through_the_file() {
    let (dir, _db, users) = setup().await;

    users
        .insert_one(&json!({"name": "Ada", "age": 36, "tags": ["x"], "meta": {"a": null}}))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(data_file(dir.path())).unwrap();
    assert!(raw.starts_with("[\n  {\n    \"_id\": "));

    let on_disk: Vec<Record> = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk, users.all().await.unwrap());
    assert_eq!(on_disk[0]["meta"], json!({"a": null}));
}

#[tokio::test]
async fn insert_many_keeps_order_in_one_write() {
    let (_dir, _db, users) = setup().await;
    users.insert_one(&json!({"name": "first"})).await.unwrap();

    let inserted = users
        .insert_many(vec![json!({"name": "b"}), json!({"name": "c"})])
        .await
        .unwrap();

    assert_eq!(inserted.len(), 2);
    assert_eq!(names(&users.all().await.unwrap()), ["first", "b", "c"]);
}

#[tokio::test]
async fn insert_many_of_nothing_still_checks_the_collection() {
    let (_dir, db, users) = setup().await;

    assert!(users.insert_many(Vec::<Value>::new()).await.unwrap().is_empty());

    let ghosts = db.collection("ghosts").await;
    let err = ghosts.insert_many(Vec::<Value>::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::CollectionNotFound(_)));
}

#[tokio::test]
async fn find_one_returns_first_match_in_stored_order() {
    let (_dir, _db, users) = setup().await;
    users
        .insert_many(vec![
            json!({"name": "Ada", "role": "admin"}),
            json!({"name": "Bob", "role": "user"}),
            json!({"name": "Cy", "role": "user"}),
        ])
        .await
        .unwrap();

    let found = users.find_one(json!({"role": "user"})).await.unwrap().unwrap();
    assert_eq!(found["name"], json!("Bob"));

    assert_eq!(users.find_one(json!({"role": "guest"})).await.unwrap(), None);
}

#[tokio::test]
async fn find_one_never_matches_operator_values() {
    let (_dir, _db, users) = setup().await;
    users.insert_one(&json!({"name": "Ada", "age": 36})).await.unwrap();

    assert_eq!(users.find_one(json!({"age": {"$gt": 1}})).await.unwrap(), None);
    assert_eq!(users.find_one(json!({"age": {"$foo": 1}})).await.unwrap(), None);
}

#[tokio::test]
async fn equality_is_type_sensitive() {
    let (_dir, _db, users) = setup().await;
    users.insert_one(&json!({"name": "Ada", "age": 36})).await.unwrap();

    assert_eq!(users.find_one(json!({"age": "36"})).await.unwrap(), None);
    assert!(users.find_one(json!({"age": 36.0})).await.unwrap().is_some());
    assert_eq!(users.find_one(json!({"email": null})).await.unwrap(), None);
}

#[tokio::test]
async fn update_one_merges_into_the_first_match() {
    let (_dir, _db, users) = setup().await;
    users
        .insert_many(vec![
            json!({"name": "Ada", "role": "user", "age": 36}),
            json!({"name": "Bob", "role": "user", "age": 25}),
        ])
        .await
        .unwrap();

    let result = users
        .update_one(json!({"role": "user"}), &json!({"role": "admin", "active": true}))
        .await
        .unwrap();
    assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

    let records = users.all().await.unwrap();
    assert_eq!(records[0]["role"], json!("admin"));
    assert_eq!(records[0]["active"], json!(true));
    assert_eq!(records[0]["age"], json!(36));
    assert_eq!(records[1]["role"], json!("user"));
}

#[tokio::test]
async fn update_many_merges_into_every_match() {
    let (_dir, _db, users) = setup().await;
    users
        .insert_many(vec![
            json!({"name": "Ada", "role": "user"}),
            json!({"name": "Bob", "role": "admin"}),
            json!({"name": "Cy", "role": "user"}),
        ])
        .await
        .unwrap();

    let result = users
        .update_many(json!({"role": "user"}), &json!({"role": "member"}))
        .await
        .unwrap();
    assert_eq!(result, UpdateResult { matched: 2, modified: 2 });

    let members = users.find(json!({"role": "member"})).exec().await.unwrap();
    assert_eq!(names(&members), ["Ada", "Cy"]);
}

#[tokio::test]
async fn unmatched_update_leaves_the_file_untouched() {
    let (dir, _db, users) = setup().await;
    users.insert_one(&json!({"name": "Ada"})).await.unwrap();
    let before = std::fs::read(data_file(dir.path())).unwrap();

    let result = users
        .update_many(json!({"name": "Nobody"}), &json!({"name": "Somebody"}))
        .await
        .unwrap();

    assert_eq!(result, UpdateResult::default());
    assert_eq!(std::fs::read(data_file(dir.path())).unwrap(), before);
}

#[tokio::test]
async fn update_may_overwrite_system_fields() {
    let (_dir, _db, users) = setup().await;
    users.insert_one(&json!({"name": "Ada"})).await.unwrap();

    users
        .update_one(json!({"name": "Ada"}), &json!({"_id": "fixed"}))
        .await
        .unwrap();

    assert!(users.find_one(json!({"_id": "fixed"})).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_one_removes_only_the_first_match() {
    let (_dir, _db, users) = setup().await;
    users
        .insert_many(vec![
            json!({"name": "Ada", "role": "user"}),
            json!({"name": "Bob", "role": "user"}),
        ])
        .await
        .unwrap();

    let result = users.delete_one(json!({"role": "user"})).await.unwrap();

    assert_eq!(result, DeleteResult { deleted: 1 });
    assert_eq!(names(&users.all().await.unwrap()), ["Bob"]);
}

#[tokio::test]
async fn delete_many_keeps_survivor_order() {
    let (_dir, _db, users) = setup().await;
    users
        .insert_many(vec![
            json!({"name": "a", "drop": true}),
            json!({"name": "b", "drop": false}),
            json!({"name": "c", "drop": true}),
            json!({"name": "d", "drop": false}),
            json!({"name": "e"}),
        ])
        .await
        .unwrap();

    let result = users.delete_many(json!({"drop": true})).await.unwrap();

    assert_eq!(result, DeleteResult { deleted: 2 });
    assert_eq!(names(&users.all().await.unwrap()), ["b", "d", "e"]);
}

#[tokio::test]
async fn unmatched_delete_leaves_the_file_untouched() {
    let (dir, _db, users) = setup().await;
    users.insert_one(&json!({"name": "Ada"})).await.unwrap();
    let before = std::fs::read(data_file(dir.path())).unwrap();

    assert_eq!(users.delete_one(json!({"name": "Nobody"})).await.unwrap().deleted, 0);
    assert_eq!(users.delete_many(json!({"name": "Nobody"})).await.unwrap().deleted, 0);

    assert_eq!(std::fs::read(data_file(dir.path())).unwrap(), before);
}

#[tokio::test]
async fn empty_filter_matches_everything() {
    let (_dir, _db, users) = setup().await;
    users
        .insert_many(vec![json!({"name": "a"}), json!({"name": "b"})])
        .await
        .unwrap();

    assert_eq!(users.delete_many(json!({})).await.unwrap().deleted, 2);
    assert!(users.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn handles_see_each_others_writes() {
    let (dir, db, users) = setup().await;
    let other = filedb::connect(Some(dir.path())).await.unwrap();

    users.insert_one(&json!({"name": "Ada"})).await.unwrap();

    let seen = other
        .collection("users")
        .await
        .find_one(json!({"name": "Ada"}))
        .await
        .unwrap();
    assert!(seen.is_some());
    assert_eq!(db.collection("users").await.all().await.unwrap().len(), 1);
}
