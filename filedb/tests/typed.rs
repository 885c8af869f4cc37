use filedb::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::{TempDir, tempdir};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl Document for User {
    fn collection_name() -> &'static str {
        "users"
    }
}

fn user(name: &str, age: u32) -> User {
    User { name: name.to_string(), age, email: None }
}

async fn setup() -> (TempDir, TypedCollection<JsonFileStore, User>) {
    let dir = tempdir().unwrap();
    let db = filedb::connect(Some(dir.path())).await.unwrap();
    db.create_collection(
        User::collection_name(),
        SchemaDefinition::new()
            .field("name", FieldType::String)
            .field("age", FieldType::Number),
    )
    .await
    .unwrap();

    (dir, db.typed_collection::<User>().await)
}

#[tokio::test]
async fn insert_returns_the_stored_document() {
    let (_dir, users) = setup().await;

    let stored = users.insert_one(&user("Ada", 36)).await.unwrap();

    assert_eq!(stored.document, user("Ada", 36));
    assert!(!stored.id.is_empty());
    assert!(stored.created_at.ends_with('Z'));

    let found = users.find_one(json!({"_id": stored.id.clone()})).await.unwrap();
    assert_eq!(found, Some(stored));
}

#[tokio::test]
async fn typed_queries_deserialize_results() {
    let (_dir, users) = setup().await;
    users
        .insert_many(vec![user("Ada", 36), user("Bob", 17), user("Cy", 52)])
        .await
        .unwrap();

    let adults = users
        .find(Filter::new().field("age", OperatorSet::new().gte(18)))
        .sort_json(json!({"age": -1}))
        .exec()
        .await
        .unwrap();

    let names: Vec<&str> = adults
        .iter()
        .map(|stored| stored.document.name.as_str())
        .collect();
    assert_eq!(names, ["Cy", "Ada"]);
}

#[tokio::test]
async fn typed_updates_and_deletes() {
    let (_dir, users) = setup().await;
    users
        .insert_many(vec![user("Ada", 36), user("Bob", 17)])
        .await
        .unwrap();

    let updated = users
        .update_one(json!({"name": "Bob"}), &json!({"email": "bob@example.com"}))
        .await
        .unwrap();
    assert_eq!(updated.modified, 1);

    let bob = users.find_one(json!({"name": "Bob"})).await.unwrap().unwrap();
    assert_eq!(bob.document.email.as_deref(), Some("bob@example.com"));

    assert_eq!(users.delete_many(json!({"age": 36})).await.unwrap().deleted, 1);
    assert_eq!(users.untyped().all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn typed_and_untyped_handles_share_data() {
    let (_dir, users) = setup().await;

    users
        .untyped()
        .insert_one(&json!({"name": "Raw", "age": 1}))
        .await
        .unwrap();

    let first = users.find(json!({})).first().await.unwrap().unwrap();
    assert_eq!(first.document, user("Raw", 1));
    assert_eq!(users.name(), "users");
}
