//! Shared entity model and rows for repository tests.
//!
//! `User` has a to-one `address` and a to-many `orders`, so filtering on
//! `orders.*` multiplies user rows the way a SQL join would.

use serde_json::{json, Value as JsonValue};
use sieve_query::{EntityRegistry, EntityType, ScalarType};

pub fn registry() -> EntityRegistry {
    EntityRegistry::builder()
        .register(
            EntityType::new("User")
                .id("id", ScalarType::BigInt)
                .field("userName", ScalarType::Text)
                .field("age", ScalarType::Integer)
                .field("active", ScalarType::Boolean)
                .nested("address", "Address")
                .nested("orders", "Order"),
        )
        .register(
            EntityType::new("Address")
                .id("id", ScalarType::BigInt)
                .field("city", ScalarType::Text)
                .field("zipCode", ScalarType::Integer),
        )
        .register(
            EntityType::new("Order")
                .id("id", ScalarType::BigInt)
                .field("status", ScalarType::Text)
                .field("total", ScalarType::Integer),
        )
        .build()
        .expect("fixture registry is valid")
}

fn order(id: i64, status: &str, total: i32) -> JsonValue {
    json!({ "id": id, "status": status, "total": total })
}

/// Five users; alice has three open orders, bob one open and one closed.
pub fn users() -> Vec<JsonValue> {
    vec![
        json!({
            "id": 1, "userName": "alice", "age": 34, "active": true,
            "address": { "id": 10, "city": "Lyon", "zipCode": 69001 },
            "orders": [order(100, "open", 20), order(101, "open", 35), order(102, "open", 5)],
        }),
        json!({
            "id": 2, "userName": "bob", "age": 27, "active": true,
            "address": { "id": 11, "city": "Paris", "zipCode": 75001 },
            "orders": [order(103, "open", 12), order(104, "closed", 80)],
        }),
        json!({
            "id": 3, "userName": "carol", "age": 41, "active": false,
            "address": { "id": 12, "city": "Lyon", "zipCode": 69002 },
            "orders": [],
        }),
        json!({
            "id": 4, "userName": "alice", "age": 19, "active": true,
            "address": { "id": 13, "city": "Nantes", "zipCode": 44000 },
            "orders": [order(105, "closed", 44)],
        }),
        json!({
            "id": 5, "userName": "dave", "age": 34, "active": false,
            "address": { "id": 14, "city": "Paris", "zipCode": 75002 },
            "orders": [order(106, "open", 9)],
        }),
    ]
}

/// `count` users with no relations, ids starting at 1.
pub fn plain_users(count: i64) -> Vec<JsonValue> {
    (1..=count)
        .map(|id| {
            json!({
                "id": id, "userName": format!("user{id}"), "age": 20 + id, "active": id % 2 == 0,
                "address": null, "orders": [],
            })
        })
        .collect()
}

pub fn ids(rows: &[JsonValue]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(JsonValue::as_i64))
        .collect()
}
