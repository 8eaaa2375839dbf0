use serde_json::json;
use sieve_server::config::SchemaConfig;

/// `User` with a to-one `address` (embedded in every row) and a to-many `orders`.
pub fn schema_config() -> SchemaConfig {
    serde_json::from_value(json!({
        "entities": [
            {
                "name": "User",
                "table": "users",
                "fetch": ["address"],
                "fields": [
                    { "name": "id", "type": "bigint", "primary_key": true },
                    { "name": "userName" },
                    { "name": "age", "type": "integer" },
                    { "name": "active", "type": "boolean" },
                    { "name": "address", "relation": {
                        "entity": "Address", "local_column": "address_id", "target_column": "id"
                    } },
                    { "name": "orders", "relation": {
                        "entity": "Order", "local_column": "id", "target_column": "user_id", "many": true
                    } }
                ]
            },
            {
                "name": "Address",
                "table": "addresses",
                "fields": [
                    { "name": "id", "type": "bigint", "primary_key": true },
                    { "name": "city" },
                    { "name": "zipCode", "type": "integer" }
                ]
            },
            {
                "name": "Order",
                "table": "orders",
                "fields": [
                    { "name": "id", "type": "bigint", "primary_key": true },
                    { "name": "status" },
                    { "name": "total", "type": "integer", "column": "amount" }
                ]
            }
        ]
    }))
    .expect("fixture schema is valid")
}

/// Tables and rows matching [`schema_config`].
///
/// alice (1) has three open orders, bob (2) one open and one closed,
/// carol (3) none, the second alice (4) one closed, dave (5) one open.
pub const SEED_SQL: &str = r#"
CREATE TABLE addresses (
    id BIGINT PRIMARY KEY,
    city TEXT NOT NULL,
    zip_code INTEGER
);

CREATE TABLE users (
    id BIGINT PRIMARY KEY,
    user_name TEXT NOT NULL,
    age INTEGER,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    address_id BIGINT REFERENCES addresses (id)
);

CREATE TABLE orders (
    id BIGINT PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users (id),
    status TEXT NOT NULL,
    amount INTEGER NOT NULL
);

INSERT INTO addresses (id, city, zip_code) VALUES
    (10, 'Lyon', 69001),
    (11, 'Paris', 75001),
    (12, 'Lyon', 69002),
    (13, 'Nantes', 44000),
    (14, 'Paris', 75002);

INSERT INTO users (id, user_name, age, active, address_id) VALUES
    (1, 'alice', 34, TRUE, 10),
    (2, 'bob', 27, TRUE, 11),
    (3, 'carol', 41, FALSE, 12),
    (4, 'alice', 19, TRUE, 13),
    (5, 'dave', 34, FALSE, 14);

INSERT INTO orders (id, user_id, status, amount) VALUES
    (100, 1, 'open', 20),
    (101, 1, 'open', 35),
    (102, 1, 'open', 5),
    (103, 2, 'open', 12),
    (104, 2, 'closed', 80),
    (105, 4, 'closed', 44),
    (106, 5, 'open', 9);
"#;
