//! # Record Augmentation
//!
//! Two audited tables carry schema-required discriminator fields that
//! do not exist in the stored JSON: a type label resolved from the
//! `dictionaries.user_paths` lookup table, and for datasources a
//! directionality flag inferred from which connection key is present.
//! These are injected into the decoded record before validation.

use serde_json::{Map, Value};

/// The users table, augmented with a `user_type` label.
pub const USERS_TABLE: &str = "settings.users";
/// The datasources table, augmented with `datasource_type` and
/// `queue_mode`.
pub const DATASOURCES_TABLE: &str = "settings.datasources";

/// Key signaling an outbound connection.
pub const SEND_CONN_KEY: &str = "send_conn_info";
/// Key signaling an inbound connection.
pub const RECEIVE_CONN_KEY: &str = "receive_conn_info";

const USER_TYPE_FIELD: &str = "user_type";
const DATASOURCE_TYPE_FIELD: &str = "datasource_type";
const QUEUE_MODE_FIELD: &str = "queue_mode";

/// Whether the table needs per-row type labels before validation.
pub fn needs_labels(table: &str) -> bool {
    table == USERS_TABLE || table == DATASOURCES_TABLE
}

/// Inject the derived classification fields into a decoded record.
/// The send key wins over the receive key; a record with neither gets
/// no `queue_mode` at all.
pub fn augment(table: &str, record: &mut Map<String, Value>, label: &str) {
    if table == USERS_TABLE {
        record.insert(USER_TYPE_FIELD.to_owned(), Value::String(label.to_owned()));
    } else if table == DATASOURCES_TABLE {
        record.insert(
            DATASOURCE_TYPE_FIELD.to_owned(),
            Value::String(label.to_owned()),
        );
        if record.contains_key(SEND_CONN_KEY) {
            record.insert(QUEUE_MODE_FIELD.to_owned(), Value::String("send".to_owned()));
        } else if record.contains_key(RECEIVE_CONN_KEY) {
            record.insert(
                QUEUE_MODE_FIELD.to_owned(),
                Value::String("receive".to_owned()),
            );
        }
    }
}
