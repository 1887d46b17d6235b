//! Canonical snippets. The code generator shows these to the model as the
//! expected shape, and they double as fixtures.

use serde_json::{json, Value};

use super::types::{ResultBinding, Snippet};
use crate::executor::HttpMethod;

/// Payload used when the database name is answered with the auto-generate sentinel.
pub fn default_database_payload() -> Value {
    json!({
        "name": "members_db",
        "displayName": "会員データベース",
        "description": "会員情報を管理するデータベース",
        "fields": [
            {"name": "name", "displayName": "氏名", "type": "text", "required": true},
            {"name": "email", "displayName": "メールアドレス", "type": "email", "required": true},
            {"name": "registered_at", "displayName": "登録日時", "type": "dateTime", "required": false}
        ]
    })
}

pub fn create_database() -> Snippet {
    Snippet {
        summary: "アプリにデータベースを作成します。".to_string(),
        method: HttpMethod::Post,
        path: "apps/{app_id}/dbs".to_string(),
        body: Some(json!({
            "$auto": {
                "param": "db_name",
                "then": default_database_payload(),
                "else": {
                    "name": {"$param": "db_name"},
                    "displayName": {"$format": "{db_name}データベース"},
                    "description": {"$format": "{db_name}のデータを管理するデータベース"}
                }
            }
        })),
        params: Vec::new(),
        result: Some(ResultBinding::Response),
        body_first: false,
    }
}

pub fn list_databases() -> Snippet {
    Snippet {
        summary: "アプリのデータベース一覧を取得します。".to_string(),
        method: HttpMethod::Get,
        path: "apps/{app_id}/dbs".to_string(),
        body: None,
        params: Vec::new(),
        result: Some(ResultBinding::Pointer("/items".to_string())),
        body_first: false,
    }
}

pub fn get_app() -> Snippet {
    Snippet {
        summary: "アプリの詳細を取得します。".to_string(),
        method: HttpMethod::Get,
        path: "apps/{app_id}".to_string(),
        body: None,
        params: Vec::new(),
        result: Some(ResultBinding::Response),
        body_first: false,
    }
}

pub fn all() -> Vec<Snippet> {
    vec![create_database(), list_databases(), get_app()]
}
