//! In-memory UI configuration document.
//!
//! A loose JSON object the client reads at startup; whole-document and
//! per-section reads and writes. Volatile like the rest of the state.

use axum::extract::{Path, State};
use axum::response::Json;
use chrono::Utc;
use serde_json::{json, Value};

use super::AppState;

/// Initial document served until someone writes over it.
#[must_use]
pub fn default_ui_config() -> Value {
    json!({
        "theme": "dark",
        "featuredCategory": "deportes",
        "showViewerCount": true,
        "updatedAt": Utc::now().to_rfc3339(),
    })
}

/// GET /api/ui-config
pub async fn get_config(State(state): State<AppState>) -> Json<Value> {
    let config = state.ui_config.read().clone();
    Json(json!({
        "success": true,
        "config": config,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// PUT /api/ui-config — shallow-merge the provided object.
pub async fn put_config(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let updated = {
        let mut config = state.ui_config.write();
        if let (Some(doc), Some(Json(Value::Object(incoming)))) = (config.as_object_mut(), body) {
            for (key, value) in incoming {
                doc.insert(key, value);
            }
        }
        config["updatedAt"] = Value::from(Utc::now().to_rfc3339());
        config.clone()
    };

    Json(json!({
        "success": true,
        "config": updated,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/ui-config/{section}
pub async fn get_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Json<Value> {
    let value = state.ui_config.read().get(&section).cloned().unwrap_or(Value::Null);
    let data = json!({ section.as_str(): value });
    Json(json!({
        "success": true,
        "section": section,
        "data": data,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// PUT /api/ui-config/{section}
///
/// Accepts either `{"value": ...}` or a bare value as the section body.
pub async fn put_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    let incoming = body.map_or(Value::Null, |Json(v)| v);
    let value = incoming.get("value").cloned().unwrap_or(incoming);

    let stored = {
        let mut config = state.ui_config.write();
        config[section.as_str()] = value;
        config["updatedAt"] = Value::from(Utc::now().to_rfc3339());
        config[section.as_str()].clone()
    };

    let data = json!({ section.as_str(): stored });
    Json(json!({
        "success": true,
        "section": section,
        "data": data,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
