pub mod signup;

use serde_json::json;

use crate::extractors::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
