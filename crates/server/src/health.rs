use api_types::health::Health;
use axum::Json;

/// Liveness probe. Does not touch the database.
pub async fn get() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}
