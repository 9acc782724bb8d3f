use axum::response::{IntoResponse, Json};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner")
    ),
    tag = "health"
)]
// axum handler for the service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Semaforo API is running!" }))
}

#[cfg(test)]
mod tests {
    use super::root;
    use axum::{http::StatusCode, response::IntoResponse};

    #[tokio::test]
    async fn test_root_banner() {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
