pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/auth/login", post(handlers::handle_login))
        .route(
            "/api/v1/interviews/analyze",
            post(handlers::handle_analyze),
        )
        .route("/api/v1/interviews/parse", post(handlers::handle_parse))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::assessment::pipeline::test_support::{CannedModel, RecordingSink};
    use crate::config::Config;

    const RESPONSE: &str = "**Q1.** Loved their energy.\n**Q2.** Ready now.\n**Q3.** Plans a food tour.\n\
        **Communication Skills**\nScore: 4/5\nExplanation: Good rapport.";

    fn config(extra: &[(&str, &str)]) -> Config {
        let mut pairs = vec![
            ("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string()),
            ("SHEET_INCLUDE_TIMESTAMP".to_string(), "false".to_string()),
        ];
        pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Config::from_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    fn app(config: Config, sink: Arc<RecordingSink>) -> Router {
        build_router(AppState {
            config,
            model: Arc::new(CannedModel::answering(RESPONSE)),
            sheet: sink,
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(config(&[]), Arc::new(RecordingSink::new(true)))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_rubric_template() {
        let sink = Arc::new(RecordingSink::new(true));
        let (status, body) = post_json(
            app(config(&[]), sink.clone()),
            "/api/v1/interviews/analyze",
            json!({
                "interviewer_name": "Priya",
                "candidate_name": "Tomás",
                "transcript": "hello",
                "template": "rubric"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], true);
        assert_eq!(body["template"], "rubric");
        assert_eq!(
            body["parsed"]["free_text_answers"],
            json!(["Loved their energy.", "Ready now.", "Plans a food tour."])
        );
        assert_eq!(body["parsed"]["rubric_scores"]["Communication Skills"], 4);
        assert_eq!(body["parsed"]["total_score"], 4);
        assert_eq!(sink.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_fields() {
        let sink = Arc::new(RecordingSink::new(true));
        let (status, body) = post_json(
            app(config(&[]), sink.clone()),
            "/api/v1/interviews/analyze",
            json!({
                "interviewer_name": "Priya",
                "candidate_name": "  ",
                "transcript": "hello"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(sink.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_requires_credentials_when_gate_enabled() {
        let sink = Arc::new(RecordingSink::new(true));
        let config = config(&[("STAFF_CREDENTIALS", "alice:pw")]);
        let request = json!({
            "interviewer_name": "Priya",
            "candidate_name": "Tomás",
            "transcript": "hello"
        });

        let (status, _) = post_json(
            app(config.clone(), sink.clone()),
            "/api/v1/interviews/analyze",
            request.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut with_credentials = request;
        with_credentials["credentials"] = json!({"username": "alice", "password": "pw"});
        let (status, _) = post_json(
            app(config, sink.clone()),
            "/api/v1/interviews/analyze",
            with_credentials,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sink.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login() {
        let config = config(&[("STAFF_CREDENTIALS", "alice:pw")]);
        let sink = Arc::new(RecordingSink::new(true));

        let (status, body) = post_json(
            app(config.clone(), sink.clone()),
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "pw"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["authenticated"], true);

        let (status, body) = post_json(
            app(config, sink),
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_parse_endpoint_uses_default_template() {
        let (status, body) = post_json(
            app(config(&[]), Arc::new(RecordingSink::new(true))),
            "/api/v1/interviews/parse",
            json!({"response_text": "**Q1.** one\n**Q4.** four"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["template"], "reflection");
        assert_eq!(
            body["parsed"]["free_text_answers"],
            json!(["one", "", "", "four"])
        );
    }
}
