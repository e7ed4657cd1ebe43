pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::capabilities::{image, resume, text};
use crate::identity::require_auth;
use crate::state::AppState;

/// Resume uploads may be a full 5 MiB, plus multipart framing; anything
/// larger is rejected at the body layer before a handler runs.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let capabilities = Router::new()
        .route("/generate-article", post(text::generate_article))
        .route("/generate-blog-title", post(text::generate_blog_title))
        .route("/generate-image", post(image::generate_image))
        .route(
            "/remove-image-background",
            post(image::remove_image_background),
        )
        .route("/remove-image-object", post(image::remove_image_object))
        .route("/resume-review", post(resume::resume_review))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/ai", capabilities)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use bytes::Bytes;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::creations::CreationStore;
    use crate::errors::AppError;
    use crate::identity::{AuthContext, IdentityProvider, Plan};
    use crate::models::creation::NewCreation;
    use crate::providers::chat::ChatCompletion;
    use crate::providers::clipdrop::TextToImage;
    use crate::providers::cloudinary::{MediaStore, UploadedMedia};
    use crate::quota::LIMIT_EXCEEDED_MESSAGE;

    // ────────────────────────────────────────────────────────────────────
    // Fake collaborators
    // ────────────────────────────────────────────────────────────────────

    struct FakeIdentity {
        plan: Plan,
        free_usage: i64,
        puts: Mutex<Vec<(String, i64)>>,
    }

    impl FakeIdentity {
        fn new(plan: Plan, free_usage: i64) -> Self {
            Self {
                plan,
                free_usage,
                puts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn resolve(&self, _token: &str) -> Result<AuthContext, AppError> {
            Ok(AuthContext {
                user_id: "user_1".to_string(),
                plan: self.plan,
                free_usage: self.free_usage,
            })
        }

        async fn put_free_usage(&self, user_id: &str, free_usage: i64) -> Result<(), AppError> {
            self.puts
                .lock()
                .unwrap()
                .push((user_id.to_string(), free_usage));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeChat {
        called: AtomicBool,
    }

    #[async_trait]
    impl ChatCompletion for FakeChat {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, AppError> {
            self.called.store(true, Ordering::SeqCst);
            Ok("hi there".to_string())
        }
    }

    #[derive(Default)]
    struct FakeMedia {
        called: AtomicBool,
    }

    #[async_trait]
    impl MediaStore for FakeMedia {
        async fn upload_data_uri(
            &self,
            _data_uri: &str,
            _transformation: Option<&str>,
        ) -> Result<UploadedMedia, AppError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(UploadedMedia {
                public_id: "abc".to_string(),
                secure_url: "https://cdn.example/abc.png".to_string(),
            })
        }

        async fn upload_bytes(
            &self,
            _bytes: Vec<u8>,
            _transformation: Option<&str>,
        ) -> Result<UploadedMedia, AppError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(UploadedMedia {
                public_id: "abc".to_string(),
                secure_url: "https://cdn.example/abc.png".to_string(),
            })
        }

        fn transform_url(&self, public_id: &str, transformation: &str) -> String {
            format!("https://cdn.example/{transformation}/{public_id}")
        }
    }

    struct FakeImage;

    #[async_trait]
    impl TextToImage for FakeImage {
        async fn text_to_image(&self, _prompt: &str) -> Result<Bytes, AppError> {
            Ok(Bytes::from_static(b"png"))
        }
    }

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<NewCreation>>,
    }

    #[async_trait]
    impl CreationStore for FakeStore {
        async fn append(&self, record: NewCreation) -> Result<(), AppError> {
            self.rows.lock().unwrap().push(record);
            Ok(())
        }
    }

    struct TestHarness {
        identity: Arc<FakeIdentity>,
        chat: Arc<FakeChat>,
        media: Arc<FakeMedia>,
        store: Arc<FakeStore>,
        app: Router,
    }

    fn harness(plan: Plan, free_usage: i64, with_image: bool) -> TestHarness {
        let identity = Arc::new(FakeIdentity::new(plan, free_usage));
        let chat = Arc::new(FakeChat::default());
        let media = Arc::new(FakeMedia::default());
        let store = Arc::new(FakeStore::default());

        let state = AppState {
            identity: identity.clone(),
            chat: chat.clone(),
            image: with_image.then(|| Arc::new(FakeImage) as Arc<dyn TextToImage>),
            media: media.clone(),
            store: store.clone(),
        };

        TestHarness {
            identity,
            chat,
            media,
            store,
            app: build_router(state),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer token123")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    // ────────────────────────────────────────────────────────────────────
    // Router behavior
    // ────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_health_is_open() {
        let harness = harness(Plan::Free, 0, true);
        let response = harness
            .app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_bearer_token_is_rejected() {
        let harness = harness(Plan::Free, 0, true);
        let response = harness
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ai/generate-article")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"prompt":"hello","length":500}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(harness.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_article_generation_end_to_end() {
        let harness = harness(Plan::Free, 99, true);
        let response = harness
            .app
            .oneshot(json_post(
                "/api/ai/generate-article",
                r#"{"prompt":"hello","length":500}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["content"], "hi there");

        let rows = harness.store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind.as_str(), "article");
        assert_eq!(rows[0].content, "hi there");
        assert_eq!(
            *harness.identity.puts.lock().unwrap(),
            vec![("user_1".to_string(), 100)]
        );
    }

    #[tokio::test]
    async fn test_free_user_at_limit_gets_denial_envelope() {
        let harness = harness(Plan::Free, 100, true);
        let response = harness
            .app
            .oneshot(json_post(
                "/api/ai/generate-article",
                r#"{"prompt":"hello","length":500}"#,
            ))
            .await
            .unwrap();

        // Denials are normal responses, not HTTP errors.
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], LIMIT_EXCEEDED_MESSAGE);
        assert!(!harness.chat.called.load(Ordering::SeqCst));
        assert!(harness.store.rows.lock().unwrap().is_empty());
        assert!(harness.identity.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_generation_without_key_is_a_configuration_error() {
        let harness = harness(Plan::Premium, 0, false);
        let response = harness
            .app
            .oneshot(json_post(
                "/api/ai/generate-image",
                r#"{"prompt":"a lighthouse"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["message"],
            "Image generation is not configured: CLIPDROP_API_KEY is not set"
        );
        assert!(!harness.media.called.load(Ordering::SeqCst));
        assert!(harness.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_generation_stores_secure_url() {
        let harness = harness(Plan::Premium, 0, true);
        let response = harness
            .app
            .oneshot(json_post(
                "/api/ai/generate-image",
                r#"{"prompt":"a lighthouse","publish":true}"#,
            ))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["content"], "https://cdn.example/abc.png");

        let rows = harness.store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind.as_str(), "image");
        assert!(rows[0].publish);
        // Premium callers never touch the counter.
        assert!(harness.identity.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_resume_is_rejected_before_any_provider_call() {
        let harness = harness(Plan::Free, 0, true);

        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; \
                 name=\"resume\"; filename=\"resume.pdf\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend(std::iter::repeat(b'a').take(5 * 1024 * 1024 + 1));
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = harness
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ai/resume-review")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .header(header::AUTHORIZATION, "Bearer token123")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "File size exceeds 5MB limit.");
        assert!(!harness.chat.called.load(Ordering::SeqCst));
        assert!(harness.store.rows.lock().unwrap().is_empty());
        assert!(harness.identity.puts.lock().unwrap().is_empty());
    }
}
