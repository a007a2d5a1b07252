//! REST router.
//!
//! Returns a composable `Router`; all routes are nested under `/api/`.
//!
//! Route groups:
//! - protected: Extension → Auth → Audit → Handler
//! - account (register, login, password reset): Extension → Rate limit → Handler
//! - public: `GET /api/health`

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from a pre-constructed `ApiContext` (custom rate limits).
pub fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers apply bottom (outermost) to top (innermost).
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route(
            "/claims",
            get(endpoints::claims::list).post(endpoints::claims::create),
        )
        .route(
            "/claims/:id",
            get(endpoints::claims::detail).patch(endpoints::claims::update),
        )
        .route(
            "/appeals",
            get(endpoints::appeals::list).post(endpoints::appeals::create),
        )
        .route("/appeals/:id", patch(endpoints::appeals::update))
        .route("/appeals/generate", post(endpoints::appeals::generate))
        .route(
            "/appeals/generate/stream",
            post(endpoints::appeals::generate_stream),
        )
        .route("/payers", get(endpoints::payers::list))
        .route("/stats", get(endpoints::stats::summary))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Unauthenticated account routes, rate-limited per client
    let account = Router::new()
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .route(
            "/auth/forgot-password",
            post(endpoints::auth::forgot_password),
        )
        .route(
            "/auth/reset-password",
            post(endpoints::auth::reset_password),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", protected)
        .nest("/api", account)
        .nest("/api", public)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::types::RateLimiter;
    use crate::auth::{AuthService, TokenClaims, TokenSigner};
    use crate::db::Database;
    use crate::letters::TemplateGenerator;
    use crate::mailer::MemoryMailer;
    use crate::models::TokenPurpose;

    const SECRET: &[u8] = b"router-test-secret";

    struct TestApp {
        core: Arc<CoreState>,
        mailer: Arc<MemoryMailer>,
    }

    impl TestApp {
        fn new() -> Self {
            let mailer = Arc::new(MemoryMailer::new());
            let auth = AuthService::new(
                TokenSigner::new(SECRET),
                1_000,
                "https://app.claimrx.test".into(),
                mailer.clone(),
            );
            let core = CoreState::new(
                Database::open_in_memory().unwrap(),
                auth,
                Arc::new(TemplateGenerator),
            );
            Self {
                core: Arc::new(core),
                mailer,
            }
        }

        fn router(&self) -> Router {
            api_router(self.core.clone())
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let response = self
                .router()
                .oneshot(make_request(method, uri, token, body))
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn register(&self, email: &str, password: &str) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/auth/register",
                    None,
                    Some(json!({"email": email, "password": password, "name": "Billing Lead"})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["token"].as_str().unwrap().to_string()
        }

        async fn create_claim(&self, token: &str, patient: &str, payer: &str) -> Value {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/claims",
                    Some(token),
                    Some(json!({
                        "patient": patient,
                        "amount": 4500,
                        "payer": payer,
                        "denialReason": "Medical necessity not established",
                        "deniedDate": "2024-01-15",
                        "deadline": "2024-02-15",
                        "serviceCode": "99214"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body
        }
    }

    fn make_request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn reset_token_from(mailer: &MemoryMailer) -> String {
        let sent = mailer.sent();
        let html = &sent.last().unwrap().html;
        let start = html.find("token=").unwrap() + "token=".len();
        let end = html[start..].find('"').unwrap();
        html[start..start + end].to_string()
    }

    // ── auth ──────────────────────────────────────────────

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["hasAnthropicKey"], false);
    }

    #[tokio::test]
    async fn missing_token_is_401_and_bad_token_is_403() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/claims", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let (status, body) = app.send("GET", "/api/claims", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn duplicate_registration_is_400() {
        let app = TestApp::new();
        app.register("dana@clinic.test", "hunter2hunter2").await;
        let (status, body) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"email": "dana@clinic.test", "password": "different-pass", "name": "D"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Email already registered");
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"email": "dana@clinic.test"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Email, password, and name are required"
        );
    }

    #[tokio::test]
    async fn login_token_resolves_to_same_identity() {
        let app = TestApp::new();
        app.register("dana@clinic.test", "hunter2hunter2").await;

        let (status, login) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "dana@clinic.test", "password": "hunter2hunter2"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = login["token"].as_str().unwrap();

        let (status, me) = app.send("GET", "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, login["user"]);
        assert_eq!(me["email"], "dana@clinic.test");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let app = TestApp::new();
        app.register("dana@clinic.test", "hunter2hunter2").await;

        let (s1, wrong) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "dana@clinic.test", "password": "nope-nope"})),
            )
            .await;
        let (s2, unknown) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "ghost@clinic.test", "password": "hunter2hunter2"})),
            )
            .await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong["error"]["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn forgot_password_response_does_not_reveal_accounts() {
        let app = TestApp::new();
        app.register("dana@clinic.test", "hunter2hunter2").await;

        let (s1, known) = app
            .send(
                "POST",
                "/api/auth/forgot-password",
                None,
                Some(json!({"email": "dana@clinic.test"})),
            )
            .await;
        let (s2, unknown) = app
            .send(
                "POST",
                "/api/auth/forgot-password",
                None,
                Some(json!({"email": "ghost@clinic.test"})),
            )
            .await;
        assert_eq!(s1, StatusCode::OK);
        assert_eq!(s2, StatusCode::OK);
        assert_eq!(known, unknown);
        assert_eq!(app.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn reset_token_accepted_exactly_once() {
        let app = TestApp::new();
        app.register("dana@clinic.test", "hunter2hunter2").await;
        app.send(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({"email": "dana@clinic.test"})),
        )
        .await;
        let reset = reset_token_from(&app.mailer);

        let body = json!({"token": reset, "password": "a-fresh-password"});
        let (first, _) = app
            .send("POST", "/api/auth/reset-password", None, Some(body.clone()))
            .await;
        let (second, err) = app
            .send("POST", "/api/auth/reset-password", None, Some(body))
            .await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["message"], "Invalid or expired reset token");

        let (status, _) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "dana@clinic.test", "password": "a-fresh-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn session_token_is_not_a_reset_token() {
        let app = TestApp::new();
        let session = app.register("dana@clinic.test", "hunter2hunter2").await;
        let (status, body) = app
            .send(
                "POST",
                "/api/auth/reset-password",
                None,
                Some(json!({"token": session, "password": "a-fresh-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid reset token");
    }

    #[tokio::test]
    async fn reset_token_is_not_a_session_token() {
        let app = TestApp::new();
        let reset = TokenSigner::new(SECRET)
            .sign(&TokenClaims::new(
                uuid::Uuid::new_v4().to_string(),
                "dana@clinic.test".into(),
                TokenPurpose::PasswordReset,
                Utc::now().timestamp(),
            ))
            .unwrap();
        let (status, _) = app.send("GET", "/api/claims", Some(&reset), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn account_routes_are_rate_limited() {
        let app = TestApp::new();
        let ctx = ApiContext::with_limiter(app.core.clone(), RateLimiter::new(2, 100));
        let router = api_router_with_ctx(ctx);
        let login = || {
            make_request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "x@y.test", "password": "whatever-pass"})),
            )
        };

        for _ in 0..2 {
            let response = router.clone().oneshot(login()).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let response = router.clone().oneshot(login()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
    }

    fn login_from(peer: &str, forwarded: Option<&str>) -> Request<Body> {
        let mut req = make_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "x@y.test", "password": "whatever-pass"})),
        );
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        if let Some(hop) = forwarded {
            req.headers_mut()
                .insert("X-Forwarded-For", hop.parse().unwrap());
        }
        req
    }

    #[tokio::test]
    async fn one_client_cannot_exhaust_anothers_login_budget() {
        let app = TestApp::new();
        let ctx = ApiContext::with_limiter(app.core.clone(), RateLimiter::new(3, 100));
        let router = api_router_with_ctx(ctx);

        for _ in 0..3 {
            let response = router
                .clone()
                .oneshot(login_from("203.0.113.7:40000", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let blocked = router
            .clone()
            .oneshot(login_from("203.0.113.7:40001", None))
            .await
            .unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = router
            .clone()
            .oneshot(login_from("198.51.100.9:40000", None))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rotating_forwarded_header_is_still_limited() {
        let app = TestApp::new();
        let ctx = ApiContext::with_limiter(app.core.clone(), RateLimiter::new(3, 100));
        let router = api_router_with_ctx(ctx);

        let mut limited = 0;
        for i in 0..10 {
            let hop = format!("10.9.9.{i}");
            let response = router
                .clone()
                .oneshot(login_from("203.0.113.7:40000", Some(&hop)))
                .await
                .unwrap();
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                limited += 1;
            }
        }
        assert_eq!(limited, 7);
    }

    #[tokio::test]
    async fn trusted_proxy_limits_per_forwarded_client() {
        let app = TestApp::new();
        let core = Arc::new(
            CoreState::new(
                Database::open_in_memory().unwrap(),
                AuthService::new(
                    TokenSigner::new(SECRET),
                    1_000,
                    "https://app.claimrx.test".into(),
                    app.mailer.clone(),
                ),
                Arc::new(TemplateGenerator),
            )
            .with_trusted_proxy(true),
        );
        let router = api_router_with_ctx(ApiContext::with_limiter(core, RateLimiter::new(1, 100)));
        let proxy = "10.0.0.2:8080";

        let first = router.clone().oneshot(login_from(proxy, Some("198.51.100.1"))).await.unwrap();
        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
        let second = router.clone().oneshot(login_from(proxy, Some("198.51.100.2"))).await.unwrap();
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
        let repeat = router.clone().oneshot(login_from(proxy, Some("198.51.100.1"))).await.unwrap();
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    // ── claims & appeals ──────────────────────────────────

    #[tokio::test]
    async fn claim_lifecycle() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;

        let created = app.create_claim(&token, "John Smith", "Blue Cross").await;
        assert_eq!(created["id"], "CLM-001");
        assert_eq!(created["status"], "pending");

        let (status, claims) = app.send("GET", "/api/claims", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claims.as_array().unwrap().len(), 1);
        assert_eq!(claims[0]["payerAvgResponseDays"], 28);
        assert!(claims[0].get("payerContact").is_none());

        let (status, patched) = app
            .send(
                "PATCH",
                "/api/claims/CLM-001",
                Some(&token),
                Some(json!({"status": "urgent"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["status"], "urgent");

        let (status, _) = app
            .send(
                "PATCH",
                "/api/claims/CLM-001",
                Some(&token),
                Some(json!({"status": "closed"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send("GET", "/api/claims/CLM-999", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Claim not found");
    }

    #[tokio::test]
    async fn create_claim_requires_fields() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        let (status, body) = app
            .send(
                "POST",
                "/api/claims",
                Some(&token),
                Some(json!({"patient": "John Smith"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("denialReason"));
    }

    #[tokio::test]
    async fn appeal_marks_claim_appealed_and_lists_first() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        app.create_claim(&token, "John Smith", "Blue Cross").await;
        app.create_claim(&token, "Maria Garcia", "Aetna").await;

        let (status, first) = app
            .send(
                "POST",
                "/api/appeals",
                Some(&token),
                Some(json!({"claimId": "CLM-002"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["patient"], "Maria Garcia");

        let (status, appeal) = app
            .send(
                "POST",
                "/api/appeals",
                Some(&token),
                Some(json!({"claimId": "CLM-001"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(appeal["id"], "APL-002");
        assert_eq!(appeal["amount"], 4500.0);
        assert_eq!(appeal["status"], "pending");

        let (_, claim) = app
            .send("GET", "/api/claims/CLM-001", Some(&token), None)
            .await;
        assert_eq!(claim["status"], "appealed");

        let (_, appeals) = app.send("GET", "/api/appeals", Some(&token), None).await;
        assert_eq!(appeals[0]["id"], "APL-002");
        assert_eq!(appeals[0]["claimId"], "CLM-001");
    }

    #[tokio::test]
    async fn appeal_requires_existing_claim() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;

        let (status, _) = app
            .send("POST", "/api/appeals", Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(
                "POST",
                "/api/appeals",
                Some(&token),
                Some(json!({"claimId": "CLM-404"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Claim not found");

        let (_, appeals) = app.send("GET", "/api/appeals", Some(&token), None).await;
        assert!(appeals.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn decisions_feed_stats() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        for i in 0..5 {
            app.create_claim(&token, &format!("Patient {i}"), "Aetna").await;
            app.send(
                "POST",
                "/api/appeals",
                Some(&token),
                Some(json!({"claimId": format!("CLM-{:03}", i + 1)})),
            )
            .await;
        }

        for (id, status, recovered) in [
            ("APL-001", "approved", Some(1000.0)),
            ("APL-002", "approved", Some(500.0)),
            ("APL-003", "approved", Some(250.0)),
            ("APL-004", "denied", None),
            ("APL-005", "in-review", None),
        ] {
            let (code, appeal) = app
                .send(
                    "PATCH",
                    &format!("/api/appeals/{id}"),
                    Some(&token),
                    Some(json!({"status": status, "recoveredAmount": recovered})),
                )
                .await;
            assert_eq!(code, StatusCode::OK);
            if status == "in-review" {
                assert!(appeal["decidedDate"].is_null());
            } else {
                assert_eq!(appeal["daysToDecision"], 0);
            }
        }

        let (status, stats) = app.send("GET", "/api/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["successRate"], 75);
        assert_eq!(stats["totalRecovered"], 1750.0);
        assert_eq!(stats["pendingAppeals"], 1);
        assert_eq!(stats["totalClaims"], 5);
        assert_eq!(stats["totalDenied"], 22500.0);

        let (status, _) = app
            .send(
                "PATCH",
                "/api/appeals/APL-999",
                Some(&token),
                Some(json!({"status": "approved"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn payers_listed_by_name() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        let (status, payers) = app.send("GET", "/api/payers", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = payers
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Aetna", "Blue Cross", "Cigna", "Medicare", "UnitedHealth"]
        );
    }

    // ── letters ───────────────────────────────────────────

    fn letter_request() -> Value {
        json!({"claim": {
            "id": "CLM-001",
            "patient": "John Smith",
            "amount": 4500,
            "payer": "Blue Cross",
            "denialReason": "Medical necessity not established",
            "deniedDate": "2024-01-15"
        }})
    }

    #[tokio::test]
    async fn generate_uses_template_without_api_key() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        let (status, body) = app
            .send("POST", "/api/appeals/generate", Some(&token), Some(letter_request()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "template");
        let letter = body["letter"].as_str().unwrap();
        assert!(letter.starts_with("Dear Claims Review Department,"));
        assert!(letter.contains("claim CLM-001 for patient John Smith"));
        assert!(letter.contains("$4500"));
    }

    #[tokio::test]
    async fn generate_without_claim_is_400() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        let (status, _) = app
            .send("POST", "/api/appeals/generate", Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_stream_emits_tokens_then_done() {
        let app = TestApp::new();
        let token = app.register("dana@clinic.test", "hunter2hunter2").await;
        let response = app
            .router()
            .oneshot(make_request(
                "POST",
                "/api/appeals/generate/stream",
                Some(&token),
                Some(letter_request()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("Content-Type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let token_at = text.find("event: token").unwrap();
        let done_at = text.find("event: done").unwrap();
        assert!(token_at < done_at);
        assert!(text.contains("\"source\":\"template\""));
    }
}
