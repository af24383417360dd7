//! # Middleware integration tests
//!
//! Login, bearer-token and refresh wrappers driven through an axum router.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::{get, post};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use jwt_handler::{
    AuthContext, Authenticator, BasicCredentials, Claims, JwtHandler, Options,
    signed_token_from_context, subject_from_context, subject_from_token, token_from_context,
};

const KEYS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/keys");

fn admin_only(u: &str, p: &str) -> bool {
    u == "admin" && p == "admin"
}

fn hs256() -> Options {
    Options::new("HS256").hmac_key("MYKEY").authenticator(admin_only)
}

fn handler(options: Options) -> JwtHandler {
    JwtHandler::new(options).unwrap()
}

async fn login(AuthContext(ctx): AuthContext) -> (StatusCode, String) {
    match signed_token_from_context(&ctx) {
        Some(token) => (StatusCode::OK, token.to_string()),
        None => (StatusCode::UNAUTHORIZED, String::new()),
    }
}

// The login middleware buffers the body; the handler must still be able to read it.
async fn echo_body(body: String) -> String {
    body
}

async fn hello(AuthContext(ctx): AuthContext) -> (StatusCode, String) {
    let Some(claims) = token_from_context(&ctx) else {
        return (StatusCode::UNAUTHORIZED, String::new());
    };
    match subject_from_token(claims) {
        Some(name) => (StatusCode::OK, name.to_string()),
        None => (StatusCode::UNAUTHORIZED, String::new()),
    }
}

async fn refresh(AuthContext(ctx): AuthContext) -> (StatusCode, String) {
    match signed_token_from_context(&ctx) {
        Some(token) => (StatusCode::OK, token.to_string()),
        None => (StatusCode::UNAUTHORIZED, String::new()),
    }
}

fn app(jwt: &JwtHandler) -> Router {
    Router::new()
        .merge(jwt.authentication(
            Router::new()
                .route("/login", post(login))
                .route("/login/echo", post(echo_body)),
        ))
        .merge(jwt.authorization(Router::new().route("/hello", get(hello))))
        .merge(jwt.refresh(Router::new().route("/refresh", get(refresh))))
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_login(username: &str, password: &str) -> Request<Body> {
    Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

fn bearer(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn login_with_valid_credentials_issues_token() {
    let jwt = handler(hs256().token_ttl(Duration::from_secs(900)));
    let before = now();

    let response = app(&jwt).oneshot(form_login("admin", "admin")).await.unwrap();
    let after = now();

    assert_eq!(response.status(), StatusCode::OK);
    let token = body_string(response).await;
    let claims = jwt.verify(&token).unwrap();
    assert_eq!(claims.sub, "admin");
    assert!(claims.exp >= before + 900 && claims.exp <= after + 900);
    assert_eq!(claims.exp - claims.iat.unwrap(), 900);
}

#[tokio::test]
async fn login_with_multipart_form_issues_token() {
    let jwt = handler(hs256());
    let body = "--X\r\n\
        Content-Disposition: form-data; name=\"username\"\r\n\r\nadmin\r\n\
        --X\r\n\
        Content-Disposition: form-data; name=\"password\"\r\n\r\nadmin\r\n\
        --X--\r\n";

    let response = app(&jwt)
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let token = body_string(response).await;
    assert_eq!(jwt.verify(&token).unwrap().sub, "admin");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let jwt = handler(hs256());

    let response = app(&jwt).oneshot(form_login("admin", "wrong")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    assert_eq!(
        body,
        r#"{"error":{"code":"UNAUTHORIZED","message":"unauthorized"}}"#
    );
}

#[tokio::test]
async fn login_without_credentials_is_unauthorized() {
    let jwt = handler(hs256());

    let response = app(&jwt)
        .oneshot(Request::post("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_body_reaches_downstream_handler() {
    let jwt = handler(hs256());

    let response = app(&jwt)
        .oneshot(
            Request::post("/login/echo")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=admin"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "username=admin&password=admin");
}

#[tokio::test]
async fn oversized_login_body_is_rejected() {
    let jwt = handler(hs256().max_body_bytes(16));

    let response = app(&jwt).oneshot(form_login("admin", "admin")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

struct CountingAuthenticator {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn authenticate(&self, identifier: &str, secret: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        identifier == "alice" && secret == "s3cret"
    }
}

#[tokio::test]
async fn custom_authenticator_and_basic_extractor() {
    let calls = Arc::new(AtomicUsize::new(0));
    let jwt = handler(
        Options::new("HS512")
            .hmac_key("another key")
            .authenticator(CountingAuthenticator {
                calls: calls.clone(),
            })
            .credential_extractor(BasicCredentials),
    );
    let basic = base64::engine::general_purpose::STANDARD.encode("alice:s3cret");

    let response = app(&jwt)
        .oneshot(
            Request::post("/login")
                .header(header::AUTHORIZATION, format!("Basic {basic}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let token = body_string(response).await;
    assert_eq!(jwt.verify(&token).unwrap().sub, "alice");
}

#[tokio::test]
async fn authenticator_not_called_without_credentials() {
    let calls = Arc::new(AtomicUsize::new(0));
    let jwt = handler(
        Options::new("HS256")
            .hmac_key("MYKEY")
            .authenticator(CountingAuthenticator {
                calls: calls.clone(),
            }),
    );

    let response = app(&jwt)
        .oneshot(Request::post("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// -- Authorization ------------------------------------------------------------

#[tokio::test]
async fn issued_token_grants_access_and_exposes_subject() {
    let jwt = handler(hs256());
    let app = app(&jwt);

    let response = app.clone().oneshot(form_login("admin", "admin")).await.unwrap();
    let token = body_string(response).await;

    let response = app.oneshot(bearer("/hello", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "admin");
}

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let jwt = handler(hs256());

    let response = app(&jwt)
        .oneshot(Request::get("/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let jwt = handler(hs256());
    let token = jwt
        .codec()
        .encode(&Claims::new("admin", now() - 1))
        .unwrap();

    let response = app(&jwt).oneshot(bearer("/hello", &token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_from_other_key_is_rejected() {
    let jwt = handler(hs256());
    let other = handler(Options::new("HS256").hmac_key("OTHERKEY").authenticator(admin_only));
    let (token, _) = other.issue("admin").unwrap();

    let response = app(&jwt).oneshot(bearer("/hello", &token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn every_token_failure_has_the_same_body() {
    let jwt = handler(hs256());
    let (valid, _) = jwt.issue("admin").unwrap();
    let expired = jwt.codec().encode(&Claims::new("admin", now() - 10)).unwrap();
    let mut tampered = valid.clone();
    tampered.insert(valid.find('.').unwrap() + 1, 'x');

    let mut bodies = Vec::new();
    for token in ["garbage", expired.as_str(), tampered.as_str()] {
        let response = app(&jwt).oneshot(bearer("/hello", token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_string(response).await);
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn handler_without_wrapper_sees_empty_context() {
    let router: Router = Router::new().route(
        "/open",
        get(|AuthContext(ctx): AuthContext| async move {
            subject_from_context(&ctx).unwrap_or("anonymous").to_string()
        }),
    );

    let response = router
        .oneshot(Request::get("/open").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(body_string(response).await, "anonymous");
}

// -- Refresh ------------------------------------------------------------------

#[tokio::test]
async fn refresh_issues_later_token_for_same_subject() {
    let jwt = handler(
        hs256()
            .token_ttl(Duration::from_secs(60))
            .refresh_ttl(Duration::from_secs(3600)),
    );
    let (original, original_claims) = jwt.issue("admin").unwrap();

    let response = app(&jwt).oneshot(bearer("/refresh", &original)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = body_string(response).await;

    let renewed_claims = jwt.verify(&renewed).unwrap();
    assert_eq!(renewed_claims.sub, "admin");
    assert!(renewed_claims.exp > original_claims.exp);
    assert_ne!(renewed, original);

    // The original is not revoked.
    assert_eq!(jwt.verify(&original).unwrap(), original_claims);
}

#[tokio::test]
async fn refresh_rejects_expired_token() {
    let jwt = handler(hs256());
    let expired = jwt.codec().encode(&Claims::new("admin", now() - 1)).unwrap();

    let response = app(&jwt).oneshot(bearer("/refresh", &expired)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_requires_bearer_token() {
    let jwt = handler(hs256());

    let response = app(&jwt)
        .oneshot(Request::get("/refresh").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Asymmetric algorithms ----------------------------------------------------

async fn full_flow(jwt: JwtHandler) {
    let app = app(&jwt);

    let response = app.clone().oneshot(form_login("admin", "admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_string(response).await;

    let response = app.clone().oneshot(bearer("/hello", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "admin");

    let response = app.oneshot(bearer("/refresh", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = body_string(response).await;
    assert_eq!(jwt.verify(&renewed).unwrap().sub, "admin");
}

#[tokio::test]
async fn rs256_flow_with_key_files() {
    let jwt = handler(
        Options::new("RS256")
            .private_key_file(format!("{KEYS}/rsa_private.pem"))
            .public_key_file(format!("{KEYS}/rsa_public.pem"))
            .authenticator(admin_only),
    );
    full_flow(jwt).await;
}

#[tokio::test]
async fn ps256_flow_with_pem_bytes() {
    let jwt = handler(
        Options::new("PS256")
            .private_key_pem(std::fs::read(format!("{KEYS}/rsa_private.pem")).unwrap())
            .public_key_pem(std::fs::read(format!("{KEYS}/rsa_public.pem")).unwrap())
            .authenticator(admin_only),
    );
    full_flow(jwt).await;
}

#[tokio::test]
async fn es256_flow_with_key_files() {
    let jwt = handler(
        Options::new("ES256")
            .private_key_file(format!("{KEYS}/ec_private.pem"))
            .public_key_file(format!("{KEYS}/ec_public.pem"))
            .authenticator(admin_only),
    );
    full_flow(jwt).await;
}

// -- Concurrency --------------------------------------------------------------

#[tokio::test]
async fn concurrent_requests_keep_their_own_context() {
    let jwt = JwtHandler::new(
        Options::new("HS256")
            .hmac_key("MYKEY")
            .authenticator(|u: &str, p: &str| u == p),
    )
    .unwrap();
    let app = app(&jwt);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let name = format!("user{i}");
                let response = app.clone().oneshot(form_login(&name, &name)).await.unwrap();
                let token = body_string(response).await;
                let response = app.oneshot(bearer("/hello", &token)).await.unwrap();
                (name, body_string(response).await)
            })
        })
        .collect();

    for task in tasks {
        let (expected, seen) = task.await.unwrap();
        assert_eq!(expected, seen);
    }
}
