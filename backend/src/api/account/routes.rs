//! Defines the HTTP routes for the account pages.
//!
//! These routes are nested under `/account` by the application router.

use super::handlers::{
    activate, activate_path, index, login, login_page, logoff, register, register_page,
};
use crate::auth::middleware::require_user;
use axum::{Router, middleware, routing::get};

pub fn account_router() -> Router {
    Router::new()
        .route("/", get(index).layer(middleware::from_fn(require_user)))
        .route("/login", get(login_page).post(login))
        .route("/logoff", get(logoff).post(logoff))
        .route("/register", get(register_page).post(register))
        .route("/activate", get(activate))
        .route("/activate/{hash}", get(activate_path))
}

#[cfg(test)]
mod tests {
    use crate::api::app_router;
    use crate::config::Config;
    use crate::database::models::UserClass;
    use crate::database::test_pool;
    use crate::profiling::SERVER_TIMING;
    use crate::repositories::user_repository::UserRepository;
    use crate::services::email_service::testing::RecordingMailer;
    use crate::utils::jwt::JwtUtils;
    use axum::{
        Router,
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use sqlx::SqlitePool;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        pool: SqlitePool,
        mailer: Arc<RecordingMailer>,
    }

    impl TestApp {
        async fn new() -> Self {
            Self::with_config(Config::for_tests()).await
        }

        async fn with_config(config: Config) -> Self {
            let pool = test_pool().await;
            let mailer = Arc::new(RecordingMailer::default());
            let router = app_router(pool.clone(), Arc::new(config), mailer.clone());
            Self {
                router,
                pool,
                mailer,
            }
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
            let mut request = Request::builder().uri(uri);
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            self.router
                .clone()
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }

        async fn post_form(&self, uri: &str, body: &str) -> Response {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn register(&self, username: &str, email: &str, password: &str) -> Response {
            let body = format!(
                "username={username}&email={email}&password={password}&confirm_password={password}"
            );
            self.post_form("/account/register", &body).await
        }

        async fn activate_user(&self, username: &str) {
            let secret = UserRepository::new(&self.pool)
                .get_user_by_username(username)
                .await
                .unwrap()
                .unwrap()
                .activate_secret;
            let response = self.get(&format!("/account/activate/{secret}"), None).await;
            assert_eq!(location(&response), "/account/login?message=activationsuccess");
        }

        async fn registered_and_activated(&self, username: &str) {
            self.register(username, &format!("{username}%40example.com"), "secret123")
                .await;
            self.activate_user(username).await;
        }
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn set_cookie(response: &Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_register_creates_unactivated_user_and_redirects() {
        let app = TestApp::new().await;

        let response = app.register("alice", "alice%40example.com", "secret123").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/account/login?message=registersuccess");

        let user = UserRepository::new(&app.pool)
            .get_user_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert!(!user.activated);
        assert_ne!(user.password_hash, "secret123");
        assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_rerenders_with_error() {
        let app = TestApp::new().await;
        app.register("alice", "alice%40example.com", "secret123").await;

        let response = app.register("alice", "other%40example.com", "secret123").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(
            "showError('User name already exists. Please enter a different user name.');"
        ));
        assert!(body.contains("value=\"other@example.com\""));
    }

    #[tokio::test]
    async fn test_register_invalid_form_shows_field_errors() {
        let app = TestApp::new().await;

        let response = app
            .post_form(
                "/account/register",
                "username=alice&email=alice%40example.com&password=abc&confirm_password=xyz",
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("The Password must be at least 6 characters long."));
        assert!(body.contains("The password and confirmation password do not match."));
        assert!(
            UserRepository::new(&app.pool)
                .get_user_by_username("alice")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_activation_redirects() {
        let app = TestApp::new().await;
        app.register("alice", "alice%40example.com", "secret123").await;

        let response = app.get("/account/activate?hash=wrong", None).await;
        assert_eq!(location(&response), "/account/login?message=activationfail");

        let response = app.get("/account/activate", None).await;
        assert_eq!(location(&response), "/account/login?message=activationfail");

        let secret = UserRepository::new(&app.pool)
            .get_user_by_username("alice")
            .await
            .unwrap()
            .unwrap()
            .activate_secret;

        let response = app.get(&format!("/account/activate?hash={secret}"), None).await;
        assert_eq!(location(&response), "/account/login?message=activationsuccess");

        let response = app.get(&format!("/account/activate/{secret}"), None).await;
        assert_eq!(location(&response), "/account/login?message=activateexist");

        let user = UserRepository::new(&app.pool)
            .get_user_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.class, UserClass::Member);
        assert_eq!(user.uploaded, Config::for_tests().default_uploaded_value);
    }

    #[tokio::test]
    async fn test_login_page_shows_status_message() {
        let app = TestApp::new().await;

        let body = body_text(app.get("/account/login?message=activateexist", None).await).await;
        assert!(body.contains("showError('Your account has already been activated.');"));

        let body = body_text(app.get("/account/login?message=whatever", None).await).await;
        assert!(!body.contains("showError('"));
        assert!(!body.contains("showSuccess('"));
    }

    #[tokio::test]
    async fn test_login_rejects_unactivated_user() {
        let app = TestApp::new().await;
        app.register("alice", "alice%40example.com", "secret123").await;

        let response = app
            .post_form("/account/login", "username=alice&password=secret123")
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = body_text(response).await;
        assert!(body.contains("The user name or password provided is incorrect."));
        assert!(body.contains("showError('The username or password provided is incorrect..');"));
    }

    #[tokio::test]
    async fn test_login_with_missing_fields_shows_field_errors() {
        let app = TestApp::new().await;

        let response = app.post_form("/account/login", "username=alice").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("The Password field is required."));
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie_and_redirects_home() {
        let app = TestApp::new().await;
        app.registered_and_activated("alice").await;

        let response = app
            .post_form("/account/login", "username=alice&password=secret123")
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/account");
        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("tracker_auth="));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Max-Age"));

        let token = cookie["tracker_auth=".len()..].split(';').next().unwrap();
        let claims = JwtUtils::new(&Config::for_tests().auth_secret)
            .validate_token(token)
            .unwrap();
        let user = UserRepository::new(&app.pool)
            .get_user_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claims.username(), "alice");
        assert_eq!(claims.user_id(), user.id);
        assert!(!claims.persistent);
    }

    #[tokio::test]
    async fn test_remember_me_sets_persistent_cookie() {
        let app = TestApp::new().await;
        app.registered_and_activated("alice").await;

        let response = app
            .post_form(
                "/account/login",
                "username=alice&password=secret123&remember_me=true",
            )
            .await;

        let cookie = set_cookie(&response);
        assert!(cookie.contains("Max-Age=7200"));
    }

    #[tokio::test]
    async fn test_login_honours_only_local_return_urls() {
        let app = TestApp::new().await;
        app.registered_and_activated("alice").await;

        let response = app
            .post_form(
                "/account/login?returnUrl=%2Ftorrents%3Fpage%3D2",
                "username=alice&password=secret123",
            )
            .await;
        assert_eq!(location(&response), "/torrents?page=2");

        let response = app
            .post_form(
                "/account/login?returnUrl=https%3A%2F%2Fevil.example.com",
                "username=alice&password=secret123",
            )
            .await;
        assert_eq!(location(&response), "/account");

        for return_url in [
            "%2F%2Fevil.example.com",
            "~%2F%2Fevil.example.com",
            "~%2F%5Cevil.example.com",
        ] {
            let response = app
                .post_form(
                    &format!("/account/login?returnUrl={return_url}"),
                    "username=alice&password=secret123",
                )
                .await;
            assert_eq!(location(&response), "/account", "returnUrl={return_url}");
        }

        let response = app
            .post_form(
                "/account/login?returnUrl=~%2Ftorrents",
                "username=alice&password=secret123",
            )
            .await;
        assert_eq!(location(&response), "/torrents");
    }

    #[tokio::test]
    async fn test_index_requires_login() {
        let app = TestApp::new().await;

        let response = app.get("/account", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/account/login?returnUrl=%2Faccount");

        let response = app.get("/account", Some("tracker_auth=not-a-token")).await;
        assert_eq!(location(&response), "/account/login?returnUrl=%2Faccount");
    }

    #[tokio::test]
    async fn test_index_shows_signed_in_user() {
        let app = TestApp::new().await;
        app.registered_and_activated("alice").await;

        let response = app
            .post_form("/account/login", "username=alice&password=secret123")
            .await;
        let cookie = set_cookie(&response);
        let cookie = cookie.split(';').next().unwrap();

        let response = app.get("/account", Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Welcome, alice"));
        assert!(body.contains("Class: Member"));
        assert!(body.contains("10.00 GiB"));
    }

    #[tokio::test]
    async fn test_logoff_clears_cookie() {
        let app = TestApp::new().await;

        let response = app.get("/account/logoff", Some("tracker_auth=anything")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/account");
        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("tracker_auth="));
        assert!(cookie.contains("Max-Age=0"));
    }

    fn loopback_request(method: &str, uri: &str, form: Option<&str>) -> Request<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match form {
            Some(form) => {
                request = request.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let mut request = request.body(body).unwrap();
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    fn server_timing(response: &Response) -> String {
        response
            .headers()
            .get(SERVER_TIMING)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_profiled_pages_report_their_steps() {
        let mut config = Config::for_tests();
        config.profiling_enabled = true;
        let app = TestApp::with_config(config).await;

        let response = app
            .router
            .clone()
            .oneshot(loopback_request("GET", "/account/login", None))
            .await
            .unwrap();
        let timing = server_timing(&response);
        assert!(timing.starts_with("render;dur="));
        assert!(timing.contains("total;dur="));

        let response = app
            .router
            .clone()
            .oneshot(loopback_request(
                "POST",
                "/account/register",
                Some("username=alice&email=alice%40example.com&password=secret123&confirm_password=secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/account/login?message=registersuccess");
        let timing = server_timing(&response);
        assert!(timing.contains("bcrypt-password;dur="));
        assert!(timing.contains("register-user;dur="));
        assert!(!timing.contains("render;"));

        let response = app
            .router
            .clone()
            .oneshot(loopback_request("GET", "/account/logoff", None))
            .await
            .unwrap();
        assert!(server_timing(&response).starts_with("total;dur="));
    }
}
