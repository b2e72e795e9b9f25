/// TaskHub Web - Test infrastructure.
///
/// Common utilities for integration tests.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum_test::TestServer;

pub use taskhub_web::{assert_err, unwrap_ok, unwrap_some};
use taskhub_web::{
    AppState,
    config::Config,
    models::{NewUser, User},
    routes::create_app,
    store::{MemoryStore, UserStore},
};

/// Configuration used by every test: default.toml overlaid with testing.toml.
pub fn test_config() -> Config {
    unwrap_ok!(Config::from_toml_with_overlay(
        include_str!("../../../config/default.toml"),
        include_str!("../../../config/testing.toml"),
    ))
}

/// A user together with a valid access token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> i32 {
        self.user.id
    }
}

/// Test application wrapper.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Create a fresh application over an empty in-memory store.
    pub fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = unwrap_ok!(AppState::new(test_config(), store.clone()));
        let server = unwrap_ok!(TestServer::new(create_app(state.clone())));
        Self {
            server,
            state,
            store,
        }
    }

    /// Serve the same application on a real socket, for WebSocket clients.
    pub async fn serve(&self) -> SocketAddr {
        let listener = unwrap_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
        let addr = unwrap_ok!(listener.local_addr());
        let app = create_app(self.state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    pub async fn create_user(&self, username: &str) -> TestUser {
        self.insert_user(NewUser::new(username, format!("{username}@example.com")))
            .await
    }

    pub async fn insert_user(&self, new: NewUser) -> TestUser {
        let user = unwrap_ok!(self.store.insert_user(new).await);
        let token = unwrap_ok!(
            self.state
                .auth_service
                .generate_access_token(user.id, &user.username)
        );
        TestUser { user, token }
    }

    /// Generate authorization header with JWT token.
    pub fn auth_header(&self, token: &str) -> HeaderValue {
        unwrap_ok!(HeaderValue::from_str(&format!("Bearer {}", token)))
    }
}
