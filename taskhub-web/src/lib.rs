//! TaskHub Web - Library crate exposing all modules.
//!
//! This file makes modules available for integration tests and the
//! operator binaries.

// Clippy lints to enforce proper error handling
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::todo)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Test utilities - macros for replacing unwrap/expect in tests
#[macro_use]
pub mod test_utils;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use std::sync::Arc;

use config::Config;
use error::AppResult;
use services::auth::AuthService;
use services::channels::ChannelLayer;
use services::dispatcher::NotificationDispatcher;
use store::{NotificationStore, Store};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    /// Same store, seen through the notification port only.
    pub notifications: Arc<dyn NotificationStore>,
    pub auth_service: AuthService,
    /// Per-user groups of live WebSocket connections.
    pub channels: ChannelLayer,
    pub dispatcher: NotificationDispatcher,
}

impl AppState {
    pub fn new<S>(config: Config, store: Arc<S>) -> AppResult<Self>
    where
        S: Store + 'static,
    {
        let auth_service = AuthService::new(&config)?;
        let channels = ChannelLayer::new();
        let dispatcher =
            NotificationDispatcher::new(store.clone(), store.clone(), channels.clone());

        Ok(Self {
            config: Arc::new(config),
            notifications: store.clone(),
            store,
            auth_service,
            channels,
            dispatcher,
        })
    }
}
