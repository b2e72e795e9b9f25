/// TaskHub Web - Middleware module.
pub mod auth;

pub use auth::{AuthUser, OptionalAuthUser, auth_middleware};
