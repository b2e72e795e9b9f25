/// TaskHub Web - Services module.
pub mod auth;
pub mod channels;
pub mod dispatcher;
pub mod live;

pub use auth::{AuthService, Claims};
pub use channels::{ChannelKey, ChannelLayer, Connection, Membership};
pub use dispatcher::{BatchReport, NotificationDispatcher};
pub use live::{ConnectionState, LiveConnection, OpenedConnection};
