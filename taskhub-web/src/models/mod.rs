/// TaskHub Web - Data models.
pub mod category;
pub mod notification;
pub mod page;
pub mod push;
pub mod task;
pub mod user;

pub use category::{Category, CategoryInput, NewCategory};
pub use notification::{
    NewNotification, Notification, NotificationDto, NotificationKind, NotificationPayload,
};
pub use page::{Page, PageRequest};
pub use push::{ClientCommand, PushMessage};
pub use task::{NewTask, Task, TaskInput, TaskPriority, TaskQuery, TaskStats, TaskStatus};
pub use user::{NewUser, User};
