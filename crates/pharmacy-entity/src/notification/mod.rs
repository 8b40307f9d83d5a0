//! Notification domain entities.

pub mod kind;
pub mod model;
pub mod payload;
pub mod priority;
pub mod subject;

pub use kind::NotificationType;
pub use model::{DuplicateQuery, NewNotification, Notification, NotificationCount};
pub use payload::{AlertCause, AlertPayload};
pub use priority::NotificationPriority;
pub use subject::{AlertSubject, SubjectKind};
