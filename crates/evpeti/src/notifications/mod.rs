//! Per-user notification records created as side effects of booking decisions.

pub mod dispatcher;
pub mod domain;
pub mod router;

pub use dispatcher::{NotificationDispatcher, NotificationError, NotificationSink};
pub use domain::{
    Notification, NotificationDraft, NotificationFilter, NotificationId, NotificationKind,
    RelatedType,
};
pub use router::notification_router;
