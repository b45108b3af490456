use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{Notification, NotificationDraft, NotificationFilter, NotificationId};
use crate::clock::{Clock, SystemClock};
use crate::storage::{insert_sequenced, Repository, RepositoryError, Sequence};
use crate::users::UserId;

const MAX_BATCH_ATTEMPTS: usize = 8;

/// Outbound hook the booking lifecycle reports decisions through.
///
/// Callers treat delivery as best effort: an `Err` is theirs to log, never to propagate.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, draft: NotificationDraft) -> Result<Notification, NotificationError>;
}

/// Persists notifications and serves the recipient-side reads and acknowledgements.
pub struct NotificationDispatcher<N> {
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
    sequence: Sequence,
}

impl<N> NotificationDispatcher<N>
where
    N: Repository<Notification> + 'static,
{
    pub fn new(notifications: Arc<N>) -> Self {
        Self {
            notifications,
            clock: Arc::new(SystemClock),
            sequence: Sequence::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Record an unread notification for `draft.user_id`.
    pub fn dispatch(&self, draft: NotificationDraft) -> Result<Notification, NotificationError> {
        let created_at = self.clock.now();
        let notification = insert_sequenced(self.notifications.as_ref(), &self.sequence, |id| {
            Notification::from_draft(NotificationId(id), draft.clone(), created_at)
        })?;

        info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            kind = notification.kind.label(),
            "notification recorded"
        );
        Ok(notification)
    }

    /// All notifications for a user, newest first.
    pub fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, NotificationError> {
        let mut notifications = self
            .notifications
            .query(&NotificationFilter::Recipient(user_id))?;
        notifications.sort_by_key(|notification| {
            Reverse((notification.created_at, notification.id))
        });
        Ok(notifications)
    }

    pub fn unread_count(&self, user_id: UserId) -> Result<usize, NotificationError> {
        Ok(self
            .notifications
            .query(&NotificationFilter::UnreadFor(user_id))?
            .len())
    }

    /// Mark one notification read. Already-read notifications are returned unchanged.
    pub fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> Result<Notification, NotificationError> {
        let mut notification = self
            .notifications
            .fetch(&notification_id)?
            .ok_or(NotificationError::NotFound(notification_id))?;

        if !notification.mark_read(self.clock.now()) {
            debug!(notification_id = %notification_id, "notification already read");
            return Ok(notification);
        }

        match self.notifications.update(notification.clone()) {
            Ok(()) => Ok(notification),
            Err(RepositoryError::StaleRevision) => {
                // Another request stored the read first; its read-at stands.
                debug!(notification_id = %notification_id, "notification read concurrently");
                self.notifications
                    .fetch(&notification_id)?
                    .ok_or(NotificationError::NotFound(notification_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Mark every unread notification of `user_id` read in one batch, returning how many changed.
    ///
    /// A batch that loses a race with another read is re-read and retried, so notifications read
    /// concurrently keep their original read-at.
    pub fn mark_all_read(&self, user_id: UserId) -> Result<usize, NotificationError> {
        let read_at = self.clock.now();
        for _ in 0..MAX_BATCH_ATTEMPTS {
            let mut unread = self
                .notifications
                .query(&NotificationFilter::UnreadFor(user_id))?;
            for notification in &mut unread {
                notification.mark_read(read_at);
            }

            let updated = unread.len();
            if updated > 0 {
                match self.notifications.update_batch(unread) {
                    Ok(()) => {}
                    Err(RepositoryError::StaleRevision) => {
                        debug!(user_id = %user_id, "mark-all-read raced another read; retrying");
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            info!(user_id = %user_id, updated, "notifications marked read");
            return Ok(updated);
        }
        Err(RepositoryError::StaleRevision.into())
    }
}

impl<N> NotificationSink for NotificationDispatcher<N>
where
    N: Repository<Notification> + 'static,
{
    fn notify(&self, draft: NotificationDraft) -> Result<Notification, NotificationError> {
        self.dispatch(draft)
    }
}

/// Error raised by the notification dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
