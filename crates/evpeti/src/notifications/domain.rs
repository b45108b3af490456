use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Record;
use crate::users::UserId;

/// Identifier wrapper for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tag carried on the wire; the variant names are the stable client-facing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    BookingRequest,
    BookingAccepted,
    BookingRejected,
    BookingCompleted,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::BookingRequest => "BookingRequest",
            NotificationKind::BookingAccepted => "BookingAccepted",
            NotificationKind::BookingRejected => "BookingRejected",
            NotificationKind::BookingCompleted => "BookingCompleted",
        }
    }
}

/// Entity a notification points back at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedType {
    Booking,
}

/// Everything needed to record a notification except server-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    pub related_id: Option<u64>,
    pub related_type: Option<RelatedType>,
    /// Key/value facts about the triggering event.
    pub extra_data: Option<BTreeMap<String, String>>,
}

/// Stored notification. Only the read flag and read-at timestamp change after creation, and
/// only from unread to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    pub related_id: Option<u64>,
    pub related_type: Option<RelatedType>,
    pub extra_data: Option<BTreeMap<String, String>>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    revision: u64,
}

impl Notification {
    pub fn from_draft(
        id: NotificationId,
        draft: NotificationDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            kind: draft.kind,
            title: draft.title,
            content: draft.content,
            related_id: draft.related_id,
            related_type: draft.related_type,
            extra_data: draft.extra_data,
            is_read: false,
            read_at: None,
            created_at,
            revision: 0,
        }
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Flip to read and bump the revision. Returns `false` when it already was, leaving
    /// `read_at` untouched.
    pub(crate) fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        self.revision += 1;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFilter {
    Recipient(UserId),
    UnreadFor(UserId),
}

impl Record for Notification {
    type Id = NotificationId;
    type Filter = NotificationFilter;

    fn id(&self) -> &NotificationId {
        &self.id
    }

    fn matches(&self, filter: &NotificationFilter) -> bool {
        match filter {
            NotificationFilter::Recipient(user_id) => self.user_id == *user_id,
            NotificationFilter::UnreadFor(user_id) => self.user_id == *user_id && !self.is_read,
        }
    }

    fn revision(&self) -> Option<u64> {
        Some(self.revision)
    }
}
