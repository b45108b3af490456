use std::sync::Arc;

use tracing::info;

use super::domain::{NewUser, User, UserFilter, UserId};
use crate::clock::{Clock, SystemClock};
use crate::storage::{insert_sequenced, Repository, RepositoryError, Sequence};

/// Read/write boundary over user profiles.
pub struct UserDirectory<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    sequence: Sequence,
}

impl<U> UserDirectory<U>
where
    U: Repository<User> + 'static,
{
    pub fn new(users: Arc<U>) -> Self {
        Self {
            users,
            clock: Arc::new(SystemClock),
            sequence: Sequence::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a profile with a zero rating. E-mail addresses are unique, ignoring case.
    pub fn register(&self, request: NewUser) -> Result<User, UserError> {
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_string();
        if name.is_empty() {
            return Err(UserError::MissingName);
        }
        if !email.contains('@') {
            return Err(UserError::InvalidEmail(email));
        }

        if !self
            .users
            .query(&UserFilter::Email(email.clone()))?
            .is_empty()
        {
            return Err(UserError::DuplicateEmail(email));
        }

        let created_at = self.clock.now();
        let user = insert_sequenced(self.users.as_ref(), &self.sequence, |id| {
            let mut user = User::new(UserId(id), name.clone(), email.clone());
            user.created_at = created_at;
            user
        })?;

        info!(user_id = %user.id, "user profile registered");
        Ok(user)
    }

    pub fn get(&self, user_id: UserId) -> Result<User, UserError> {
        self.users
            .fetch(&user_id)?
            .ok_or(UserError::NotFound(user_id))
    }
}

/// Error raised by the user directory.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user name is required")]
    MissingName,
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("a user with e-mail '{0}' already exists")]
    DuplicateEmail(String),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
