use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::StoreError,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
}

/// Process-local credential store. Both unique indexes sit under one lock so the
/// duplicate check and the insert are a single step.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().users.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock();
        if inner.by_email.contains_key(&new_user.email)
            || inner.by_username.contains_key(&new_user.username)
            || inner.users.contains_key(&new_user.id)
        {
            return Err(StoreError::Duplicate);
        }
        let user = new_user.into_user(OffsetDateTime::now_utc());
        inner.by_email.insert(user.email.clone(), user.id);
        inner.by_username.insert(user.username.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }
}
