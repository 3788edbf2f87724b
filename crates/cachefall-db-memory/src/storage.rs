use async_trait::async_trait;
use cachefall_storage::{NewUser, StorageError, StorageResult, User, UserStore};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory user storage backend.
///
/// The original deployment of this service used a demo-grade embedded
/// database; this backend plays that role so the service runs without any
/// external relational store. IDs are assigned from a monotonically
/// increasing counter, matching identity-column behavior.
#[derive(Debug)]
pub struct InMemoryUserStore {
    data: Arc<DashMap<i64, User>>,
    id_counter: AtomicI64,
}

impl InMemoryUserStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            id_counter: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.id_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn insert_one(&self, user: &NewUser) -> StorageResult<User> {
        user.validate().map_err(StorageError::invalid_user)?;
        let id = self.next_id();
        let created = User::new(id, &user.name, &user.email, &user.designation);
        self.data.insert(id, created.clone());
        Ok(created)
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &NewUser) -> StorageResult<User> {
        self.insert_one(user)
    }

    async fn create_bulk(&self, users: &[NewUser]) -> StorageResult<Vec<User>> {
        let mut created = Vec::with_capacity(users.len());
        for user in users {
            created.push(self.insert_one(user)?);
        }
        Ok(created)
    }

    async fn get(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.data.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_name(&self, name: &str) -> StorageResult<Option<User>> {
        let mut matched: Option<User> = None;
        for entry in self.data.iter() {
            if entry.name.eq_ignore_ascii_case(name) {
                // Prefer the lowest ID so lookups are deterministic
                match &matched {
                    Some(existing) if existing.id <= entry.id => {}
                    _ => matched = Some(entry.clone()),
                }
            }
        }
        Ok(matched)
    }

    async fn list(&self) -> StorageResult<Vec<User>> {
        let mut users: Vec<User> = self.data.iter().map(|entry| entry.clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn update(&self, id: i64, update: &NewUser) -> StorageResult<Option<User>> {
        update.validate().map_err(StorageError::invalid_user)?;
        // Entry-scoped mutation keeps concurrent updates to the same ID serialized
        match self.data.get_mut(&id) {
            Some(mut entry) => {
                let updated = entry.with_update(update);
                *entry = updated.clone();
                Ok(Some(updated))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        match self.data.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(id)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
