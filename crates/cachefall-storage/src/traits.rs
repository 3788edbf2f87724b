//! Storage traits for the user storage abstraction layer.
//!
//! This module defines the contract that all user storage backends must
//! implement.

use async_trait::async_trait;

use crate::StorageResult;
use crate::types::{NewUser, User};

/// The main storage trait that all user storage backends must implement.
///
/// Implementations must be thread-safe (`Send + Sync`). Backends are free to
/// assign IDs however they like, but IDs must be stable across reads.
///
/// # Example
///
/// ```ignore
/// use cachefall_storage::{UserStore, StorageError, User};
///
/// async fn require_user(store: &dyn UserStore, id: i64) -> Result<User, StorageError> {
///     store
///         .get(id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(id))
/// }
/// ```
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a new user and assigns it an ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidUser` if the payload is malformed.
    async fn create(&self, user: &NewUser) -> StorageResult<User>;

    /// Creates several users in one call, in input order.
    ///
    /// Not transactional: backends may persist a prefix of the batch before
    /// failing.
    async fn create_bulk(&self, users: &[NewUser]) -> StorageResult<Vec<User>>;

    /// Reads a user by ID.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing users.
    async fn get(&self, id: i64) -> StorageResult<Option<User>>;

    /// Finds the first user whose name matches, case-insensitively.
    async fn find_by_name(&self, name: &str) -> StorageResult<Option<User>>;

    /// Lists all users, ordered by ID.
    async fn list(&self) -> StorageResult<Vec<User>>;

    /// Replaces the mutable fields of an existing user.
    ///
    /// Returns the updated record, or `None` if the user does not exist.
    async fn update(&self, id: i64, update: &NewUser) -> StorageResult<Option<User>>;

    /// Deletes a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn delete(&self, id: i64) -> StorageResult<()>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
