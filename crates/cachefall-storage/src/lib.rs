//! # cachefall-storage
//!
//! Storage abstraction layer for the cachefall service.
//!
//! This crate defines the traits and types that all user storage backends
//! must implement. It does not contain any implementations - those are
//! provided by separate crates.
//!
//! ## Overview
//!
//! The main trait is [`UserStore`], which defines the contract for CRUD
//! operations over [`User`] records. The store is the source of truth; the
//! cache layer built on top of it is best-effort.
//!
//! ## Example
//!
//! ```ignore
//! use cachefall_storage::{NewUser, StorageError, UserStore};
//!
//! async fn onboard(store: &dyn UserStore) -> Result<(), StorageError> {
//!     let created = store
//!         .create(&NewUser {
//!             name: "Alice".into(),
//!             email: "alice@example.com".into(),
//!             designation: "Engineer".into(),
//!         })
//!         .await?;
//!     println!("created user {}", created.id);
//!     Ok(())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::UserStore;
pub use types::{NewUser, User};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a boxed storage trait object.
pub type DynUserStore = std::sync::Arc<dyn UserStore>;
