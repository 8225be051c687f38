//! Movie and series catalog records kept as JSON collections in an embedded
//! key/value store: titles, reviews, favorites, watch-later lists and user
//! accounts.
//!
//! ```
//! use orangeflix::{Favorite, MemoryStorage, RecordStore, Session};
//!
//! let store = RecordStore::new(MemoryStorage::new());
//! let mut session = Session::anonymous();
//! let user = session.register(&store, "ann@example.com", "secret", "Ann")?.clone();
//! let dark = store.search("dark")?;
//! store.add_membership::<Favorite>(&dark[0].id, &user.id)?;
//! assert_eq!(store.favorites(&user.id)?, dark);
//! # Ok::<(), orangeflix::StoreError>(())
//! ```

mod auth;
mod catalog;
mod config;
mod database;
mod error;
mod model;
pub mod query;
mod seed;
pub mod storage;

pub use auth::{Session, MIN_PASSWORD_LEN};
pub use catalog::Membership;
pub use config::{Config, DEFAULT_ADMIN_EMAIL, DEFAULT_NAMESPACE};
pub use database::{
    Draft, Patch, Record, RecordStore, CURRENT_USER, FAVORITES, REVIEWS, TITLES, USERS,
    WATCH_LATER,
};
pub use error::{Result, StoreError};
pub use model::*;
pub use query::BrowseFilter;
pub use seed::seed_titles;
pub use storage::{MemoryStorage, SledStorage, Storage};
