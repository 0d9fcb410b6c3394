// Service exports
pub mod locks;
pub mod postgres;
pub mod profiles;
pub mod repository;
pub mod store;

pub use locks::ProfileLocks;
pub use postgres::PostgresProfileStore;
pub use profiles::ProfileService;
pub use repository::Repository;
pub use store::{Document, InMemoryProfileStore, ProfileStore, StoreError, NEW_DOCUMENT};
