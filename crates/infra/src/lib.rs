//! Infrastructure layer: account/ledger storage and the service that
//! orchestrates domain rules over it.

pub mod service;
pub mod store;

pub use service::{AccountsListing, Authenticated, LedgerService, Profile, ServiceError};
pub use store::{AccountStore, InMemoryStore, LedgerStore, PostgresStore, Store, StoreError};
