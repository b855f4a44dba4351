//! Account store
//!
//! Provides the data access layer behind the `AccountRepository` trait.

pub mod account;
pub mod memory;

pub use account::{AccountRecord, AccountRepository, NewAccount, PgAccountRepository};
pub use memory::MemoryAccountRepository;
