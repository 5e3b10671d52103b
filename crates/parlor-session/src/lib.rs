//! Accounts and login sessions for Parlor.
//!
//! This crate answers two questions for the engine:
//!
//! 1. **Who exists?** [`AccountStore`] owns every [`Account`] and keeps
//!    the persisted [`AccountLog`] in step with memory.
//! 2. **Who is this connection?** [`SessionRegistry`] maps live
//!    connection ids to the account they logged in as.
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)  ← creates accounts, logs connections in and out
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides ConnectionId
//! ```

mod account;
mod error;
mod log;
mod registry;

pub use account::{Account, AccountStore};
pub use error::SessionError;
pub use log::{AccountLog, AccountRecord, FileAccountLog, MemoryAccountLog};
pub use registry::SessionRegistry;
