//! Domain model shared by the shuffle engine and the paging client.
//!
//! # Responsibility
//! - Define the generic record shape every paged collection maps into.
//! - Define page request/response envelopes.
//!
//! # Invariants
//! - Every record is identified by a stable `ItemIdentity`.
//! - Page requests always carry a non-zero limit.

pub mod list_item;
pub mod page;
