//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate paging and shuffle calls into use-case level APIs.
//! - Keep CLI/FFI layers decoupled from transport details.

pub mod feed_service;
