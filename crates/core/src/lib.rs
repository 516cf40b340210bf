//! Lot Costing Core - Shared types library.
//!
//! This crate provides common types used across all lot costing components:
//! - `engine` - Lot store, recipe registry and the FIFO costing engine
//! - `cli` - Command-line tools for migrations and day-to-day inventory work
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, validated names, and
//!   decimal quantity/money helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
