//! Core types for lot costing.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod name;
pub mod quantity;

pub use id::*;
pub use money::{CostBasis, round_money, round_unit_cost, unit_cost_from};
pub use name::{Name, NameError};
pub use quantity::{
    QuantityError, checked_mul, checked_sum, non_negative, parse_decimal, positive,
    round_shortfall,
};
