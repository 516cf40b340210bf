//! Decimal quantity parsing and validation.
//!
//! Quantities and costs arrive as free-form strings from the command line or
//! as already-typed [`Decimal`]s from library callers. Either way they pass
//! through the checks here before anything touches the lot store.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on shortage amounts.
pub const SHORTFALL_DECIMAL_PLACES: u32 = 2;

/// Errors raised for quantity or cost input that cannot be accepted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input could not be read as a number.
    #[error("{field} must be numeric (got {value:?})")]
    NotNumeric {
        /// Name of the offending input.
        field: &'static str,
        /// The raw input.
        value: String,
    },
    /// The input must be strictly greater than zero.
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive {
        /// Name of the offending input.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },
    /// The input must not be negative.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// Name of the offending input.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },
    /// Arithmetic on the input left the representable decimal range.
    #[error("{field} is out of range")]
    OutOfRange {
        /// Name of the offending input.
        field: &'static str,
    },
}

/// Parse a decimal from user input.
///
/// Surrounding whitespace is ignored and scientific notation (`1e3`) is
/// accepted.
///
/// # Errors
///
/// Returns [`QuantityError::NotNumeric`] if the input is not a number.
///
/// # Examples
///
/// ```
/// use lot_costing_core::parse_decimal;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_decimal("quantity", " 2.5 ").unwrap(), Decimal::new(25, 1));
/// assert!(parse_decimal("quantity", "ten").is_err());
/// ```
pub fn parse_decimal(field: &'static str, input: &str) -> Result<Decimal, QuantityError> {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(|value| value.normalize())
        .map_err(|_| QuantityError::NotNumeric {
            field,
            value: input.to_owned(),
        })
}

/// Require a strictly positive value.
///
/// # Errors
///
/// Returns [`QuantityError::NotPositive`] for zero or negative values.
pub fn positive(field: &'static str, value: Decimal) -> Result<Decimal, QuantityError> {
    if value > Decimal::ZERO {
        Ok(value)
    } else {
        Err(QuantityError::NotPositive { field, value })
    }
}

/// Require a value that is zero or greater.
///
/// # Errors
///
/// Returns [`QuantityError::Negative`] for negative values.
pub fn non_negative(field: &'static str, value: Decimal) -> Result<Decimal, QuantityError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(QuantityError::Negative { field, value })
    } else {
        Ok(value)
    }
}

/// Multiply two amounts, failing instead of overflowing.
///
/// # Errors
///
/// Returns [`QuantityError::OutOfRange`] if the product is not representable.
pub fn checked_mul(
    field: &'static str,
    lhs: Decimal,
    rhs: Decimal,
) -> Result<Decimal, QuantityError> {
    lhs.checked_mul(rhs).ok_or(QuantityError::OutOfRange { field })
}

/// Sum amounts, failing instead of overflowing.
///
/// # Errors
///
/// Returns [`QuantityError::OutOfRange`] if any partial sum is not
/// representable.
pub fn checked_sum<I>(field: &'static str, values: I) -> Result<Decimal, QuantityError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |total, value| {
        total
            .checked_add(value)
            .ok_or(QuantityError::OutOfRange { field })
    })
}

/// Round a shortage amount for presentation to the caller.
#[must_use]
pub fn round_shortfall(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SHORTFALL_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}
