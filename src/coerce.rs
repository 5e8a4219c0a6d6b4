//! Parse-or-default numeric coercion
//!
//! GMS grid exports are produced by a trusted upstream tool, and this crate reads them
//! leniently: a field that is missing, empty, or not a number becomes `0`. All of that
//! leniency lives here so it can be audited (and tested) in one place. The borehole
//! exporter is the only strict consumer and uses [`parse_finite`] directly.

use num_traits::{NumCast, Zero};

/// Parse a trimmed decimal field. Returns `None` for anything that is not a finite number.
pub fn parse_finite(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Floating point coercion: anything that does not parse as a finite number is `0.0`
pub fn coerce_f64(field: &str) -> f64 {
    parse_finite(field).unwrap_or(0.0)
}

/// Truncating integer coercion.
///
/// The field is read as a float and truncated toward zero, so `"3.7"` becomes `3` and
/// `"-2.5"` becomes `-2`. Values that do not parse, or that do not fit in `T`, become zero.
pub fn coerce_int<T>(field: &str) -> T
where
    T: NumCast + Zero,
{
    parse_finite(field)
        .and_then(|value| T::from(value.trunc()))
        .unwrap_or_else(T::zero)
}

/// Coerce column `col` of a row as a float, `0.0` if the column does not exist
pub fn field_f64(row: &[&str], col: usize) -> f64 {
    row.get(col).map(|field| coerce_f64(field)).unwrap_or(0.0)
}

/// Coerce column `col` of a row as an integer, zero if the column does not exist
pub fn field_int<T>(row: &[&str], col: usize) -> T
where
    T: NumCast + Zero,
{
    row.get(col)
        .map(|field| coerce_int(field))
        .unwrap_or_else(T::zero)
}
