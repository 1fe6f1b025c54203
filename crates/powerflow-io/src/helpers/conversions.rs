//! Checked conversions for integer columns of case files
//!
//! MATPOWER stores every column as a double. Bus numbers, status flags and type
//! codes must still be exact integers; these helpers reject NaN, infinities,
//! fractional values and out-of-range numbers instead of truncating with `as`.

use powerflow_core::{PowerflowError, PowerflowResult};

fn invalid(column: &str, row: usize, value: f64, reason: &str) -> PowerflowError {
    PowerflowError::Parse(format!(
        "invalid {column} at row {row}: {value} {reason}"
    ))
}

/// Convert a column value to `usize`.
///
/// ```
/// use powerflow_io::helpers::safe_f64_to_usize;
///
/// assert_eq!(safe_f64_to_usize(42.0, "bus_i", 1).unwrap(), 42);
/// assert!(safe_f64_to_usize(-1.0, "bus_i", 1).is_err());
/// assert!(safe_f64_to_usize(f64::NAN, "bus_i", 1).is_err());
/// ```
pub fn safe_f64_to_usize(value: f64, column: &str, row: usize) -> PowerflowResult<usize> {
    if !value.is_finite() {
        return Err(invalid(column, row, value, "is not finite"));
    }
    if value < 0.0 {
        return Err(invalid(column, row, value, "is negative"));
    }
    if value.fract() != 0.0 {
        return Err(invalid(column, row, value, "is not an integer"));
    }
    // any f64 above usize::MAX is still above `usize::MAX as f64`
    if value > usize::MAX as f64 {
        return Err(invalid(column, row, value, "exceeds the maximum index"));
    }
    Ok(value as usize)
}

/// Convert a column value to `i32`.
pub fn safe_f64_to_i32(value: f64, column: &str, row: usize) -> PowerflowResult<i32> {
    if !value.is_finite() {
        return Err(invalid(column, row, value, "is not finite"));
    }
    if value.fract() != 0.0 {
        return Err(invalid(column, row, value, "is not an integer"));
    }
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(invalid(column, row, value, "is out of range"));
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usize_rejects_bad_values() {
        assert_eq!(safe_f64_to_usize(0.0, "c", 1).unwrap(), 0);
        assert!(safe_f64_to_usize(f64::INFINITY, "c", 1).is_err());
        assert!(safe_f64_to_usize(2.5, "c", 1).is_err());
        assert!(safe_f64_to_usize(1e300, "c", 1).is_err());
    }

    #[test]
    fn i32_accepts_negative_integers() {
        assert_eq!(safe_f64_to_i32(-3.0, "c", 1).unwrap(), -3);
        assert!(safe_f64_to_i32(3e10, "c", 1).is_err());
        assert!(safe_f64_to_i32(f64::NAN, "c", 1).is_err());
    }

    #[test]
    fn message_names_column_and_row() {
        let err = safe_f64_to_usize(-1.0, "gen_bus", 4).unwrap_err().to_string();
        assert!(err.contains("invalid gen_bus at row 4"), "{err}");
    }
}
