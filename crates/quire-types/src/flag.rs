//! Boolean-like request parameters.

/// Values accepted as "true". Anything else, including a missing parameter,
/// is false.
pub const TRUTHY_VALUES: &[&str] = &["1", "t", "T", "true", "TRUE", "True", "on", "yes"];

/// Interpret an optional parameter value as a flag.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| TRUTHY_VALUES.contains(&v.trim()))
}
