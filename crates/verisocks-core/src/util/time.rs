//! Time-unit conversion, per `spec.md` §6 "Time units": closed set
//! `{s, ms, us, ns, ps, fs}` with base-10 exponents `{0, -3, -6, -9, -12, -15}`.

use crate::command::CommandError;

pub fn exponent_for_unit(unit: &str) -> Result<i16, CommandError> {
    match unit {
        "s" => Ok(0),
        "ms" => Ok(-3),
        "us" => Ok(-6),
        "ns" => Ok(-9),
        "ps" => Ok(-12),
        "fs" => Ok(-15),
        other => Err(CommandError::UnknownVariant {
            field: "time_unit",
            value: other.to_string(),
        }),
    }
}

/// Human-scaled rendering used by `get {sel:"sim_info"}`, per the
/// Open-Question 3 decision recorded in `SPEC_FULL.md` §4.7: one of the six
/// standard SI submultiples, or a bare `"1eN"` exponent string for a
/// precision outside that table — unusual but not an error `get
/// {sel:"sim_info"}` has any way to report.
pub fn unit_for_exponent(exp10: i16) -> String {
    match exp10 {
        0 => "s".to_string(),
        -3 => "ms".to_string(),
        -6 => "us".to_string(),
        -9 => "ns".to_string(),
        -12 => "ps".to_string(),
        -15 => "fs".to_string(),
        other => format!("1e{other}"),
    }
}

/// Converts `value` expressed in `unit` to an integer tick count at
/// `precision_exp10`, per `spec.md` §4.7 `run {cb:"for_time"}`:
/// `t · 10^(exp(u) - precision_exp10)`.
pub fn to_ticks(value: f64, unit: &str, precision_exp10: i16) -> Result<u64, CommandError> {
    let unit_exp = exponent_for_unit(unit)?;
    let scale = 10f64.powi((unit_exp - precision_exp10) as i32);
    let ticks = value * scale;
    if ticks < 0.0 {
        return Err(CommandError::Invalid("time must be non-negative".into()));
    }
    Ok(ticks.round() as u64)
}

/// Renders a tick count at `precision_exp10` as SI seconds, per `spec.md`
/// §4.7 `get {sel:"sim_time"}`: `now_ticks · 10^precision_exp10`.
pub fn ticks_to_seconds(ticks: u64, precision_exp10: i16) -> f64 {
    ticks as f64 * 10f64.powi(precision_exp10 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ns_time_at_ns_precision_is_identity() {
        assert_eq!(to_ticks(25.0, "ns", -9).unwrap(), 25);
    }

    #[test]
    fn us_time_at_ns_precision_scales_by_1000() {
        assert_eq!(to_ticks(1.0, "us", -9).unwrap(), 1000);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(to_ticks(1.0, "minutes", -9).is_err());
    }
}
