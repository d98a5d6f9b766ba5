use crate::core::FieldFormat;

/// Half-up rounding toward positive infinity, so `-2.5` rounds to `-2`.
/// Matches the rounding used by the browser dashboard and its CSV export.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn rounded_integer(value: f64) -> i64 {
    round_half_up(value) as i64
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `R 1,234,567`, or `-R 1,234` when the unrounded value is negative.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = rounded_integer(value.abs());
    format!("{sign}R {}", group_thousands(magnitude))
}

/// Input is already in percent form: `85.0` renders as `85%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", rounded_integer(value))
}

pub fn format_users(value: f64) -> String {
    group_thousands(rounded_integer(value))
}

pub fn format_days(days: u32) -> String {
    format!("{days} days")
}

pub fn format_slider_value(value: f64, format: FieldFormat) -> String {
    match format {
        FieldFormat::Currency => format_currency(value),
        FieldFormat::Percent => format_percent(value),
        FieldFormat::Days => format!("{value} days/month"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands_and_prefixes_sign() {
        assert_eq!(format_currency(0.0), "R 0");
        assert_eq!(format_currency(999.4), "R 999");
        assert_eq!(format_currency(1_000.0), "R 1,000");
        assert_eq!(format_currency(1_234_567.5), "R 1,234,568");
        assert_eq!(format_currency(-60_769.230_769), "-R 60,769");
        assert_eq!(format_currency(-1_000_000.0), "-R 1,000,000");
    }

    #[test]
    fn currency_takes_sign_from_unrounded_value() {
        assert_eq!(format_currency(-0.4), "-R 0");
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(rounded_integer(2.5), 3);
        assert_eq!(rounded_integer(-2.5), -2);
        assert_eq!(rounded_integer(-60_769.230_769_230_75), -60_769);
        assert_eq!(rounded_integer(-0.3), 0);
    }

    #[test]
    fn percent_users_and_days() {
        assert_eq!(format_percent(85.0), "85%");
        assert_eq!(format_percent(0.1 * 100.0), "10%");
        assert_eq!(format_percent(33.5), "34%");
        assert_eq!(format_users(14_515.908), "14,516");
        assert_eq!(format_users(-1_234.0), "-1,234");
        assert_eq!(format_days(90), "90 days");
    }

    #[test]
    fn slider_values_follow_field_format() {
        assert_eq!(
            format_slider_value(100_000.0, FieldFormat::Currency),
            "R 100,000"
        );
        assert_eq!(format_slider_value(33.0, FieldFormat::Percent), "33%");
        assert_eq!(format_slider_value(10.0, FieldFormat::Days), "10 days/month");
    }
}
