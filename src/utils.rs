/// Formats `value` rounded to whole units with thousands separators, e.g. `4937000.4` as `4,937,000`
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    // avoid printing "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a change in pounds with an explicit sign, e.g. `+£303,000` or `-£12,000`
pub fn signed_pounds(value: f64) -> String {
    let formatted = thousands(value.abs());
    if formatted == "0" {
        "£0".to_string()
    } else if value < 0.0 {
        format!("-£{}", formatted)
    } else {
        format!("+£{}", formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::{signed_pounds, thousands};

    #[test]
    fn groups_digits() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(-0.2), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1000.0), "1,000");
        assert_eq!(thousands(4_937_000.4), "4,937,000");
        assert_eq!(thousands(-12_000.0), "-12,000");
        assert_eq!(thousands(123_456.5), "123,457");
    }

    #[test]
    fn signs_changes() {
        assert_eq!(signed_pounds(303_000.0), "+£303,000");
        assert_eq!(signed_pounds(-12_000.0), "-£12,000");
        assert_eq!(signed_pounds(-0.3), "£0");
    }
}
