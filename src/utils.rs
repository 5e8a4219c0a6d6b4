/// Format a number for the text exports.
///
/// Integral values are written without a fractional part (`311550`, not `311550.0`),
/// everything else in shortest round-trip form.
pub(crate) fn fmt_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        // `as` also folds -0.0 into 0
        (value as i64).to_string()
    } else {
        let mut buffer = ryu::Buffer::new();
        buffer.format(value).to_string()
    }
}

#[test]
fn number_formatting() {
    assert_eq!(fmt_number(311550.0), "311550");
    assert_eq!(fmt_number(-0.0), "0");
    assert_eq!(fmt_number(8.65), "8.65");
    assert_eq!(fmt_number(-21.35), "-21.35");
    assert_eq!(fmt_number(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(fmt_number(1e20), "1e20");
}
