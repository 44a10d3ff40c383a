// util.rs

pub fn writeln_ignore_broken_pipe<W: std::io::Write, S: AsRef<str>>(mut w: W, s: S) -> std::io::Result<()> {
    match writeln!(w, "{}", s.as_ref()) {
        Err(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Formats a float the way calculator output and the history file expect:
/// shortest round-trip digits, integral values keep a trailing `.0` (`5.0`,
/// not `5`), and exponents carry a sign and at least two digits (`1e+16`,
/// `2.5e-05`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// Parses a whole number, clamping literals too large for `i64` to its
/// bounds so they read as out of range rather than as non-numeric.
pub fn parse_integer(input: &str) -> Option<i64> {
    if let Ok(n) = input.parse::<i64>() {
        return Some(n);
    }
    let (negative, digits) = match input.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_keep_decimal_point() {
        assert_eq!(format_number(8.0), "8.0");
        assert_eq!(format_number(-2.0), "-2.0");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn exponent_has_sign_and_two_digits() {
        assert_eq!(format_number(1e16), "1e+16");
        assert_eq!(format_number(1e-5), "1e-05");
        assert_eq!(format_number(-2.5e-7), "-2.5e-07");
        assert_eq!(format_number(1.5e300), "1.5e+300");
        assert_eq!(format_number(1e15), "1000000000000000.0");
        assert_eq!(format_number(0.0001), "0.0001");
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(format_number(f64::NAN), "nan");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn oversized_integers_clamp() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-3"), Some(-3));
        assert_eq!(parse_integer("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_integer("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(parse_integer("+99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_integer("12a"), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("greet"), "Greet");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("Exit"), "Exit");
    }

    #[test]
    fn broken_pipe_is_swallowed() {
        struct Broken;
        impl std::io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        assert!(writeln_ignore_broken_pipe(Broken, "hello").is_ok());
    }
}
