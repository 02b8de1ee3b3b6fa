//! Attribute values and their literal formatting

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Largest exponent magnitude accepted in a decimal literal. Larger shifts
/// would expand into an unbounded run of zeros.
const MAX_EXPONENT: u64 = 1024;

/// A high-precision decimal kept as canonical decimal text.
///
/// Values are never converted to binary floating point, so a default such
/// as `1.2` survives any number of text -> value -> text round trips.
/// The canonical form has no exponent, no leading zeros in the integral
/// part, no trailing zeros in the fraction and at least one fractional
/// digit (`1.20` and `12e-1` both become `1.2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    repr: String,
}

impl Decimal {
    /// Canonical decimal text, e.g. `"1.2"`.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    /// Expression that rebuilds this value when the declaration is read back.
    pub fn constructor_expr(&self) -> String {
        format!("BigDecimal('{}')", self.repr)
    }

    fn canonicalize(literal: &str) -> Option<String> {
        let s = literal.trim();
        let (negative, s) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exponent) = match s.find(['e', 'E']) {
            Some(pos) => (&s[..pos], s[pos + 1..].parse::<i64>().ok()?),
            None => (s, 0),
        };
        if exponent.unsigned_abs() > MAX_EXPONENT {
            return None;
        }
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part
            .chars()
            .chain(frac_part.chars())
            .all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let digits: String = format!("{int_part}{frac_part}");
        let point = i64::try_from(int_part.len()).ok()?.checked_add(exponent)?;
        let (int_digits, frac_digits) = if point <= 0 {
            let zeros = "0".repeat(point.unsigned_abs() as usize);
            (String::new(), format!("{zeros}{digits}"))
        } else if point as usize >= digits.len() {
            let zeros = "0".repeat(point as usize - digits.len());
            (format!("{digits}{zeros}"), String::new())
        } else {
            let (i, f) = digits.split_at(point as usize);
            (i.to_string(), f.to_string())
        };

        let int_digits = int_digits.trim_start_matches('0');
        let frac_digits = frac_digits.trim_end_matches('0');
        let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
        let frac_digits = if frac_digits.is_empty() { "0" } else { frac_digits };

        let is_zero = int_digits == "0" && frac_digits == "0";
        let sign = if negative && !is_zero { "-" } else { "" };
        Some(format!("{sign}{int_digits}.{frac_digits}"))
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::canonicalize(s)
            .map(|repr| Self { repr })
            .ok_or_else(|| Error::InvalidDecimal {
                literal: s.to_string(),
            })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

/// An attribute value as it appears in a field declaration or a column.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Symbol(String),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// `false` is never a meaningful setting when declarations are compared.
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    pub fn decimal(literal: &str) -> Result<Self> {
        literal.parse().map(Value::Decimal)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Option<i64>> for Value {
    fn from(i: Option<i64>) -> Self {
        i.map_or(Value::Nil, Value::Integer)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

/// Quote a string the way the declaration syntax reads it back.
fn quote(s: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("\"")?;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            // Interpolation openers would change the meaning of the literal
            '#' if matches!(chars.peek(), Some('{' | '$' | '@')) => f.write_str("\\#")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Decimal(d) => f.write_str(&d.constructor_expr()),
            Value::String(s) => quote(s, f),
            Value::Symbol(s) => write!(f, ":{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2", "1.2")]
    #[case("1.20", "1.2")]
    #[case("001.200", "1.2")]
    #[case("5", "5.0")]
    #[case(".5", "0.5")]
    #[case("-0.0", "0.0")]
    #[case("-3.140", "-3.14")]
    #[case("12e-1", "1.2")]
    #[case("0.12e1", "1.2")]
    #[case("1.5E3", "1500.0")]
    #[case("123456789012345678901234567890.000000000000000001", "123456789012345678901234567890.000000000000000001")]
    fn test_decimal_canonical_form(#[case] input: &str, #[case] expected: &str) {
        let d: Decimal = input.parse().unwrap();
        assert_eq!(d.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1.2.3")]
    #[case(".")]
    #[case("1e")]
    #[case("1e9223372036854775807")]
    #[case("1e-9223372036854775808")]
    #[case("1e-100000000000")]
    #[case("5e1025")]
    fn test_decimal_rejects_garbage(#[case] input: &str) {
        assert!(input.parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_exponent_at_limit() {
        let d: Decimal = "1e-1024".parse().unwrap();
        assert_eq!(d.as_str(), format!("0.{}1", "0".repeat(1023)));
        let d: Decimal = "1e1024".parse().unwrap();
        assert_eq!(d.as_str(), format!("1{}.0", "0".repeat(1024)));
    }

    #[test]
    fn test_equal_decimals_compare_equal() {
        assert_eq!(Value::decimal("1.2").unwrap(), Value::decimal("1.200").unwrap());
        assert_ne!(Value::decimal("1.2").unwrap(), Value::decimal("1.21").unwrap());
    }

    #[rstest]
    #[case(Value::Nil, "nil")]
    #[case(Value::Bool(false), "false")]
    #[case(Value::Integer(-4), "-4")]
    #[case(Value::Float(2.0), "2.0")]
    #[case(Value::Float(0.25), "0.25")]
    #[case(Value::decimal("1.2").unwrap(), "BigDecimal('1.2')")]
    #[case(Value::String("it's \"quoted\"".into()), r#""it's \"quoted\"""#)]
    #[case(Value::String("a\\b\n".into()), r#""a\\b\n""#)]
    #[case(Value::String("#{x} #fff".into()), r##""\#{x} #fff""##)]
    #[case(Value::Symbol("now".into()), ":now")]
    fn test_literal_formatting(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }
}
