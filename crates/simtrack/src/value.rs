//! Parameter values and the per-code text coercion protocol.
//!
//! Simulation codes store run settings as flat `key=value` text. The value
//! grammar is untyped on disk; each code fixes its own string conventions
//! (boolean sentinels, string quoting, key case). [`ParamFormat`] captures
//! those conventions and [`ParamValue`] is the typed in-memory form.

use serde::{Deserialize, Serialize};

/// A typed simulation parameter.
///
/// Exactly four kinds are representable; no lists, nesting or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// String conventions of one simulation code's parameter format.
///
/// Fixed per code variant, never per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamFormat {
    /// Literal token representing boolean true
    pub true_string: &'static str,
    /// Literal token representing boolean false
    pub false_string: &'static str,
    /// Whether strings carry double quotes on write
    pub quotes_around_string: bool,
    /// Whether the format treats keys case-insensitively (stored lowercased)
    pub lowercase_keys: bool,
}

impl ParamFormat {
    /// Normalize a key per the format's case rule.
    pub fn normalize_key(&self, key: &str) -> String {
        if self.lowercase_keys {
            key.to_lowercase()
        } else {
            key.to_string()
        }
    }
}

impl ParamValue {
    /// Decode a raw value string into its typed form.
    ///
    /// Order matters: the boolean sentinels are tested before numeric
    /// parsing so that formats whose sentinels are `1`/`0` still decode
    /// them as booleans, then integer-valued floats collapse to `Int`,
    /// then quoted strings are unwrapped. Anything else stays a raw
    /// string.
    pub fn decode(text: &str, format: &ParamFormat) -> ParamValue {
        if text == format.true_string {
            return ParamValue::Bool(true);
        }
        if text == format.false_string {
            return ParamValue::Bool(false);
        }
        if let Ok(number) = text.parse::<f64>() {
            if is_exact_int(number) {
                return ParamValue::Int(number as i64);
            }
            return ParamValue::Float(number);
        }
        // Strip quotes only when both boundary characters are quotes.
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            return ParamValue::Str(text[1..text.len() - 1].to_string());
        }
        ParamValue::Str(text.to_string())
    }

    /// Encode the typed value back to the format's on-disk text.
    ///
    /// Inverse of [`ParamValue::decode`]: integer-valued floats render as
    /// bare integers, other floats with 15-digit scientific precision.
    pub fn encode(&self, format: &ParamFormat) -> String {
        match self {
            ParamValue::Bool(true) => format.true_string.to_string(),
            ParamValue::Bool(false) => format.false_string.to_string(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) if is_exact_int(*f) => (*f as i64).to_string(),
            ParamValue::Float(f) => format!("{f:.15e}"),
            ParamValue::Str(s) => {
                if format.quotes_around_string {
                    format!("\"{s}\"")
                } else {
                    s.clone()
                }
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Whether a float's integer truncation round-trips exactly within i64.
fn is_exact_int(f: f64) -> bool {
    f == f.trunc() && f >= i64::MIN as f64 && f <= i64::MAX as f64
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fortran_format() -> ParamFormat {
        ParamFormat {
            true_string: ".true.",
            false_string: ".false.",
            quotes_around_string: true,
            lowercase_keys: true,
        }
    }

    fn numeric_sentinel_format() -> ParamFormat {
        ParamFormat {
            true_string: "1",
            false_string: "0",
            quotes_around_string: false,
            lowercase_keys: false,
        }
    }

    #[test]
    fn decode_integers_and_floats() {
        let fmt = fortran_format();
        assert_eq!(ParamValue::decode("10", &fmt), ParamValue::Int(10));
        assert_eq!(ParamValue::decode("-3", &fmt), ParamValue::Int(-3));
        assert_eq!(ParamValue::decode("2.5", &fmt), ParamValue::Float(2.5));
        assert_eq!(ParamValue::decode("1e3", &fmt), ParamValue::Int(1000));
    }

    #[test]
    fn integer_valued_float_collapses_to_int() {
        let fmt = fortran_format();
        assert_eq!(ParamValue::decode("2.0", &fmt), ParamValue::Int(2));
        assert_eq!(ParamValue::Float(2.0).encode(&fmt), "2");
    }

    #[test]
    fn sentinels_win_over_numbers() {
        let fmt = numeric_sentinel_format();
        assert_eq!(ParamValue::decode("1", &fmt), ParamValue::Bool(true));
        assert_eq!(ParamValue::decode("0", &fmt), ParamValue::Bool(false));
        // Non-sentinel numerics still parse
        assert_eq!(ParamValue::decode("2", &fmt), ParamValue::Int(2));
    }

    #[test]
    fn sentinel_round_trip() {
        for fmt in [fortran_format(), numeric_sentinel_format()] {
            let t = ParamValue::decode(fmt.true_string, &fmt);
            let f = ParamValue::decode(fmt.false_string, &fmt);
            assert_eq!(t, ParamValue::Bool(true));
            assert_eq!(f, ParamValue::Bool(false));
            assert_eq!(t.encode(&fmt), fmt.true_string);
            assert_eq!(f.encode(&fmt), fmt.false_string);
        }
    }

    #[test]
    fn quoted_strings_are_unwrapped() {
        let fmt = fortran_format();
        assert_eq!(
            ParamValue::decode("\"run1\"", &fmt),
            ParamValue::Str("run1".to_string())
        );
        // Lone or unbalanced quotes are kept verbatim
        assert_eq!(
            ParamValue::decode("\"half", &fmt),
            ParamValue::Str("\"half".to_string())
        );
        assert_eq!(
            ParamValue::decode("\"", &fmt),
            ParamValue::Str("\"".to_string())
        );
    }

    #[test]
    fn string_encoding_follows_quote_convention() {
        let quoted = fortran_format();
        let bare = numeric_sentinel_format();
        let value = ParamValue::Str("run1".to_string());
        assert_eq!(value.encode(&quoted), "\"run1\"");
        assert_eq!(value.encode(&bare), "run1");
    }

    #[test]
    fn non_integer_float_uses_scientific_notation() {
        let fmt = fortran_format();
        let text = ParamValue::Float(0.125).encode(&fmt);
        assert!(text.contains('e'), "expected scientific notation: {text}");
        let back = ParamValue::decode(&text, &fmt);
        assert_eq!(back, ParamValue::Float(0.125));
    }

    #[test]
    fn huge_floats_stay_floats() {
        let fmt = fortran_format();
        assert!(matches!(
            ParamValue::decode("1e300", &fmt),
            ParamValue::Float(_)
        ));
    }
}
