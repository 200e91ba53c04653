use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Number of trailing characters left visible when a value is printed.
const VISIBLE_TAIL: usize = 4;

/// Wrapper for phone numbers, card numbers and payout accounts.
///
/// `Debug` and `Display` only reveal the last four characters, so the value can
/// be passed to `tracing` macros without leaking it. Serialization still emits
/// the real value because API responses and the store need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn redacted(&self) -> String {
        let raw = self.0.as_ref();
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() <= VISIBLE_TAIL {
            return "*".repeat(chars.len());
        }
        let hidden = chars.len() - VISIBLE_TAIL;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_only_tail() {
        let phone = Masked("0240000123".to_string());
        assert_eq!(format!("{}", phone), "******0123");
        assert_eq!(format!("{:?}", phone), "******0123");
    }

    #[test]
    fn test_short_values_fully_hidden() {
        let cvv = Masked("123");
        assert_eq!(cvv.to_string(), "***");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let card = Masked("4111111111111111".to_string());
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, "\"4111111111111111\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "4111111111111111");
    }
}
