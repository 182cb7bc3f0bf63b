use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for card numbers, CVV codes and contact data.
///
/// `Debug` and `Display` never print the inner value, so the wrapper can be
/// passed to `tracing` macros freely. Serialization still writes the real
/// value; strip it before returning anything to a client.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
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
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    /// Last `n` characters, for receipts like `**** **** **** 4242`.
    pub fn tail(&self, n: usize) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let start = chars.len().saturating_sub(n);
        chars[start..].iter().collect()
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let card = Masked::from("4111 1111 1111 1111");
        assert_eq!(format!("{:?}", card), "********");
        assert_eq!(format!("{}", card), "********");
        assert_eq!(card.expose(), "4111 1111 1111 1111");
    }

    #[test]
    fn test_tail() {
        let card = Masked::from("4111111111114242");
        assert_eq!(card.tail(4), "4242");
        assert_eq!(Masked::from("12").tail(4), "12");
    }
}
