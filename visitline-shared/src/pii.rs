use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

/// Wraps contact details so `Debug`/`Display` never print them.
///
/// Serialization passes the real value through: session storage and the
/// reservation service need it, log macros must not.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
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

impl<T> Deref for Masked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let phone = Masked("01234567899".to_string());
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(format!("{}", phone), "********");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let phone = Masked("01234567899".to_string());
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"01234567899\"");

        let back: Masked<String> = serde_json::from_str("\"01234567899\"").unwrap();
        assert_eq!(back.as_str(), "01234567899");
    }
}
