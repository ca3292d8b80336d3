use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for guest and settlement data (phone, NIC, bank account) that masks its
/// value in Debug/Display output. Serialization passes the real value through, since
/// API responses and storage need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
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
    fn test_debug_and_display_hide_value() {
        let nic = Masked::new("199012345678".to_string());
        assert_eq!(format!("{:?}", nic), "********");
        assert_eq!(format!("{}", nic), "********");
        assert_eq!(nic.expose(), "199012345678");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let phone: Masked<String> = "0771234567".into();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"0771234567\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phone);
    }
}
