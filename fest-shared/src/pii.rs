use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps attendee contact data so `tracing` fields and `{:?}` output never
/// carry the full value. Serialization still writes the real value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    /// Keeps the first character and, for addresses, the domain:
    /// `ada@example.com` becomes `a***@example.com`.
    pub fn redacted(&self) -> String {
        let value = self.0.as_ref();
        let Some(first) = value.chars().next() else {
            return String::new();
        };
        match value.split_once('@') {
            Some((_, domain)) => format!("{}***@{}", first, domain),
            None => "********".to_string(),
        }
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
