//! Shell identity
//!
//! A shell id is an opaque name compared and hashed case-insensitively, so
//! `Acme`, `acme` and `ACME` address the same shell.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the shell used when nothing more specific matches.
pub const DEFAULT_SHELL_NAME: &str = "Default";

/// Case-insensitive shell identifier
///
/// # Examples
///
/// ```
/// use shellkit_core::ShellId;
///
/// let a = ShellId::new("Acme");
/// let b = ShellId::new("ACME");
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "Acme");
/// ```
#[derive(Clone)]
pub struct ShellId {
    name: Arc<str>,
}

impl ShellId {
    /// Create a shell id, keeping the original casing for display.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// The `Default` shell id.
    pub fn default_shell() -> Self {
        Self::new(DEFAULT_SHELL_NAME)
    }

    /// The name as given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive comparison against a plain string.
    pub fn matches(&self, other: &str) -> bool {
        folded(&self.name).eq(folded(other))
    }
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

impl PartialEq for ShellId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.name, &other.name) || self.matches(&other.name)
    }
}

impl Eq for ShellId {}

impl Hash for ShellId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in folded(&self.name) {
            c.hash(state);
        }
    }
}

impl fmt::Display for ShellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for ShellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShellId").field(&&*self.name).finish()
    }
}

impl From<&str> for ShellId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ShellId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl Serialize for ShellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for ShellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(name))
    }
}
