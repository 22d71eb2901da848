//! Resolution context
//!
//! A bag of protocol-agnostic hints (path, host, headers...) that a transport
//! adapter fills in and resolver strategies read.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Well-known context keys
pub mod keys {
    pub const PATH: &str = "Path";
    pub const HOST: &str = "Host";
    pub const HEADERS: &str = "Headers";
    pub const PARAMETERS: &str = "Parameters";
    pub const USER: &str = "User";
    pub const SUBDOMAIN: &str = "Subdomain";
    pub const IP_ADDRESS: &str = "IpAddress";
    pub const ROUTING_KEY: &str = "RoutingKey";
    pub const PROTOCOL_CONTEXT: &str = "ProtocolContext";
}

/// Header names are stored lowercased
pub type Headers = HashMap<String, String>;

/// Case-insensitive key/value hints for selecting a shell
#[derive(Default)]
pub struct ResolutionContext {
    data: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed lookup. Returns `None` when the key is missing or holds another type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.data.get(&key.to_lowercase()).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn set<T: Any + Send + Sync>(&mut self, key: &str, value: T) {
        self.data.insert(key.to_lowercase(), Box::new(value));
    }

    pub fn with<T: Any + Send + Sync>(mut self, key: &str, value: T) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(&key.to_lowercase()).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.with(keys::PATH, path.into())
    }

    pub fn path(&self) -> Option<&str> {
        self.get::<String>(keys::PATH).map(String::as_str)
    }

    pub fn with_host(self, host: impl Into<String>) -> Self {
        self.with(keys::HOST, host.into())
    }

    pub fn host(&self) -> Option<&str> {
        self.get::<String>(keys::HOST).map(String::as_str)
    }

    /// Add a header, creating the header map if needed
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        let name = name.as_ref().to_lowercase();
        let value = value.into();
        match self
            .data
            .get_mut(&keys::HEADERS.to_lowercase())
            .and_then(|v| v.downcast_mut::<Headers>())
        {
            Some(headers) => {
                headers.insert(name, value);
            }
            None => self.set(keys::HEADERS, Headers::from([(name, value)])),
        }
        self
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.get::<Headers>(keys::HEADERS)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .and_then(|h| h.get(&name.to_lowercase()))
            .map(String::as_str)
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.data.keys().collect();
        keys.sort();
        f.debug_struct("ResolutionContext").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let ctx = ResolutionContext::new().with("RoutingKey", "orders.eu".to_string());
        assert_eq!(ctx.get::<String>(keys::ROUTING_KEY).map(String::as_str), Some("orders.eu"));
        assert_eq!(ctx.get::<String>("routingkey").map(String::as_str), Some("orders.eu"));
        assert!(ctx.contains("ROUTINGKEY"));
    }

    #[test]
    fn test_wrong_type_is_none() {
        let ctx = ResolutionContext::new().with(keys::PARAMETERS, 42u32);
        assert_eq!(ctx.get::<u32>(keys::PARAMETERS), Some(&42));
        assert!(ctx.get::<String>(keys::PARAMETERS).is_none());
    }

    #[test]
    fn test_path_host_and_headers() {
        let ctx = ResolutionContext::new()
            .with_path("/acme/orders")
            .with_host("acme.example.com")
            .with_header("X-Tenant", "Acme")
            .with_header("Accept", "application/json");

        assert_eq!(ctx.path(), Some("/acme/orders"));
        assert_eq!(ctx.host(), Some("acme.example.com"));
        assert_eq!(ctx.header("x-tenant"), Some("Acme"));
        assert_eq!(ctx.headers().map(|h| h.len()), Some(2));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_remove() {
        let mut ctx = ResolutionContext::new().with_path("/");
        assert!(ctx.remove("path"));
        assert!(!ctx.remove("path"));
        assert!(ctx.is_empty());
    }
}
