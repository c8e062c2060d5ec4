//! Adapter configuration.

use lawnstore_engine::Key;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Source of keys for records saved without one on engines that cannot
/// generate keys themselves.
pub trait KeyGenerator: Send + Sync {
    /// Returns a fresh key, unique within the store.
    fn generate(&self) -> Key;
}

/// Generates random v4 UUID text keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn generate(&self) -> Key {
        Key::Text(Uuid::new_v4().to_string())
    }
}

/// Configuration for opening an adapter.
#[derive(Clone)]
pub struct AdapterConfig {
    /// Name of the database to open.
    pub name: String,

    /// Generator for keys of keyless records when the engine has no
    /// auto-increment support.
    pub key_generator: Arc<dyn KeyGenerator>,
}

impl AdapterConfig {
    /// Creates a configuration for the named database with default values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_generator: Arc::new(UuidKeyGenerator),
        }
    }

    /// Sets the key generator.
    #[must_use]
    pub fn key_generator(mut self, generator: impl KeyGenerator + 'static) -> Self {
        self.key_generator = Arc::new(generator);
        self
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct Counter(AtomicI64);

    impl KeyGenerator for Counter {
        fn generate(&self) -> Key {
            Key::Int(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[test]
    fn default_config() {
        let config = AdapterConfig::new("notes");
        assert_eq!(config.name, "notes");
        assert!(matches!(config.key_generator.generate(), Key::Text(_)));
    }

    #[test]
    fn builder_pattern() {
        let config = AdapterConfig::new("notes").key_generator(Counter(AtomicI64::new(40)));
        assert_eq!(config.key_generator.generate(), Key::Int(40));
        assert_eq!(config.key_generator.generate(), Key::Int(41));
    }

    #[test]
    fn uuid_keys_are_unique() {
        let generator = UuidKeyGenerator;
        assert_ne!(generator.generate(), generator.generate());
    }
}
