//! Capability probe over an injected host environment.

/// How the host exposes its object-store engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The standard, unprefixed binding.
    Standard,
    /// A vendor-prefixed binding from a preliminary implementation.
    Vendor(Vendor),
}

/// Vendor prefixes of preliminary engine bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    /// `webkit` prefix.
    Webkit,
    /// `moz` prefix.
    Moz,
    /// `o` prefix.
    O,
    /// `ms` prefix.
    Ms,
}

/// The host environment the adapter runs in.
#[derive(Debug, Clone)]
pub struct Environment<F> {
    engine: Option<(F, Binding)>,
}

impl<F> Environment<F> {
    /// An environment exposing `factory` through the standard binding.
    pub fn standard(factory: F) -> Self {
        Self::new(factory, Binding::Standard)
    }

    /// An environment exposing `factory` through the given binding.
    pub fn new(factory: F, binding: Binding) -> Self {
        Self {
            engine: Some((factory, binding)),
        }
    }

    /// An environment without any object-store engine.
    pub fn unavailable() -> Self {
        Self { engine: None }
    }

    /// The binding through which the engine is exposed.
    pub fn binding(&self) -> Option<Binding> {
        self.engine.as_ref().map(|(_, binding)| *binding)
    }

    pub(crate) fn into_factory(self) -> Option<F> {
        self.engine.map(|(factory, _)| factory)
    }
}

/// What the environment's engine can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// An engine is present.
    pub available: bool,
    /// The engine generates keys for keyless writes.
    pub supports_auto_key: bool,
}

/// Detects the engine facilities of `env`.
///
/// Preliminary vendor-prefixed engines do not generate keys.
pub fn probe<F>(env: &Environment<F>) -> Capabilities {
    let binding = env.binding();
    Capabilities {
        available: binding.is_some(),
        supports_auto_key: binding == Some(Binding::Standard),
    }
}
