use crate::color::ColorAssigner;
use crate::registry::ClientRegistry;

/// State shared by the listener and every connection handler
pub struct ServerState {
    pub registry: ClientRegistry,
    pub colors: ColorAssigner,
}

impl ServerState {
    pub fn new() -> Self {
        Self::with_colors(ColorAssigner::new())
    }

    /// Uses the given assigner, e.g. a seeded one in tests
    pub fn with_colors(colors: ColorAssigner) -> Self {
        Self {
            registry: ClientRegistry::new(),
            colors,
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
