pub mod content_resolver;
pub mod known_types;
pub mod path_resolver;
pub mod schema_resolver;
pub mod type_converter;

pub use known_types::{KnownTypes, ResolvedRef};
pub use path_resolver::resolve_endpoints;
pub use schema_resolver::{ModelOptions, ModelResolution, resolve_models};
pub use type_converter::{Naming, to_identifier};

use crate::error::DefinitionError;

/// Items that resolved cleanly, plus the definitions that were skipped and
/// why. A failed definition never stops its siblings.
#[derive(Debug, Clone)]
pub struct Resolution<T> {
    pub items: Vec<T>,
    pub failures: Vec<DefinitionError>,
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Resolution<T> {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
