//! Registry of request handlers.
//!
//! Built once at startup and read-only afterwards; shared across requests
//! behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatcher::Handler;
use crate::error::{Error, Result};

/// Name and description of a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    pub name: String,
    pub description: String,
}

/// Registry of handlers keyed by request type.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    pub fn register<H: Handler + 'static>(&mut self, handler: H) -> Result<()> {
        self.register_arc(Arc::new(handler))
    }

    /// Register a handler (Arc version).
    pub fn register_arc(&mut self, handler: Arc<dyn Handler>) -> Result<()> {
        let name = handler.name().to_string();
        if name.trim().is_empty() {
            return Err(Error::InvalidHandlerDefinition(
                "handler name must not be empty".to_string(),
            ));
        }
        if handler.description().trim().is_empty() {
            return Err(Error::InvalidHandlerDefinition(format!(
                "handler {} has an empty description",
                name
            )));
        }
        if self.handlers.contains_key(&name) {
            return Err(Error::DuplicateHandler(name));
        }

        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Get a handler by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a handler exists.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered handlers, sorted by name.
    pub fn descriptors(&self) -> Vec<HandlerDescriptor> {
        let mut descriptors: Vec<_> = self
            .handlers
            .values()
            .map(|h| HandlerDescriptor {
                name: h.name().to_string(),
                description: h.description().to_string(),
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
