//! The tool registry.

use std::collections::HashMap;

use minimcp_protocol::Tool;

use crate::handler::{BoxedToolHandler, ToolHandler};

/// The immutable table of invocable tools.
///
/// Built once at startup via the server builder and shared by reference
/// into each connection's dispatcher; never mutated afterward, so it needs
/// no locking. Registration order is preserved for discovery.
#[derive(Default)]
pub struct Registry {
    handlers: Vec<BoxedToolHandler>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a tool handler.
    ///
    /// Registering a name twice replaces the handler but keeps its
    /// original position.
    pub(crate) fn add<H: ToolHandler + 'static>(&mut self, handler: H) {
        let name = handler.definition().name;
        let boxed: BoxedToolHandler = Box::new(handler);
        match self.index.get(&name) {
            Some(&position) => self.handlers[position] = boxed,
            None => {
                self.index.insert(name, self.handlers.len());
                self.handlers.push(boxed);
            }
        }
    }

    /// Returns all tool definitions in registration order.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.handlers.iter().map(|h| h.definition()).collect()
    }

    /// Gets a tool handler by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedToolHandler> {
        self.index.get(name).map(|&position| &self.handlers[position])
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimcp_core::RpcResult;
    use minimcp_protocol::Content;
    use serde_json::{Map, Value, json};

    struct Stub(&'static str, &'static str);

    impl ToolHandler for Stub {
        fn definition(&self) -> Tool {
            Tool {
                name: self.0.to_owned(),
                description: self.1.to_owned(),
                input_schema: json!({"type": "object"}),
            }
        }

        fn call(&self, _arguments: &Map<String, Value>) -> RpcResult<Vec<Content>> {
            Ok(vec![Content::text(self.1)])
        }
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = Registry::new();
        registry.add(Stub("zeta", "last alphabetically, first registered"));
        registry.add(Stub("alpha", "registered second"));

        let names: Vec<String> = registry.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut registry = Registry::new();
        registry.add(Stub("read_file", "read"));
        assert!(registry.get("read_file").is_some());
        assert!(registry.get("write_file").is_none());
    }

    #[test]
    fn test_duplicate_registration_replaces_in_place() {
        let mut registry = Registry::new();
        registry.add(Stub("a", "one"));
        registry.add(Stub("b", "two"));
        registry.add(Stub("a", "replacement"));

        assert_eq!(registry.len(), 2);
        let tools = registry.tools();
        assert_eq!(tools[0].name, "a");
        assert_eq!(tools[0].description, "replacement");
    }
}
