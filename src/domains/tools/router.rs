//! Tool Router - builds the rmcp ToolRouter.
//!
//! Each tool knows how to create its own route; this module wires them to a
//! shared Mem0 client built from the server configuration.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::core::config::Config;

use super::definitions::{AddMemoryTool, Mem0Client, SearchMemoriesTool};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(config: Arc<Config>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    let client = Arc::new(Mem0Client::new(&config.mem0));

    ToolRouter::new()
        .with_route(AddMemoryTool::create_route(client.clone()))
        .with_route(SearchMemoriesTool::create_route(client))
}

#[cfg(test)]
mod tests {
    use super::super::registry::ToolRegistry;
    use super::*;

    struct TestServer {}

    fn test_config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_config());
        let tools = router.list_all();
        assert_eq!(tools.len(), 2);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"add_memory"));
        assert!(names.contains(&"search_memories"));
        for tool in &tools {
            assert!(tool.description.as_ref().is_some_and(|d| !d.is_empty()));
        }
    }

    #[test]
    fn test_registry_matches_router() {
        let config = test_config();
        let registry = ToolRegistry::new(config.clone());
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(config);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
