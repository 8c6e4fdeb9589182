//! Tool registry and invoker
//!
//! Name→descriptor entries merged from the domain modules at startup, in
//! registration order. The invocation wrapper is the universal backstop:
//! whatever a handler does, the dispatcher only ever sees a content list.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::errors::AppError;
use crate::mcp::types::{CallToolResult, Tool};
use crate::sampling::SamplingBridge;
use crate::store::FreightStore;

/// Shared collaborators handed to every tool handler.
#[derive(Clone)]
pub struct ToolContext {
    pub store: Arc<dyn FreightStore>,
    pub sampling: Arc<SamplingBridge>,
}

pub type ToolHandler = Arc<
    dyn Fn(ToolContext, Value) -> BoxFuture<'static, Result<CallToolResult, AppError>>
        + Send
        + Sync,
>;

pub struct ToolDef {
    pub tool: Tool,
    pub handler: ToolHandler,
}

/// Box an async handler function into the registry's handler type.
pub fn handler<F, Fut>(f: F) -> ToolHandler
where
    F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CallToolResult, AppError>> + Send + 'static,
{
    Arc::new(move |ctx, args| f(ctx, args).boxed())
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
    #[error("duplicate prompt name: {0}")]
    DuplicatePrompt(String),
}

pub struct ToolRegistry {
    entries: Vec<ToolDef>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("len", &self.entries.len())
            .field("index", &self.index)
            .finish()
    }
}

impl ToolRegistry {
    /// Merge tool definitions from the domain modules. A name collision is a
    /// startup configuration error, never last-write-wins.
    pub fn build(modules: Vec<Vec<ToolDef>>) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for def in modules.into_iter().flatten() {
            let name = def.tool.name.clone();
            if index.insert(name.clone(), entries.len()).is_some() {
                return Err(RegistryError::DuplicateTool(name));
            }
            entries.push(def);
        }
        Ok(Self { entries, index })
    }

    pub fn list(&self) -> Vec<Tool> {
        self.entries.iter().map(|def| def.tool.clone()).collect()
    }

    /// Invoke a tool by name. Unknown names and every handler failure come
    /// back as `isError` content, never as a protocol error.
    pub async fn call(
        &self,
        ctx: ToolContext,
        name: &str,
        arguments: Option<Value>,
    ) -> CallToolResult {
        let Some(&slot) = self.index.get(name) else {
            return CallToolResult::error(format!("Unknown tool: {name}"));
        };

        let args = arguments.unwrap_or_else(|| json!({}));
        let invocation = AssertUnwindSafe((self.entries[slot].handler)(ctx, args));
        match invocation.catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(tool = name, error = %err, "tool handler failed");
                CallToolResult::error(format!("{name}: {err}"))
            }
            Err(_) => {
                warn!(tool = name, "tool handler panicked");
                CallToolResult::error(format!("{name}: handler panicked"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::types::ContentBlock;
    use crate::store::InMemoryStore;

    fn test_ctx() -> ToolContext {
        ToolContext {
            store: Arc::new(InMemoryStore::new()),
            sampling: Arc::new(SamplingBridge::new()),
        }
    }

    fn stub_def(name: &str) -> ToolDef {
        let reply = format!("{name} ran");
        ToolDef {
            tool: Tool {
                name: name.to_string(),
                description: format!("stub {name}"),
                input_schema: json!({"type": "object", "properties": {}}),
            },
            handler: handler(move |_ctx, _args| {
                let reply = reply.clone();
                async move { Ok(CallToolResult::text(reply)) }
            }),
        }
    }

    fn result_text(result: &CallToolResult) -> &str {
        let ContentBlock::Text { text } = &result.content[0];
        text
    }

    #[test]
    fn duplicate_names_fail_at_build() {
        let err = ToolRegistry::build(vec![vec![stub_def("a")], vec![stub_def("a")]])
            .expect_err("duplicate must be rejected");
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "a"));
    }

    #[test]
    fn list_preserves_registration_order() {
        let registry = ToolRegistry::build(vec![
            vec![stub_def("a"), stub_def("b")],
            vec![stub_def("c")],
        ])
        .expect("registry builds");

        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_domain_error() {
        let registry = ToolRegistry::build(vec![vec![stub_def("a")]]).expect("registry builds");
        let result = registry.call(test_ctx(), "missing", None).await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "Unknown tool: missing");
    }

    #[tokio::test]
    async fn handler_error_is_converted_with_tool_prefix() {
        let failing = ToolDef {
            tool: Tool {
                name: "broken".to_string(),
                description: "always fails".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            },
            handler: handler(|_ctx, _args| async {
                Err(AppError::not_found("shipment_not_found", "shipment gone"))
            }),
        };
        let registry = ToolRegistry::build(vec![vec![failing]]).expect("registry builds");

        let result = registry.call(test_ctx(), "broken", None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("broken: "));
        assert!(result_text(&result).contains("shipment gone"));
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let panicking = ToolDef {
            tool: Tool {
                name: "volatile".to_string(),
                description: "panics".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            },
            handler: handler(|_ctx, args| async move {
                assert!(args.is_null(), "boom");
                Ok(CallToolResult::text("unreachable"))
            }),
        };
        let registry = ToolRegistry::build(vec![vec![panicking]]).expect("registry builds");

        let result = registry.call(test_ctx(), "volatile", None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("volatile: "));
    }
}
