//! Domain tools, prompts, and resources for the freight network
//!
//! Provides the business capabilities exposed over the protocol; everything
//! here talks to the entity store and sampling bridge through `ToolContext`.

pub mod contracts;
pub mod facilities;
pub mod prompts;
pub mod resources;
pub mod shipments;
pub mod utils;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::mcp::tools::ToolDef;
use crate::mcp::types::CallToolResult;

/// The disjoint per-module tool maps merged into the registry at startup.
pub fn tool_modules() -> Vec<Vec<ToolDef>> {
    vec![facilities::tools(), shipments::tools(), contracts::tools()]
}

/// Deserialize tool arguments, turning a serde failure into the domain-error
/// shape with the validator's message embedded verbatim.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, CallToolResult> {
    serde_json::from_value(args)
        .map_err(|err| CallToolResult::error(format!("invalid arguments: {err}")))
}
