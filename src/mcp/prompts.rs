//! Prompt template registry
//!
//! Pure text generation: descriptors plus template functions, no I/O. The
//! templates tell their consumer which records to fetch rather than fetching
//! anything here.

use std::collections::HashMap;

use crate::errors::AppError;
use crate::mcp::tools::RegistryError;
use crate::mcp::types::{ContentBlock, GetPromptResult, Prompt, PromptMessage, Role};

pub type PromptArgs = HashMap<String, String>;
pub type TemplateFn = fn(&PromptArgs) -> String;

pub struct PromptDef {
    pub prompt: Prompt,
    pub template: TemplateFn,
}

pub struct PromptRegistry {
    entries: Vec<PromptDef>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("len", &self.entries.len())
            .field("index", &self.index)
            .finish()
    }
}

impl PromptRegistry {
    pub fn build(defs: Vec<PromptDef>) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for def in defs {
            let name = def.prompt.name.clone();
            if index.insert(name.clone(), entries.len()).is_some() {
                return Err(RegistryError::DuplicatePrompt(name));
            }
            entries.push(def);
        }
        Ok(Self { entries, index })
    }

    pub fn list(&self) -> Vec<Prompt> {
        self.entries.iter().map(|def| def.prompt.clone()).collect()
    }

    /// Fill declared optional-argument defaults, then render the template.
    /// Unknown names and missing required arguments surface as errors the
    /// dispatcher maps onto the protocol channel.
    pub fn generate(&self, name: &str, mut supplied: PromptArgs) -> Result<GetPromptResult, AppError> {
        let Some(&slot) = self.index.get(name) else {
            return Err(AppError::not_found(
                "unknown_prompt",
                format!("unknown prompt: {name}"),
            ));
        };
        let def = &self.entries[slot];

        for arg in &def.prompt.arguments {
            if supplied.contains_key(&arg.name) {
                continue;
            }
            if let Some(default) = &arg.default {
                supplied.insert(arg.name.clone(), default.clone());
            } else if arg.required {
                return Err(AppError::bad_request(
                    "missing_argument",
                    format!("prompt {name} requires argument {}", arg.name),
                ));
            }
        }

        let text = (def.template)(&supplied);
        Ok(GetPromptResult {
            description: def.prompt.description.clone(),
            messages: vec![PromptMessage {
                role: Role::User,
                content: ContentBlock::text(text),
            }],
        })
    }
}
