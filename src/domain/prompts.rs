//! Prompt templates for freight-network workflows
//!
//! Templates are pure text: they name the resources and tools the consumer
//! should use to pull current records, rather than embedding any data here.

use crate::mcp::prompts::{PromptArgs, PromptDef};
use crate::mcp::types::{Prompt, PromptArgument};

pub fn prompts() -> Vec<PromptDef> {
    vec![facility_briefing(), shipment_risk_review(), contract_renewal_brief()]
}

fn arg<'a>(args: &'a PromptArgs, name: &str) -> &'a str {
    args.get(name).map(String::as_str).unwrap_or("")
}

fn facility_briefing() -> PromptDef {
    PromptDef {
        prompt: Prompt {
            name: "facility-briefing".to_string(),
            description: "Operations briefing for a single facility".to_string(),
            arguments: vec![
                PromptArgument {
                    name: "facility_id".to_string(),
                    description: "24-hex id of the facility to brief on".to_string(),
                    required: true,
                    default: None,
                },
                PromptArgument {
                    name: "focus".to_string(),
                    description: "Aspect to emphasise".to_string(),
                    required: false,
                    default: Some("operations".to_string()),
                },
            ],
        },
        template: facility_briefing_text,
    }
}

fn facility_briefing_text(args: &PromptArgs) -> String {
    let facility_id = arg(args, "facility_id");
    let focus = arg(args, "focus");
    format!(
        "You are preparing a briefing for facility {facility_id}.\n\
         \n\
         ## Gather the records\n\
         Read the `facility://{facility_id}` resource for the current record and its \
         aggregate metrics, and `resource://shipments/recent` for network context. \
         Do not rely on remembered state; fetch both before writing.\n\
         \n\
         ## Write the briefing\n\
         Emphasise {focus}. Cover inbound and outbound volume, value currently in \
         motion, and contract coverage. Close with the three most pressing actions \
         for the facility manager.\n"
    )
}

fn shipment_risk_review() -> PromptDef {
    PromptDef {
        prompt: Prompt {
            name: "shipment-risk-review".to_string(),
            description: "Structured risk review of a single shipment".to_string(),
            arguments: vec![
                PromptArgument {
                    name: "shipment_id".to_string(),
                    description: "24-hex id of the shipment to review".to_string(),
                    required: true,
                    default: None,
                },
                PromptArgument {
                    name: "horizon_days".to_string(),
                    description: "Planning horizon in days".to_string(),
                    required: false,
                    default: Some("7".to_string()),
                },
            ],
        },
        template: shipment_risk_review_text,
    }
}

fn shipment_risk_review_text(args: &PromptArgs) -> String {
    let shipment_id = arg(args, "shipment_id");
    let horizon_days = arg(args, "horizon_days");
    format!(
        "Review the risk posture of shipment {shipment_id} over the next \
         {horizon_days} days.\n\
         \n\
         ## Gather the records\n\
         Read `shipment://{shipment_id}` for the current record and its route, then \
         call the `assess_shipment_risk` tool for a scored baseline.\n\
         \n\
         ## Review\n\
         Compare your own reading against the scored baseline. Flag anything the \
         score misses: routing concentration, carrier record, declared value versus \
         weight. Finish with one go/no-go recommendation.\n"
    )
}

fn contract_renewal_brief() -> PromptDef {
    PromptDef {
        prompt: Prompt {
            name: "contract-renewal-brief".to_string(),
            description: "Renewal brief for a carrier contract".to_string(),
            arguments: vec![
                PromptArgument {
                    name: "contract_id".to_string(),
                    description: "24-hex id of the contract".to_string(),
                    required: true,
                    default: None,
                },
                PromptArgument {
                    name: "tone".to_string(),
                    description: "Drafting tone".to_string(),
                    required: false,
                    default: Some("neutral".to_string()),
                },
            ],
        },
        template: contract_renewal_brief_text,
    }
}

fn contract_renewal_brief_text(args: &PromptArgs) -> String {
    let contract_id = arg(args, "contract_id");
    let tone = arg(args, "tone");
    format!(
        "Draft a renewal brief for contract {contract_id} in a {tone} tone.\n\
         \n\
         ## Gather the records\n\
         Call the `review_contract` tool for the current assessment and read \
         `resource://network/overview` for the wider network position.\n\
         \n\
         ## Brief\n\
         State the renewal recommendation up front, then the supporting record: \
         value, expiry, the carrier's delivery record, and alternatives under \
         contract. Keep it under a page.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::prompts::PromptRegistry;
    use crate::mcp::types::ContentBlock;

    #[test]
    fn all_prompts_register() {
        let registry = PromptRegistry::build(prompts()).expect("registry builds");
        let names: Vec<String> = registry.list().into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "facility-briefing",
                "shipment-risk-review",
                "contract-renewal-brief"
            ]
        );
    }

    #[test]
    fn briefing_uses_default_focus() {
        let registry = PromptRegistry::build(prompts()).expect("registry builds");
        let mut args = PromptArgs::new();
        args.insert(
            "facility_id".to_string(),
            "0123456789abcdef01234567".to_string(),
        );

        let result = registry
            .generate("facility-briefing", args)
            .expect("generate");
        let ContentBlock::Text { text } = &result.messages[0].content;
        assert!(text.contains("facility://0123456789abcdef01234567"));
        assert!(text.contains("Emphasise operations."));
    }

    #[test]
    fn risk_review_mentions_supplied_horizon() {
        let registry = PromptRegistry::build(prompts()).expect("registry builds");
        let mut args = PromptArgs::new();
        args.insert(
            "shipment_id".to_string(),
            "89abcdef0123456789abcdef".to_string(),
        );
        args.insert("horizon_days".to_string(), "30".to_string());

        let result = registry
            .generate("shipment-risk-review", args)
            .expect("generate");
        let ContentBlock::Text { text } = &result.messages[0].content;
        assert!(text.contains("over the next 30 days"));
    }
}
