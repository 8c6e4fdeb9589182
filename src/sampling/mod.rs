//! Sampling bridge: server-initiated generation requests
//!
//! Turns the call direction around: server-side logic asks the client
//! driving the session for free text, over whatever transport adapter has
//! registered itself in the bridge's slot. There is no push channel of our
//! own, so every call is a correlation-id-tagged request raced against a
//! wall-clock bound.

pub mod parse;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::mcp::types::{
    CreateMessageRequest, CreateMessageResult, ModelPreferences, SamplingMessage,
};
use self::parse::{parse_choice_reply, parse_risk_reply, ReplyOutcome, FALLBACK_SCORE};

pub const SAMPLING_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_MAX_TOKENS: u32 = 1024;
const MAX_CHOICE_OPTIONS: usize = 26;

/// Failures distinct from the parse-fallback tiers, which are degraded
/// successes. Callers must be ready for either of these and fall back to a
/// deterministic computation of their own.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("sampling unavailable: no transport registered")]
    Unavailable,
    #[error("sampling request timed out")]
    Timeout,
    #[error("sampling transport failed: {0}")]
    Transport(String),
}

/// The inverted half of the protocol: something able to deliver a generation
/// request to the connected client and produce its reply. Out-of-band
/// transports must join request and reply on the request's correlation id.
#[async_trait]
pub trait SamplingTransport: Send + Sync {
    async fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<CreateMessageResult, SamplingError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub score: u8,
    pub reasoning: String,
}

/// Holds the one process-wide transport slot. Constructed empty at startup
/// and threaded by `Arc` into everything that samples; an adapter registers
/// itself later, or never.
pub struct SamplingBridge {
    transport: RwLock<Option<Arc<dyn SamplingTransport>>>,
}

impl SamplingBridge {
    pub fn new() -> Self {
        Self {
            transport: RwLock::new(None),
        }
    }

    /// Register the active transport for this process. A later registration
    /// replaces the slot.
    pub fn set_transport(&self, transport: Arc<dyn SamplingTransport>) {
        *self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(transport);
    }

    fn transport(&self) -> Result<Arc<dyn SamplingTransport>, SamplingError> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SamplingError::Unavailable)
    }

    async fn request_text(
        &self,
        system_prompt: &str,
        prompt: String,
        temperature: f64,
    ) -> Result<String, SamplingError> {
        let transport = self.transport()?;
        let request = CreateMessageRequest {
            correlation_id: Uuid::new_v4().to_string(),
            messages: vec![SamplingMessage::user(prompt)],
            system_prompt: Some(system_prompt.to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Some(temperature),
            model_preferences: Some(ModelPreferences {
                hints: None,
                intelligence_priority: Some(0.7),
                speed_priority: Some(0.3),
            }),
        };
        let correlation_id = request.correlation_id.clone();

        // The loser of this race is dropped; a reply arriving after the
        // deadline has nowhere left to land.
        match timeout(SAMPLING_TIMEOUT, transport.create_message(request)).await {
            Ok(Ok(result)) => {
                debug!(correlation_id = %correlation_id, "sampling reply received");
                Ok(result.text().to_string())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!(correlation_id = %correlation_id, "sampling request timed out");
                Err(SamplingError::Timeout)
            }
        }
    }

    /// Free-form analysis. The reply text is returned verbatim, unparsed.
    pub async fn analyze(&self, prompt: &str, context: &Value) -> Result<String, SamplingError> {
        let full = format!(
            "{prompt}\n\nContext:\n{}",
            serde_json::to_string_pretty(context).expect("context serialization")
        );
        self.request_text(
            "You are a freight operations analyst. Be concrete and concise.",
            full,
            0.7,
        )
        .await
    }

    /// Risk scoring. Degrades through the parse tiers; the score is always
    /// in [0, 100]. Raises only on transport-level failure.
    pub async fn score_risk(
        &self,
        subject: &str,
        context: &Value,
    ) -> Result<RiskAssessment, SamplingError> {
        let prompt = format!(
            "Assess the operational risk of {subject} on a scale of 0-100.\n\
             Respond with a JSON object: {{\"score\": <integer 0-100>, \
             \"reasoning\": \"<short explanation>\"}}\n\nContext:\n{}",
            serde_json::to_string_pretty(context).expect("context serialization")
        );
        let raw = self
            .request_text(
                "You are a freight risk assessor. Answer in the requested format.",
                prompt,
                0.2,
            )
            .await?;

        Ok(match parse_risk_reply(&raw) {
            ReplyOutcome::Structured { score, reasoning } => RiskAssessment { score, reasoning },
            ReplyOutcome::IntegerOnly { score } => RiskAssessment {
                score,
                reasoning: raw,
            },
            ReplyOutcome::Unparsed => RiskAssessment {
                score: FALLBACK_SCORE,
                reasoning: raw,
            },
        })
    }

    /// Forced-choice elicitation. Always returns one of `options`; an
    /// unusable reply degrades to the first option.
    pub async fn choose(
        &self,
        question: &str,
        options: &[String],
    ) -> Result<String, SamplingError> {
        let Some(first) = options.first() else {
            return Err(SamplingError::Transport(
                "forced choice requires at least one option".to_string(),
            ));
        };
        let count = options.len().min(MAX_CHOICE_OPTIONS);

        let listing = options
            .iter()
            .take(count)
            .enumerate()
            .map(|(index, option)| format!("{}. {option}", (b'A' + index as u8) as char))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "{question}\n\nOptions:\n{listing}\n\n\
             Answer with the letter of your choice, then a short justification."
        );

        let raw = self
            .request_text(
                "You are a freight operations analyst making a single selection.",
                prompt,
                0.2,
            )
            .await?;

        let choice = match parse_choice_reply(&raw, count) {
            Some(index) => &options[index],
            None => first,
        };
        Ok(choice.clone())
    }
}

impl Default for SamplingBridge {
    fn default() -> Self {
        Self::new()
    }
}
