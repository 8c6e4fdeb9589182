//! Tolerant parsing of free-text generation replies
//!
//! Replies come from a model, not a serializer, so every parse degrades in
//! tiers instead of failing. Each tier is a tagged outcome so callers and
//! tests can tell them apart.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// Midpoint score used when a reply carries no usable number at all.
pub const FALLBACK_SCORE: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Tier one: a brace-delimited record with score and reasoning.
    Structured { score: u8, reasoning: String },
    /// Tier two: no parseable record, but a bare integer token was found.
    IntegerOnly { score: u8 },
    /// Tier three: nothing numeric in the reply.
    Unparsed,
}

#[derive(Debug, Deserialize)]
struct StructuredReply {
    score: f64,
    reasoning: String,
}

fn integer_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("integer token pattern"))
}

fn letter_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]\b").expect("letter token pattern"))
}

/// Parse a risk-scoring reply through the fallback tiers. Never fails; the
/// worst reply still maps to `Unparsed`.
pub fn parse_risk_reply(raw: &str) -> ReplyOutcome {
    if let Some(outcome) = parse_structured(raw) {
        return outcome;
    }

    if let Some(token) = integer_token().find(raw) {
        let score = token.as_str().parse::<u64>().map_or(100, |value| value.min(100));
        return ReplyOutcome::IntegerOnly { score: score as u8 };
    }

    ReplyOutcome::Unparsed
}

fn parse_structured(raw: &str) -> Option<ReplyOutcome> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    let reply: StructuredReply = serde_json::from_str(&raw[start..=end]).ok()?;
    let score = reply.score.clamp(0.0, 100.0).round() as u8;
    Some(ReplyOutcome::Structured {
        score,
        reasoning: reply.reasoning,
    })
}

/// Find the option picked by a forced-choice reply: the first standalone
/// uppercase letter that maps in-range by position. `None` means the reply
/// named no valid option.
pub fn parse_choice_reply(raw: &str, option_count: usize) -> Option<usize> {
    for token in letter_token().find_iter(raw) {
        let index = (token.as_str().as_bytes()[0] - b'A') as usize;
        if index < option_count {
            return Some(index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reply_parses() {
        let outcome = parse_risk_reply(r#"Here you go: {"score": 72, "reasoning": "delayed at port"} hope that helps"#);
        assert_eq!(
            outcome,
            ReplyOutcome::Structured {
                score: 72,
                reasoning: "delayed at port".to_string()
            }
        );
    }

    #[test]
    fn structured_score_is_clamped() {
        let outcome = parse_risk_reply(r#"{"score": 250, "reasoning": "x"}"#);
        assert!(matches!(outcome, ReplyOutcome::Structured { score: 100, .. }));

        let outcome = parse_risk_reply(r#"{"score": -12, "reasoning": "x"}"#);
        assert!(matches!(outcome, ReplyOutcome::Structured { score: 0, .. }));
    }

    #[test]
    fn broken_record_falls_back_to_integer_token() {
        let outcome = parse_risk_reply("{not json} I'd put this at 65 out of 100");
        assert_eq!(outcome, ReplyOutcome::IntegerOnly { score: 65 });
    }

    #[test]
    fn first_integer_token_wins() {
        let outcome = parse_risk_reply("between 30 and 60");
        assert_eq!(outcome, ReplyOutcome::IntegerOnly { score: 30 });
    }

    #[test]
    fn oversized_integer_clamps_to_100() {
        let outcome = parse_risk_reply("risk is 99999999999999999999999");
        assert_eq!(outcome, ReplyOutcome::IntegerOnly { score: 100 });
    }

    #[test]
    fn digit_free_reply_is_unparsed() {
        assert_eq!(parse_risk_reply("no idea, sorry"), ReplyOutcome::Unparsed);
        assert_eq!(parse_risk_reply(""), ReplyOutcome::Unparsed);
    }

    #[test]
    fn choice_letter_maps_by_position() {
        assert_eq!(parse_choice_reply("I pick B because of coverage", 2), Some(1));
        assert_eq!(parse_choice_reply("A. the first one", 3), Some(0));
    }

    #[test]
    fn out_of_range_letters_are_skipped() {
        // "I" is a standalone uppercase letter but maps past the options.
        assert_eq!(parse_choice_reply("I would go with B", 2), Some(1));
        assert_eq!(parse_choice_reply("Z all the way", 2), None);
    }

    #[test]
    fn lowercase_and_embedded_letters_do_not_count() {
        assert_eq!(parse_choice_reply("b sounds good", 2), None);
        assert_eq!(parse_choice_reply("ABBA", 2), None);
    }
}
