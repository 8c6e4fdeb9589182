//! Domain-specific shared validations and formatting utilities

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::AppError;
use crate::store::is_entity_id;

pub const FACILITY_KINDS: [&str; 3] = ["warehouse", "port", "plant"];
pub const SHIPMENT_STATUSES: [&str; 5] =
    ["booked", "in_transit", "delayed", "delivered", "cancelled"];
pub const TERMINAL_SHIPMENT_STATUSES: [&str; 2] = ["delivered", "cancelled"];
pub const RECENT_SHIPMENTS_LIMIT: usize = 20;

pub fn normalize_entity_id(value: &str, code: &'static str) -> Result<String, AppError> {
    let normalized = value.trim().to_ascii_lowercase();
    if !is_entity_id(&normalized) {
        return Err(AppError::bad_request(
            code,
            format!("{value:?} is not a 24-character hex id"),
        ));
    }
    Ok(normalized)
}

pub fn normalize_facility_kind(kind: &str) -> Result<String, AppError> {
    let normalized = kind.trim().to_ascii_lowercase();
    if !FACILITY_KINDS.contains(&normalized.as_str()) {
        return Err(AppError::bad_request(
            "invalid_kind",
            "kind must be one of: warehouse, port, plant",
        ));
    }
    Ok(normalized)
}

pub fn normalize_shipment_status(status: &str) -> Result<String, AppError> {
    let normalized = status.trim().to_ascii_lowercase();
    if !SHIPMENT_STATUSES.contains(&normalized.as_str()) {
        return Err(AppError::bad_request(
            "invalid_status",
            "status must be one of: booked, in_transit, delayed, delivered, cancelled",
        ));
    }
    Ok(normalized)
}

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_SHIPMENT_STATUSES.contains(&status)
}

pub fn normalize_required_text(value: &str, code: &'static str) -> Result<String, AppError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(AppError::bad_request(code, "value must not be empty"));
    }
    Ok(normalized.to_string())
}

pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, AppError> {
    if !value.ends_with('Z') {
        return Err(AppError::bad_request(
            "invalid_utc_time",
            "timestamps must be RFC3339 UTC format ending with Z",
        ));
    }

    let parsed = DateTime::parse_from_rfc3339(value).map_err(|_| {
        AppError::bad_request(
            "invalid_utc_time",
            "timestamps must be RFC3339 UTC format ending with Z",
        )
    })?;

    Ok(parsed.with_timezone(&Utc))
}

pub fn format_utc(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_entity_id() {
        let id = normalize_entity_id(" 0123456789ABCDEF01234567 ", "invalid_id")
            .expect("valid id");
        assert_eq!(id, "0123456789abcdef01234567");
    }

    #[test]
    fn rejects_short_entity_id() {
        let err = normalize_entity_id("abc123", "invalid_id").expect_err("too short");
        assert!(matches!(err, AppError::BadRequest { code, .. } if code == "invalid_id"));
    }

    #[test]
    fn normalizes_facility_kind() {
        let kind = normalize_facility_kind(" Port ").expect("valid kind");
        assert_eq!(kind, "port");

        let err = normalize_facility_kind("garage").expect_err("invalid kind");
        assert!(matches!(err, AppError::BadRequest { code, .. } if code == "invalid_kind"));
    }

    #[test]
    fn normalizes_shipment_status() {
        let status = normalize_shipment_status("In_Transit").expect("valid status");
        assert_eq!(status, "in_transit");

        let err = normalize_shipment_status("lost").expect_err("invalid status");
        assert!(matches!(err, AppError::BadRequest { code, .. } if code == "invalid_status"));
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal_status("delivered"));
        assert!(is_terminal_status("cancelled"));
        assert!(!is_terminal_status("delayed"));
    }

    #[test]
    fn parse_utc_requires_z_suffix() {
        assert!(parse_utc("2026-09-01T12:00:00Z").is_ok());

        let err = parse_utc("2026-09-01T12:00:00+01:00").expect_err("offset time");
        assert!(matches!(err, AppError::BadRequest { code, .. } if code == "invalid_utc_time"));
    }
}
