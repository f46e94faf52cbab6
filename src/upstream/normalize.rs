//! Conversion of provider time series documents into a sparse grid-aligned series.
//!
//! A document describes one period: a start instant, a resolution and a list
//! of 1-based positions with quantities. Malformed documents or points are
//! logged and skipped; the rest of the response is still used.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{GridError, GridTimestamp, SparseSeries};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDocument {
    pub start: String,
    pub resolution: String,
    #[serde(default)]
    pub points: Vec<ProviderPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPoint {
    pub position: u32,
    /// Either a JSON number or a decimal string, depending on the provider.
    pub quantity: serde_json::Value,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("invalid period start {0:?}")]
    Start(String),

    #[error("unsupported resolution {0:?}")]
    Resolution(String),

    #[error("invalid point position {0}")]
    Position(u32),

    #[error("invalid quantity {0}")]
    Quantity(String),

    #[error(transparent)]
    Grid(#[from] GridError),
}

fn parse_start(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    // Provider short form, e.g. 2024-01-01T00:00Z
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|t| t.and_utc())
        .map_err(|_| ParseError::Start(raw.to_string()))
}

fn parse_resolution(raw: &str) -> Result<Duration, ParseError> {
    match raw {
        "PT15M" => Ok(Duration::minutes(15)),
        "PT30M" => Ok(Duration::minutes(30)),
        "PT60M" | "PT1H" => Ok(Duration::hours(1)),
        other => Err(ParseError::Resolution(other.to_string())),
    }
}

fn parse_quantity(raw: &serde_json::Value) -> Result<i64, ParseError> {
    let invalid = || ParseError::Quantity(raw.to_string());
    match raw {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
            .ok_or_else(invalid),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.round() as i64)
                })
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn point_time(start: DateTime<Utc>, step: Duration, position: u32) -> Result<GridTimestamp, ParseError> {
    let time = position
        .checked_sub(1)
        .and_then(|index| i32::try_from(index).ok())
        .and_then(|index| step.checked_mul(index))
        .and_then(|offset| start.checked_add_signed(offset))
        .ok_or(ParseError::Position(position))?;
    Ok(GridTimestamp::new(time)?)
}

/// Merge documents into one sparse series; later documents win on overlap.
pub fn normalize(documents: &[ProviderDocument]) -> SparseSeries {
    let mut out = SparseSeries::new();
    for doc in documents {
        let period = parse_start(&doc.start)
            .and_then(|start| Ok((start, parse_resolution(&doc.resolution)?)));
        let (start, step) = match period {
            Ok(period) => period,
            Err(e) => {
                warn!(error = %e, start = %doc.start, "skipping malformed provider period");
                continue;
            }
        };
        for point in &doc.points {
            let parsed = point_time(start, step, point.position)
                .and_then(|t| Ok((t, parse_quantity(&point.quantity)?)));
            match parsed {
                Ok((t, value)) => {
                    out.insert(t, value);
                }
                Err(e) => {
                    warn!(error = %e, position = point.position, start = %doc.start, "skipping malformed provider point");
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(start: &str, resolution: &str, quantities: &[serde_json::Value]) -> ProviderDocument {
        ProviderDocument {
            start: start.to_string(),
            resolution: resolution.to_string(),
            points: quantities
                .iter()
                .enumerate()
                .map(|(i, q)| ProviderPoint {
                    position: i as u32 + 1,
                    quantity: q.clone(),
                })
                .collect(),
        }
    }

    fn ts(s: &str) -> GridTimestamp {
        GridTimestamp::parse_rfc3339(s).unwrap()
    }

    #[test]
    fn test_quarter_hour_document() {
        let series = normalize(&[doc("2024-01-01T00:00Z", "PT15M", &[json!("100"), json!(101), json!("102")])]);
        assert_eq!(series.len(), 3);
        assert_eq!(series[&ts("2024-01-01T00:30:00Z")], 102);
    }

    #[test]
    fn test_hourly_document_leaves_gaps() {
        let series = normalize(&[doc("2024-01-01T00:00:00Z", "PT60M", &[json!(1), json!(2)])]);
        assert_eq!(series.keys().map(|t| t.to_rfc3339()).collect::<Vec<_>>(), vec![
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00Z"
        ]);
    }

    #[test]
    fn test_malformed_points_are_skipped() {
        let series = normalize(&[doc(
            "2024-01-01T00:00Z",
            "PT15M",
            &[json!("7"), json!("n/a"), json!(null), json!("9.6")],
        )]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[&ts("2024-01-01T00:00:00Z")], 7);
        assert_eq!(series[&ts("2024-01-01T00:45:00Z")], 10);
    }

    #[test]
    fn test_malformed_documents_are_skipped() {
        let series = normalize(&[
            doc("yesterday", "PT15M", &[json!(1)]),
            doc("2024-01-01T00:00Z", "P1D", &[json!(1)]),
            doc("2024-01-01T00:05Z", "PT15M", &[json!(1)]),
            doc("2024-01-01T00:00Z", "PT15M", &[json!(4)]),
        ]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[&ts("2024-01-01T00:00:00Z")], 4);
    }

    #[test]
    fn test_zero_position_rejected() {
        let start = parse_start("2024-01-01T00:00Z").unwrap();
        assert_eq!(
            point_time(start, Duration::minutes(15), 0),
            Err(ParseError::Position(0))
        );
    }

    #[test]
    fn test_later_documents_override() {
        let series = normalize(&[
            doc("2024-01-01T00:00Z", "PT15M", &[json!(1), json!(2)]),
            doc("2024-01-01T00:15Z", "PT15M", &[json!(20)]),
        ]);
        assert_eq!(series[&ts("2024-01-01T00:00:00Z")], 1);
        assert_eq!(series[&ts("2024-01-01T00:15:00Z")], 20);
    }
}
