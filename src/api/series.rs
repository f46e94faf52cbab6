use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::str::FromStr;

use crate::{
    api::error::ApiError,
    domain::{GenerationKind, GridTimestamp, Metric, Region},
    service::AppState,
};

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Raw query string of the series endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub domain: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Validated, hour-aligned series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub region: Region,
    pub from: GridTimestamp,
    pub to: GridTimestamp,
}

impl SeriesQuery {
    /// Unknown or missing domains fall back to `default_region`; `from` defaults
    /// to the current hour and `to` to one day after `from`.
    pub fn into_request(self, default_region: Region, now: GridTimestamp) -> Result<SeriesRequest, ApiError> {
        let region = self
            .domain
            .as_deref()
            .and_then(|d| Region::from_str(d).ok())
            .unwrap_or(default_region);

        let from = match self.from.as_deref() {
            Some(raw) => parse_hour("from", raw)?,
            None => now,
        };
        let to = match self.to.as_deref() {
            Some(raw) => parse_hour("to", raw)?,
            None => GridTimestamp::floor_to_hour(from.as_datetime() + Duration::days(1)),
        };
        if to < from {
            return Err(ApiError::BadRequest(
                "'to' timestamp before 'from' timestamp".to_string(),
            ));
        }

        Ok(SeriesRequest { region, from, to })
    }
}

fn parse_hour(name: &str, raw: &str) -> Result<GridTimestamp, ApiError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid '{name}' timestamp {raw:?}: {e}")))?;
    Ok(GridTimestamp::floor_to_hour(parsed.with_timezone(&Utc)))
}

/// GET /api/load
pub async fn get_load(
    State(st): State<AppState>,
    Query(q): Query<SeriesQuery>,
) -> Result<Response, ApiError> {
    serve(&st, Metric::Load, q).await
}

/// GET /api/production/:kind
pub async fn get_production(
    State(st): State<AppState>,
    Path(kind): Path<String>,
    Query(q): Query<SeriesQuery>,
) -> Result<Response, ApiError> {
    let kind = GenerationKind::from_str(&kind)
        .map_err(|_| ApiError::NotFound(format!("production type '{kind}'")))?;
    serve(&st, Metric::Generation(kind), q).await
}

async fn serve(st: &AppState, metric: Metric, q: SeriesQuery) -> Result<Response, ApiError> {
    let req = q.into_request(st.cfg.api.default_region, st.engine.now())?;
    let series = st
        .engine
        .get_series(metric, req.region, req.from, req.to)
        .await?;
    Ok(([(header::CACHE_CONTROL, NO_CACHE)], Json(series)).into_response())
}
