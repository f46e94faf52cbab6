use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use super::{normalize, ProviderDocument, UpstreamError, UpstreamSource};
use crate::domain::{GridTimestamp, Horizon, Metric, Region, SparseSeries};

const API_TOKEN_HEADER: &str = "X-Api-Token";

/// Client for the JSON metering gateway.
///
/// `GET {base_url}/{history|forecast}/{metric}?region=..&from=..&to=..` returns a
/// list of provider documents which are normalized onto the 15-minute grid.
#[derive(Clone)]
pub struct HttpUpstream {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(base_url: String, api_token: String, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("energy-forecast/0.2"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url,
            api_token,
            client,
        })
    }

    async fn fetch_documents(
        &self,
        horizon: Horizon,
        metric: Metric,
        region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
        process: Option<&str>,
    ) -> Result<Vec<ProviderDocument>, UpstreamError> {
        let url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            horizon,
            metric.upstream_path()
        );
        let mut query = vec![
            ("region", region.as_ref().to_string()),
            ("from", from.to_rfc3339()),
            ("to", to.to_rfc3339()),
        ];
        if let Some(process) = process {
            query.push(("process", process.to_string()));
        }

        debug!(%url, %region, %from, %to, ?process, "requesting upstream series");
        let resp = self
            .client
            .get(&url)
            .header(API_TOKEN_HEADER, &self.api_token)
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| UpstreamError::Permanent(format!("undecodable upstream body: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        UpstreamError::Transient(err.to_string())
    } else {
        UpstreamError::Permanent(err.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> UpstreamError {
    let message = format!("HTTP {status}: {}", body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        UpstreamError::Transient(message)
    } else {
        UpstreamError::Permanent(message)
    }
}

#[async_trait]
impl UpstreamSource for HttpUpstream {
    async fn fetch_history(
        &self,
        metric: Metric,
        region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<SparseSeries, UpstreamError> {
        let docs = self
            .fetch_documents(Horizon::History, metric, region, from, to, None)
            .await?;
        Ok(normalize(&docs))
    }

    async fn fetch_forecast(
        &self,
        metric: Metric,
        region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<SparseSeries, UpstreamError> {
        match metric {
            Metric::Load => {
                let docs = self
                    .fetch_documents(Horizon::Forecast, metric, region, from, to, None)
                    .await?;
                Ok(normalize(&docs))
            }
            Metric::Generation(_) => {
                // Day-ahead is authoritative for availability; intraday only refines it.
                let day_ahead = self
                    .fetch_documents(Horizon::Forecast, metric, region, from, to, Some("dayAhead"))
                    .await?;
                let mut series = normalize(&day_ahead);
                match self
                    .fetch_documents(Horizon::Forecast, metric, region, from, to, Some("intraday"))
                    .await
                {
                    Ok(intraday) => series.extend(normalize(&intraday)),
                    Err(e) => {
                        warn!(error = %e, %metric, %region, "intraday forecast unavailable, using day-ahead only")
                    }
                }
                Ok(series)
            }
        }
    }
}
