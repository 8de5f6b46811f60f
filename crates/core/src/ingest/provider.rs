use crate::config::Settings;
use crate::domain::parse::parse_date;
use crate::domain::{DateRange, RawProposal};
use crate::ingest::error::IngestError;
use crate::ingest::types::ProposalsPayload;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/propostas";
const DEFAULT_RETRIES: u32 = 3;

#[async_trait::async_trait]
pub trait ProposalSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// All proposals sold within `range`.
    async fn fetch_proposals(&self, range: &DateRange) -> Result<Vec<RawProposal>>;
}

#[derive(Debug, Clone)]
pub struct HttpProposalSource {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    path: String,
    retries: u32,
}

impl HttpProposalSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_api_base_url()?.to_string();
        let token = settings.api_token.clone();

        let timeout_secs = std::env::var("APOLLO_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("APOLLO_API_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let path = std::env::var("APOLLO_PROPOSALS_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build proposals http client")?;

        Ok(Self {
            http,
            base_url,
            token,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .context("APOLLO_API_TOKEN is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    async fn fetch_once(&self, range: &DateRange) -> Result<Vec<RawProposal>> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("data_inicio", range.start.to_string()),
                ("data_fim", range.end.to_string()),
            ])
            .send()
            .await
            .map_err(|e| IngestError {
                source_name: self.source_name(),
                status: None,
                detail: format!("request failed: {e}"),
            })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read proposals response")?;

        if !status.is_success() {
            return Err(IngestError {
                source_name: self.source_name(),
                status: Some(status.as_u16()),
                detail: truncate(&text, 512),
            }
            .into());
        }

        parse_payload(&text)
    }
}

#[async_trait::async_trait]
impl ProposalSource for HttpProposalSource {
    fn source_name(&self) -> &'static str {
        "apollo_http"
    }

    async fn fetch_proposals(&self, range: &DateRange) -> Result<Vec<RawProposal>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(range).await {
                Ok(items) => {
                    tracing::info!(%range, items = items.len(), attempt, "fetched proposals");
                    return Ok(items);
                }
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "proposals fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Reads an exported proposals JSON file and keeps the records sold within the range.
#[derive(Debug, Clone)]
pub struct FileProposalSource {
    path: PathBuf,
}

impl FileProposalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ProposalSource for FileProposalSource {
    fn source_name(&self) -> &'static str {
        "json_file"
    }

    async fn fetch_proposals(&self, range: &DateRange) -> Result<Vec<RawProposal>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let items = parse_payload(&text)
            .with_context(|| format!("invalid proposals file {}", self.path.display()))?;
        Ok(filter_by_sale_date(items, range))
    }
}

pub fn parse_payload(text: &str) -> Result<Vec<RawProposal>> {
    let payload = serde_json::from_str::<ProposalsPayload>(text)
        .with_context(|| format!("proposals payload is not valid JSON: {}", truncate(text, 512)))?;
    Ok(payload.into_items())
}

fn filter_by_sale_date(items: Vec<RawProposal>, range: &DateRange) -> Vec<RawProposal> {
    items
        .into_iter()
        .filter(|raw| {
            raw.data_venda
                .as_deref()
                .and_then(parse_date)
                .is_some_and(|d| range.contains(d))
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_array_and_envelope() {
        let list = json!([{ "vendedor_nome": "Ana" }, { "vendedor_nome": "Bia" }]).to_string();
        assert_eq!(parse_payload(&list).unwrap().len(), 2);

        let envelope = json!({ "data": [{ "vendedor_nome": "Ana" }] }).to_string();
        let items = parse_payload(&envelope).unwrap();
        assert_eq!(items[0].vendedor_nome.as_deref(), Some("Ana"));
    }

    #[test]
    fn rejects_non_json_payload() {
        assert!(parse_payload("<html>").is_err());
        assert!(parse_payload(r#"{"rows": []}"#).is_err());
    }

    #[test]
    fn file_filter_keeps_range_by_sale_date() {
        let items: Vec<RawProposal> = serde_json::from_value(json!([
            { "data_venda": "2024-03-01" },
            { "data_venda": "2024-04-01" },
            { "data_venda": "garbage" },
            {}
        ]))
        .unwrap();
        let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
        assert_eq!(filter_by_sale_date(items, &range).len(), 1);
    }

    #[test]
    fn builds_url_without_double_slash() {
        let source = HttpProposalSource {
            http: reqwest::Client::new(),
            base_url: "https://api.example.com/".into(),
            token: None,
            path: "propostas".into(),
            retries: 1,
        };
        assert_eq!(source.url(), "https://api.example.com/propostas");
    }

    #[test]
    fn ingest_error_display_includes_status() {
        let err = IngestError {
            source_name: "apollo_http",
            status: Some(502),
            detail: "bad gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "proposal source error (source=apollo_http, status=502): bad gateway"
        );
    }

    #[tokio::test]
    async fn file_source_reads_and_filters() {
        let path = std::env::temp_dir().join(format!("apollo_proposals_{}.json", std::process::id()));
        let body = json!({ "data": [
            { "vendedor_nome": "Ana", "data_venda": "2024-03-10" },
            { "vendedor_nome": "Bia", "data_venda": "2023-03-10" }
        ]});
        tokio::fs::write(&path, body.to_string()).await.unwrap();

        let source = FileProposalSource::new(&path);
        let range = DateRange::parse("2024-01-01", "2024-12-31").unwrap();
        let items = source.fetch_proposals(&range).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].vendedor_nome.as_deref(), Some("Ana"));
    }
}
