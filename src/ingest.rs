//! Transcript ingestion.
//!
//! Turns voice-transcription JSON (`{"text": "..."}`) into entries and posts
//! them to the service. Metric extraction is a label search
//! (`"Mood: 4"`), not a grammar: a missing label or unparseable value
//! scores `0` and logs a warning.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::dto::{CreateEntryRequest, CreateEntryResponse};
use crate::models::entry::{MetricData, Metrics, DATE_FORMAT, KNOWN_METRICS};

pub const SUMMARY_MAX_CHARS: usize = 500;

/// Fraction is printed only when non-zero.
const TIME_FORMAT: &str = "%H:%M:%S%.f";

#[derive(Debug, Default, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Value after `"<label>:"` up to the end of that line, as an integer.
pub fn extract_metric(text: &str, label: &str) -> i32 {
    let needle = format!("{label}:");
    let raw = match text.find(&needle) {
        Some(pos) => {
            let rest = &text[pos + needle.len()..];
            rest.lines().next().unwrap_or("").trim()
        }
        None => "",
    };

    match raw.parse::<i32>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(label, value = raw, "Could not parse metric value; using 0");
            0
        }
    }
}

/// Bullet lines (`- ...`), trimmed, in order.
pub fn extract_additional_notes(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(String::from)
        .collect()
}

pub fn summarize(text: &str) -> String {
    text.chars().take(SUMMARY_MAX_CHARS).collect()
}

pub fn build_entry(text: &str, now: NaiveDateTime) -> CreateEntryRequest {
    let metrics: Metrics = KNOWN_METRICS
        .iter()
        .map(|(label, key)| (key.to_string(), MetricData::scored(extract_metric(text, label))))
        .collect();

    CreateEntryRequest {
        date: now.format(DATE_FORMAT).to_string(),
        time: now.format(TIME_FORMAT).to_string(),
        metrics,
        additional_notes: extract_additional_notes(text),
        summary: summarize(text),
    }
}

/// `*.json` files directly inside `dir`, sorted by name.
pub async fn transcript_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut listing = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("read {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(item) = listing.next_entry().await? {
        let path = item.path();
        if item.file_type().await?.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub struct IngestClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl IngestClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Fetch a bearer token with a form login. Subsequent submits carry it.
    pub async fn authenticate(
        &mut self,
        token_url: &str,
        username: &str,
        password: &str,
    ) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(token_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .context("token request failed")?
            .error_for_status()
            .context("token endpoint rejected credentials")?;

        let body: TokenResponse = resp.json().await.context("token response is not valid JSON")?;
        self.token = Some(body.access_token);
        Ok(())
    }

    pub async fn submit(&self, entry: &CreateEntryRequest) -> anyhow::Result<CreateEntryResponse> {
        let mut req = self
            .http
            .post(format!("{}/biofeedback", self.api_url))
            .json(entry);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.context("request to biofeedback API failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("biofeedback API returned {status}: {body}");
        }

        resp.json().await.context("unexpected response body")
    }
}

/// Form-login credentials for the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub processed: usize,
    pub failed: usize,
}

pub async fn process_file(
    client: &IngestClient,
    path: &Path,
    now: NaiveDateTime,
) -> anyhow::Result<CreateEntryResponse> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let transcript: Transcript =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let entry = build_entry(&transcript.text, now);
    client.submit(&entry).await
}

/// Submit every transcript in `dir`. One file failing does not stop the rest.
pub async fn process_directory(
    client: &IngestClient,
    dir: &Path,
) -> anyhow::Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    for path in transcript_files(dir).await? {
        let now = chrono::Local::now().naive_local();
        match process_file(client, &path, now).await {
            Ok(resp) => {
                tracing::info!(file = %path.display(), id = resp.id, "Entry submitted");
                summary.processed += 1;
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %format!("{e:#}"), "Failed to submit entry");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Authenticate (when asked to) and then submit the directory. A failed token
/// fetch aborts before any file is read.
pub async fn run(
    client: &mut IngestClient,
    token: Option<&TokenRequest>,
    dir: &Path,
) -> anyhow::Result<IngestSummary> {
    if let Some(token) = token {
        client
            .authenticate(&token.url, &token.username, &token.password)
            .await
            .context("Failed to obtain authentication token")?;
        tracing::info!("Obtained authentication token");
    }

    process_directory(client, dir).await
}
