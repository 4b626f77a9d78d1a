//! Text-generation collaborator seam.
//!
//! The synthesizer prefers an external generator for voice and about copy
//! and treats every failure mode — transport, status, unparseable output —
//! as `Collaborator`, which the caller replaces with deterministic fallback
//! text. Generation is never allowed to fail a job.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Environment variable naming the collaborator endpoint.
pub const TEXTGEN_URL_ENV: &str = "BRANDPROBE_TEXTGEN_URL";

/// Structured voice description the collaborator is asked to return.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceProfile {
    pub voice_summary: String,
    pub tone: String,
    #[serde(default)]
    pub personality: Vec<String>,
    pub about_blurb: String,
    #[serde(default)]
    pub about_long: Option<String>,
}

/// Produces free-form text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// HTTP collaborator: POSTs `{"prompt": …}` and reads `{"text": …}`.
pub struct HttpTextGenerator {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

impl HttpTextGenerator {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Build from `BRANDPROBE_TEXTGEN_URL`, if set.
    pub fn from_env(client: Client) -> Option<Self> {
        let endpoint = std::env::var(TEXTGEN_URL_ENV).ok()?;
        if endpoint.is_empty() {
            return None;
        }
        Some(Self::new(client, endpoint))
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| EngineError::Collaborator(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Collaborator(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Collaborator(e.to_string()))?;
        Ok(body.text)
    }
}

/// Generator that is always unavailable. Used when no endpoint is configured;
/// the synthesizer falls back deterministically.
pub struct NullTextGenerator;

#[async_trait]
impl TextGenerator for NullTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(EngineError::Collaborator(
            "no text generation endpoint configured".to_string(),
        ))
    }
}

/// Parse the collaborator's voice output. Models often wrap JSON in markdown
/// code fences, so those are stripped before parsing.
pub fn parse_voice_profile(raw: &str) -> Result<VoiceProfile> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        debug!(error = %e, "voice profile output was not valid json");
        EngineError::Collaborator(format!("unparseable voice profile: {e}"))
    })
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line.
    let inner = match inner.split_once('\n') {
        Some((_, rest)) => rest,
        None => inner,
    };
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}

/// Prompt for the full voice profile.
pub fn voice_prompt(
    brand_name: Option<&str>,
    industry: Option<&str>,
    combined_text: &str,
) -> String {
    let mut prompt = String::from(
        "Analyze this website copy and describe the brand voice. Respond with \
         only a JSON object with keys: voice_summary (string), tone (string), \
         personality (array of 3-5 adjectives), about_blurb (string, 1-2 \
         sentences), about_long (string, one paragraph).\n",
    );
    if let Some(name) = brand_name {
        prompt.push_str(&format!("Brand name: {name}\n"));
    }
    if let Some(industry) = industry {
        prompt.push_str(&format!("Industry: {industry}\n"));
    }
    prompt.push_str("\nWebsite copy:\n");
    prompt.push_str(combined_text);
    prompt
}

/// Prompt for regenerating just the about blurb.
pub fn blurb_prompt(brand_name: Option<&str>, combined_text: &str) -> String {
    let name = brand_name.unwrap_or("this company");
    format!(
        "Write a specific 1-2 sentence description of {name} based on this \
         website copy. Respond with only the description text, no preamble.\n\n{combined_text}"
    )
}
