//! Appeal letter generation.
//!
//! Two generators share one trait: a fixed template used when no API key
//! is configured, and the Anthropic Messages API.

pub mod anthropic;
pub mod prompt;
pub mod template;

pub use anthropic::AnthropicClient;
pub use template::TemplateGenerator;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::{Claim, LetterSource};

#[derive(Debug, thiserror::Error)]
pub enum LetterError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Generation API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse generation response: {0}")]
    ResponseParsing(String),
    #[error("Generation returned no text")]
    EmptyResponse,
    #[error("Letter receiver went away")]
    Cancelled,
}

/// The claim details a letter is written from. Arrives from clients as
/// the `claim` object of the generate request, so dates stay as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterFields {
    pub id: String,
    pub patient: String,
    pub amount: f64,
    pub payer: String,
    pub denial_reason: String,
    pub denied_date: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub service_code: Option<String>,
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    #[serde(default)]
    pub service_date: Option<String>,
}

impl From<&Claim> for LetterFields {
    fn from(claim: &Claim) -> Self {
        Self {
            id: claim.id.clone(),
            patient: claim.patient.clone(),
            amount: claim.amount,
            payer: claim.payer.clone(),
            denial_reason: claim.denial_reason.clone(),
            denied_date: claim.denied_date.to_string(),
            deadline: Some(claim.deadline.to_string()),
            service_code: claim.service_code.clone(),
            diagnosis_code: claim.diagnosis_code.clone(),
            service_date: claim.service_date.map(|d| d.to_string()),
        }
    }
}

/// A finished letter and which generator wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLetter {
    pub letter: String,
    pub source: LetterSource,
}

/// Dollar amounts print without a fractional part when whole.
pub fn format_amount(amount: f64) -> String {
    amount.to_string()
}

pub trait LetterGenerator: Send + Sync {
    fn generate<'a>(&'a self, fields: &'a LetterFields) -> BoxFuture<'a, Result<String, LetterError>>;

    /// Send the letter in chunks as they are produced and return the full
    /// text. The default sends the whole letter as one chunk.
    fn generate_streaming<'a>(
        &'a self,
        fields: &'a LetterFields,
        token_tx: mpsc::Sender<String>,
    ) -> BoxFuture<'a, Result<String, LetterError>> {
        Box::pin(async move {
            let letter = self.generate(fields).await?;
            token_tx
                .send(letter.clone())
                .await
                .map_err(|_| LetterError::Cancelled)?;
            Ok(letter)
        })
    }

    fn source(&self) -> LetterSource;
}
