//! Typed HTTP client for the REST API.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AuthSession;
use crate::letters::{GeneratedLetter, LetterFields};
use crate::models::{Appeal, AppealStatus, Claim, ClaimStatus, Payer, UserProfile};
use crate::stats::Stats;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Cannot reach API at {0}")]
    Connection(String),
    /// 401 or 403: the session is gone and the caller should sign out.
    #[error("Session expired or missing: {0}")]
    Unauthorized(String),
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Failed to parse API response: {0}")]
    ResponseParsing(String),
    #[error("Not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NotSignedIn)
    }
}

/// Body of `POST /claims`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDraft {
    pub patient: String,
    pub amount: f64,
    pub payer: String,
    pub denial_reason: String,
    pub denied_date: NaiveDate,
    pub deadline: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_code: Option<String>,
}

/// Body of `POST /appeals`. Unset fields are copied from the claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealDraft {
    pub claim_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl AppealDraft {
    /// Draft carrying the claim's own patient, amount and payer.
    pub fn for_claim(claim: &Claim) -> Self {
        Self {
            claim_id: claim.id.clone(),
            patient: Some(claim.patient.clone()),
            amount: Some(claim.amount),
            payer: Some(claim.payer.clone()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Deserialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    // ── Auth ────────────────────────────────────────────────

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, ClientError> {
        let body = json!({ "email": email, "password": password, "name": name });
        self.send(self.request(Method::POST, "/auth/register").json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let body = json!({ "email": email, "password": password });
        self.send(self.request(Method::POST, "/auth/login").json(&body))
            .await
    }

    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.send(self.authed(Method::GET, "/auth/me")?).await
    }

    /// Returns the server's confirmation message, which is the same
    /// whether or not the account exists.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ClientError> {
        let body = json!({ "email": email });
        let resp: MessageResponse = self
            .send(self.request(Method::POST, "/auth/forgot-password").json(&body))
            .await?;
        Ok(resp.message)
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<String, ClientError> {
        let body = json!({ "token": token, "password": password });
        let resp: MessageResponse = self
            .send(self.request(Method::POST, "/auth/reset-password").json(&body))
            .await?;
        Ok(resp.message)
    }

    // ── Claims ──────────────────────────────────────────────

    pub async fn list_claims(&self) -> Result<Vec<Claim>, ClientError> {
        self.send(self.authed(Method::GET, "/claims")?).await
    }

    pub async fn get_claim(&self, id: &str) -> Result<Claim, ClientError> {
        self.send(self.authed(Method::GET, &format!("/claims/{id}"))?)
            .await
    }

    pub async fn create_claim(&self, draft: &ClaimDraft) -> Result<Claim, ClientError> {
        self.send(self.authed(Method::POST, "/claims")?.json(draft))
            .await
    }

    pub async fn update_claim_status(
        &self,
        id: &str,
        status: ClaimStatus,
    ) -> Result<Claim, ClientError> {
        let body = json!({ "status": status });
        self.send(self.authed(Method::PATCH, &format!("/claims/{id}"))?.json(&body))
            .await
    }

    // ── Appeals ─────────────────────────────────────────────

    pub async fn list_appeals(&self) -> Result<Vec<Appeal>, ClientError> {
        self.send(self.authed(Method::GET, "/appeals")?).await
    }

    pub async fn create_appeal(&self, draft: &AppealDraft) -> Result<Appeal, ClientError> {
        self.send(self.authed(Method::POST, "/appeals")?.json(draft))
            .await
    }

    pub async fn update_appeal(
        &self,
        id: &str,
        status: AppealStatus,
        recovered_amount: Option<f64>,
    ) -> Result<Appeal, ClientError> {
        let body = json!({ "status": status, "recoveredAmount": recovered_amount });
        self.send(self.authed(Method::PATCH, &format!("/appeals/{id}"))?.json(&body))
            .await
    }

    pub async fn generate_letter(&self, fields: &LetterFields) -> Result<GeneratedLetter, ClientError> {
        let body = json!({ "claim": fields });
        self.send(self.authed(Method::POST, "/appeals/generate")?.json(&body))
            .await
    }

    // ── Reference data ──────────────────────────────────────

    pub async fn list_payers(&self) -> Result<Vec<Payer>, ClientError> {
        self.send(self.authed(Method::GET, "/payers")?).await
    }

    pub async fn stats(&self) -> Result<Stats, ClientError> {
        self.send(self.authed(Method::GET, "/stats")?).await
    }

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.send(self.request(Method::GET, "/health")).await
    }

    // ── Plumbing ────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{path}", self.base_url))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                ClientError::Connection(self.base_url.clone())
            } else {
                ClientError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }
}

async fn error_from_response(status: StatusCode, response: Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (String::from("UNKNOWN"), body),
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        // Bad credentials on login are a 401 too, but the session is intact.
        if code != "INVALID_CREDENTIALS" {
            return ClientError::Unauthorized(message);
        }
    }

    ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ApiClient::new("http://localhost:3001/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001/api");
        assert!(client.token().is_none());
    }

    #[test]
    fn authed_request_without_token_fails_early() {
        let client = ApiClient::new("http://localhost:3001/api").unwrap();
        let err = client.authed(Method::GET, "/claims").err().unwrap();
        assert!(matches!(err, ClientError::NotSignedIn));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn claim_draft_serializes_camel_case_dates() {
        let draft = ClaimDraft {
            patient: "John Smith".into(),
            amount: 4500.0,
            payer: "Aetna".into(),
            denial_reason: "Coding error".into(),
            denied_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            deadline: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            patient_email: None,
            patient_phone: None,
            service_date: None,
            service_code: Some("99213".into()),
            diagnosis_code: None,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["denialReason"], "Coding error");
        assert_eq!(value["deniedDate"], "2025-01-15");
        assert_eq!(value["serviceCode"], "99213");
        assert!(value.get("patientEmail").is_none());
    }

    #[test]
    fn appeal_draft_copies_claim_fields() {
        let claim: Claim = serde_json::from_value(json!({
            "id": "CLM-001", "patient": "John Smith", "amount": 4500,
            "payer": "Blue Cross", "denialReason": "Coding error",
            "deniedDate": "2025-01-15", "deadline": "2025-03-15", "status": "pending"
        }))
        .unwrap();
        let value = serde_json::to_value(AppealDraft::for_claim(&claim)).unwrap();
        assert_eq!(value["claimId"], "CLM-001");
        assert_eq!(value["amount"], 4500.0);
    }
}
