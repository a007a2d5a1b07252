//! Application state shared by every request handler.
//!
//! Built once at startup from `AppConfig`; wrapped in `Arc` and handed
//! to the router.

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::auth::{AuthService, TokenSigner};
use crate::config::AppConfig;
use crate::db::{Database, DatabaseError};
use crate::letters::{AnthropicClient, LetterError, LetterGenerator, TemplateGenerator};
use crate::mailer::{LogMailer, Mailer, ResendMailer};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Letters(#[from] LetterError),
}

pub struct CoreState {
    pub db: Database,
    pub auth: AuthService,
    pub letters: Arc<dyn LetterGenerator>,
    /// Rate-limit on `X-Forwarded-For` instead of the peer address.
    pub trust_forwarded_for: bool,
    pub started_at: Instant,
}

impl CoreState {
    pub fn new(db: Database, auth: AuthService, letters: Arc<dyn LetterGenerator>) -> Self {
        Self {
            db,
            auth,
            letters,
            trust_forwarded_for: false,
            started_at: Instant::now(),
        }
    }

    pub fn with_trusted_proxy(mut self, trust_forwarded_for: bool) -> Self {
        self.trust_forwarded_for = trust_forwarded_for;
        self
    }

    /// Open the database and wire up the mailer and letter generator
    /// according to which API keys are present.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let db = Database::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "Database ready");

        let secret = match &config.jwt_secret {
            Some(secret) => Zeroizing::new(secret.as_bytes().to_vec()),
            None => {
                tracing::warn!(
                    "CLAIMRX_JWT_SECRET not set; using a random secret, sessions end on restart"
                );
                Zeroizing::new(random_secret().into_bytes())
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
            Some(key) => Arc::new(ResendMailer::new(key.clone(), config.mail_from.clone())),
            None => {
                tracing::warn!("RESEND_API_KEY not set; reset emails are logged, not sent");
                Arc::new(LogMailer)
            }
        };

        let letters: Arc<dyn LetterGenerator> = match &config.anthropic_api_key {
            Some(key) => {
                tracing::info!(model = %config.anthropic_model, "Letter generation via Anthropic");
                Arc::new(AnthropicClient::new(key.clone(), config.anthropic_model.clone())?)
            }
            None => {
                tracing::info!("Letter generation via template");
                Arc::new(TemplateGenerator)
            }
        };

        let auth = AuthService::new(
            TokenSigner::new(&secret),
            config.password_iterations,
            config.frontend_url.clone(),
            mailer,
        );

        if config.trust_proxy {
            tracing::info!("Rate limiting on X-Forwarded-For from the trusted proxy");
        }
        Ok(Self::new(db, auth, letters).with_trusted_proxy(config.trust_proxy))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}
