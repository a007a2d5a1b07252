//! Account operations: register, login, token checks, password reset.
//!
//! Every method that touches the database takes the lock in a short
//! block and drops it before hashing or mailing.

use std::sync::{Arc, LazyLock};

use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::{hash_password_blocking, verify_password_blocking};
use super::token::{TokenClaims, TokenSigner, RESET_TTL_SECS};
use super::AuthError;
use crate::db::repository;
use crate::db::Database;
use crate::mailer::{password_reset_mail, Mailer};
use crate::models::{TokenPurpose, User, UserProfile};

pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Response body for register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
}

pub struct AuthService {
    signer: TokenSigner,
    iterations: u32,
    frontend_url: String,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(
        signer: TokenSigner,
        iterations: u32,
        frontend_url: String,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            signer,
            iterations,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            mailer,
        }
    }

    pub fn mailer_name(&self) -> &'static str {
        self.mailer.name()
    }

    pub async fn register(
        &self,
        db: &Database,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let name = name.trim();
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(AuthError::Validation(
                "Email, password, and name are required".into(),
            ));
        }
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(AuthError::Validation("Invalid email address".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        {
            let conn = db.conn()?;
            if repository::get_user_by_email(&conn, &email)?.is_some() {
                return Err(AuthError::EmailTaken);
            }
        }

        let password_hash = hash_password_blocking(password.to_string(), self.iterations).await?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name: name.to_string(),
            created_at: Utc::now().naive_utc(),
            reset_token: None,
            reset_token_expires: None,
        };

        {
            let conn = db.conn()?;
            // A concurrent registration may have won the race while we hashed.
            repository::insert_user(&conn, &user).map_err(|e| match e {
                crate::db::DatabaseError::ConstraintViolation(_) => AuthError::EmailTaken,
                other => AuthError::Database(other),
            })?;
        }

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(
        &self,
        db: &Database,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".into(),
            ));
        }

        let user = {
            let conn = db.conn()?;
            repository::get_user_by_email(&conn, &email)?
        };
        let Some(user) = user else {
            tracing::warn!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let matches =
            verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !matches {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.session_for(&user)
    }

    /// Resolve a bearer token into its claims. Only session tokens pass.
    pub fn authenticate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.signer.verify(token, Utc::now().timestamp())?;
        if claims.purpose != TokenPurpose::Session {
            return Err(AuthError::WrongPurpose);
        }
        Ok(claims)
    }

    pub fn current_user(&self, db: &Database, user_id: &str) -> Result<UserProfile, AuthError> {
        let id = Uuid::parse_str(user_id).map_err(|_| AuthError::UserNotFound)?;
        let conn = db.conn()?;
        repository::get_user(&conn, &id)?
            .map(|u| UserProfile::from(&u))
            .ok_or(AuthError::UserNotFound)
    }

    /// Issue a reset token and mail the link. Unknown emails are a silent
    /// no-op so callers cannot discover which accounts exist.
    pub async fn forgot_password(&self, db: &Database, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".into()));
        }

        let now = Utc::now();
        let user = {
            let conn = db.conn()?;
            repository::get_user_by_email(&conn, &email)?
        };
        let Some(user) = user else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let claims = TokenClaims::new(
            user.id.to_string(),
            user.email.clone(),
            TokenPurpose::PasswordReset,
            now.timestamp(),
        );
        let token = self.signer.sign(&claims)?;
        let expires = now.naive_utc() + Duration::seconds(RESET_TTL_SECS);
        {
            let conn = db.conn()?;
            repository::set_reset_token(&conn, &user.id, &token, expires)?;
        }

        let mail = password_reset_mail(&user.email, &user.name, &self.reset_url(&token));
        if let Err(e) = self.mailer.send(&mail).await {
            // The token is stored either way; a retry simply issues a new one.
            tracing::warn!(user_id = %user.id, error = %e, "Password reset email not delivered");
        } else {
            tracing::info!(user_id = %user.id, mailer = self.mailer.name(), "Password reset email sent");
        }
        Ok(())
    }

    /// Set a new password using a reset token. A token works once.
    pub async fn reset_password(
        &self,
        db: &Database,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(AuthError::Validation(
                "Token and new password are required".into(),
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let now = Utc::now();
        let claims = self
            .signer
            .verify(token, now.timestamp())
            .map_err(|_| AuthError::ResetTokenRejected)?;
        if claims.purpose != TokenPurpose::PasswordReset {
            return Err(AuthError::NotResetToken);
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::ResetTokenRejected)?;

        let password_hash =
            hash_password_blocking(new_password.to_string(), self.iterations).await?;

        let consumed = {
            let conn = db.conn()?;
            repository::consume_reset_token(&conn, &user_id, token, &password_hash, now.naive_utc())?
        };
        if !consumed {
            tracing::warn!(user_id = %user_id, "Reset token already used or superseded");
            return Err(AuthError::ResetTokenRejected);
        }

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, AuthError> {
        let claims = TokenClaims::new(
            user.id.to_string(),
            user.email.clone(),
            TokenPurpose::Session,
            Utc::now().timestamp(),
        );
        Ok(AuthSession {
            user: UserProfile::from(user),
            token: self.signer.sign(&claims)?,
        })
    }

    #[cfg(test)]
    pub(crate) fn signer(&self) -> &TokenSigner {
        &self.signer
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MemoryMailer;

    const TEST_ITERATIONS: u32 = 1_000;

    fn setup() -> (AuthService, Database, Arc<MemoryMailer>) {
        let mailer = Arc::new(MemoryMailer::new());
        let service = AuthService::new(
            TokenSigner::new(b"unit-test-secret"),
            TEST_ITERATIONS,
            "https://app.claimrx.test/".into(),
            mailer.clone(),
        );
        (service, Database::open_in_memory().unwrap(), mailer)
    }

    fn token_from_link(html: &str) -> String {
        let start = html.find("token=").unwrap() + "token=".len();
        let rest = &html[start..];
        let end = rest.find('"').unwrap();
        rest[..end].to_string()
    }

    #[tokio::test]
    async fn register_then_login_resolves_same_user() {
        let (svc, db, _) = setup();
        let registered = svc
            .register(&db, " Dana@Clinic.test ", "hunter2hunter2", "Dana Reyes")
            .await
            .unwrap();
        assert_eq!(registered.user.email, "dana@clinic.test");

        let session = svc.login(&db, "dana@clinic.test", "hunter2hunter2").await.unwrap();
        let claims = svc.authenticate(&session.token).unwrap();
        let me = svc.current_user(&db, &claims.sub).unwrap();
        assert_eq!(me, registered.user);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let (svc, db, _) = setup();
        svc.register(&db, "a@b.test", "password-one", "A").await.unwrap();
        let err = svc
            .register(&db, "A@B.test", "password-two", "A2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (svc, db, _) = setup();
        let missing = svc.register(&db, "", "password1", "X").await.unwrap_err();
        assert_eq!(missing.to_string(), "Email, password, and name are required");
        assert!(matches!(
            svc.register(&db, "not-an-email", "password1", "X").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            svc.register(&db, "x@y.test", "short", "X").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_identical() {
        let (svc, db, _) = setup();
        svc.register(&db, "a@b.test", "correct-horse", "A").await.unwrap();
        let wrong = svc.login(&db, "a@b.test", "battery-staple").await.unwrap_err();
        let unknown = svc.login(&db, "nobody@b.test", "correct-horse").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_sends_nothing() {
        let (svc, db, mailer) = setup();
        svc.forgot_password(&db, "ghost@b.test").await.unwrap();
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn reset_token_works_exactly_once() {
        let (svc, db, mailer) = setup();
        svc.register(&db, "a@b.test", "original-pass", "A").await.unwrap();
        svc.forgot_password(&db, "a@b.test").await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .html
            .contains("https://app.claimrx.test/reset-password?token="));
        let token = token_from_link(&sent[0].html);

        svc.reset_password(&db, &token, "brand-new-pass").await.unwrap();
        let again = svc
            .reset_password(&db, &token, "another-pass")
            .await
            .unwrap_err();
        assert!(matches!(again, AuthError::ResetTokenRejected));

        assert!(svc.login(&db, "a@b.test", "brand-new-pass").await.is_ok());
        assert!(svc.login(&db, "a@b.test", "original-pass").await.is_err());
    }

    #[tokio::test]
    async fn newer_reset_request_supersedes_older_token() {
        let (svc, db, mailer) = setup();
        svc.register(&db, "a@b.test", "original-pass", "A").await.unwrap();
        svc.forgot_password(&db, "a@b.test").await.unwrap();
        // Tokens carry second-resolution iat; wait so the second differs.
        tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;
        svc.forgot_password(&db, "a@b.test").await.unwrap();

        let sent = mailer.sent();
        let first = token_from_link(&sent[0].html);
        let second = token_from_link(&sent[1].html);
        assert_ne!(first, second);
        assert!(matches!(
            svc.reset_password(&db, &first, "new-password").await,
            Err(AuthError::ResetTokenRejected)
        ));
        assert!(svc.reset_password(&db, &second, "new-password").await.is_ok());
    }

    #[tokio::test]
    async fn session_token_cannot_reset_and_reset_token_cannot_authenticate() {
        let (svc, db, _) = setup();
        let session = svc.register(&db, "a@b.test", "original-pass", "A").await.unwrap();
        assert!(matches!(
            svc.reset_password(&db, &session.token, "new-password").await,
            Err(AuthError::NotResetToken)
        ));

        let reset = svc
            .signer()
            .sign(&TokenClaims::new(
                session.user.id.clone(),
                session.user.email.clone(),
                TokenPurpose::PasswordReset,
                Utc::now().timestamp(),
            ))
            .unwrap();
        assert!(matches!(
            svc.authenticate(&reset),
            Err(AuthError::WrongPurpose)
        ));
    }

    #[tokio::test]
    async fn garbage_reset_token_rejected() {
        let (svc, db, _) = setup();
        assert!(matches!(
            svc.reset_password(&db, "not.a.token", "new-password").await,
            Err(AuthError::ResetTokenRejected)
        ));
    }

    #[test]
    fn reset_url_has_no_double_slash() {
        let (svc, _, _) = setup();
        assert_eq!(
            svc.reset_url("abc"),
            "https://app.claimrx.test/reset-password?token=abc"
        );
    }
}
