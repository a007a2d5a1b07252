//! A signed-in dashboard: the API client plus the store it feeds.
//!
//! Every mutation goes to the server first, then the affected collections
//! are pulled again and applied through `reduce`. The cache is never
//! patched locally. Any 401/403 from the server signs the session out.

use crate::dashboard::client::{ApiClient, AppealDraft, ClaimDraft, ClientError};
use crate::dashboard::store::{reduce, DashboardAction, DashboardStore};
use crate::letters::{GeneratedLetter, LetterFields};
use crate::models::{Appeal, AppealStatus, Claim, ClaimStatus, UserProfile};

pub struct DashboardSession {
    client: ApiClient,
    store: DashboardStore,
}

impl DashboardSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            store: DashboardStore::default(),
        }
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn dispatch(&mut self, action: DashboardAction) {
        let store = std::mem::take(&mut self.store);
        self.store = reduce(store, action);
    }

    /// Drop the session when the server says the token is no good.
    fn guard<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &result {
            if err.is_unauthorized() {
                tracing::warn!(error = %err, "Dashboard session rejected, signing out");
                self.sign_out();
            }
        }
        result
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let session = self.client.login(email, password).await?;
        self.start(session.user.clone(), session.token).await?;
        Ok(session.user)
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserProfile, ClientError> {
        let session = self.client.register(email, password, name).await?;
        self.start(session.user.clone(), session.token).await?;
        Ok(session.user)
    }

    /// Resume with a token kept from an earlier sign-in.
    pub async fn resume(&mut self, token: String) -> Result<UserProfile, ClientError> {
        self.client.set_token(Some(token));
        let user = self.client.me().await;
        let user = self.guard(user)?;
        self.dispatch(DashboardAction::SignedIn(user.clone()));
        self.load().await?;
        Ok(user)
    }

    async fn start(&mut self, user: UserProfile, token: String) -> Result<(), ClientError> {
        self.client.set_token(Some(token));
        self.dispatch(DashboardAction::SignedIn(user));
        self.load().await
    }

    pub fn sign_out(&mut self) {
        self.client.set_token(None);
        self.dispatch(DashboardAction::SignedOut);
    }

    /// Pull all three collections.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let fetched = tokio::try_join!(
            self.client.list_claims(),
            self.client.list_appeals(),
            self.client.list_payers(),
        );
        let (claims, appeals, payers) = self.guard(fetched)?;
        self.dispatch(DashboardAction::Loaded {
            claims,
            appeals,
            payers,
        });
        Ok(())
    }

    async fn pull_claims(&mut self) -> Result<(), ClientError> {
        let claims = self.client.list_claims().await;
        let claims = self.guard(claims)?;
        self.dispatch(DashboardAction::ClaimsRefreshed(claims));
        Ok(())
    }

    async fn pull_appeals(&mut self) -> Result<(), ClientError> {
        let appeals = self.client.list_appeals().await;
        let appeals = self.guard(appeals)?;
        self.dispatch(DashboardAction::AppealsRefreshed(appeals));
        Ok(())
    }

    pub async fn create_claim(&mut self, draft: &ClaimDraft) -> Result<Claim, ClientError> {
        let created = self.client.create_claim(draft).await;
        let created = self.guard(created)?;
        self.pull_claims().await?;
        Ok(created)
    }

    pub async fn set_claim_status(&mut self, id: &str, status: ClaimStatus) -> Result<Claim, ClientError> {
        let updated = self.client.update_claim_status(id, status).await;
        let updated = self.guard(updated)?;
        self.pull_claims().await?;
        Ok(updated)
    }

    /// Filing an appeal also changes the claim's status, so both
    /// collections are pulled.
    pub async fn submit_appeal(&mut self, draft: &AppealDraft) -> Result<Appeal, ClientError> {
        let created = self.client.create_appeal(draft).await;
        let created = self.guard(created)?;
        self.pull_appeals().await?;
        self.pull_claims().await?;
        Ok(created)
    }

    pub async fn decide_appeal(
        &mut self,
        id: &str,
        status: AppealStatus,
        recovered_amount: Option<f64>,
    ) -> Result<Appeal, ClientError> {
        let updated = self.client.update_appeal(id, status, recovered_amount).await;
        let updated = self.guard(updated)?;
        self.pull_appeals().await?;
        Ok(updated)
    }

    /// Letter drafting has no cache effect.
    pub async fn generate_letter(&mut self, claim_id: &str) -> Result<GeneratedLetter, ClientError> {
        let cached = self.store.claim(claim_id).map(LetterFields::from);
        let fields = match cached {
            Some(fields) => fields,
            None => {
                let claim = self.client.get_claim(claim_id).await;
                LetterFields::from(&self.guard(claim)?)
            }
        };
        let letter = self.client.generate_letter(&fields).await;
        self.guard(letter)
    }
}
