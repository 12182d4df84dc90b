//! Workspace login across several credential stores.
//!
//! Stores are consulted one at a time in priority order. The first store
//! that returns a matching user decides the session; nothing is merged
//! across stores. A store that errors or times out is skipped, never fatal.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{
    AttemptOutcome, LicenseStatus, Organization, SessionResult, SessionUser, StoreAttempt,
};
use crate::stores::{CallFailure, CredentialStore, bounded, expire_if_due};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Required field missing or blank.
    Validation(String),
    /// No store matched. Deliberately carries no detail.
    InvalidCredentials,
    /// Credentials matched but the organization may not sign in.
    LicenseInvalid(LicenseStatus),
    /// Every store failed before any could answer.
    Unavailable,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Validation(msg) => write!(f, "{msg}"),
            AuthError::InvalidCredentials => f.write_str("Invalid credentials"),
            AuthError::LicenseInvalid(status) => write!(f, "License is {status}"),
            AuthError::Unavailable => f.write_str("Authentication backends unavailable"),
        }
    }
}

pub struct Resolver {
    stores: Vec<Arc<dyn CredentialStore>>,
    timeout: Duration,
}

impl Resolver {
    pub fn new(stores: Vec<Arc<dyn CredentialStore>>, timeout: Duration) -> Self {
        Self { stores, timeout }
    }

    #[tracing::instrument(skip(self, password), fields(tenant = %tenant_id))]
    pub async fn authenticate(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionResult, AuthError> {
        let tenant_id = tenant_id.trim();
        let email = email.trim();
        if tenant_id.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Account ID, email and password are required".to_string(),
            ));
        }

        let mut attempted = Vec::with_capacity(self.stores.len());

        for (position, store) in self.stores.iter().enumerate() {
            let kind = store.kind();
            let outcome = match bounded(
                self.timeout,
                store.find_workspace_user(tenant_id, email, password),
            )
            .await
            {
                Ok(Some(user)) => {
                    attempted.push(StoreAttempt {
                        store: kind,
                        outcome: AttemptOutcome::Matched,
                    });
                    tracing::debug!(store = %kind, ?attempted, "Credential match");

                    self.check_license(position, tenant_id).await?;

                    return Ok(SessionResult {
                        success: true,
                        user: SessionUser::from(user),
                        source: kind,
                        attempted,
                    });
                }
                Ok(None) => AttemptOutcome::NotFound,
                Err(CallFailure::TimedOut) => {
                    tracing::warn!(store = %kind, "Credential store timed out");
                    AttemptOutcome::TimedOut
                }
                Err(CallFailure::Store(e)) => {
                    tracing::warn!(store = %kind, "Credential store failed: {e}");
                    AttemptOutcome::Unavailable
                }
            };
            attempted.push(StoreAttempt {
                store: kind,
                outcome,
            });
        }

        tracing::debug!(?attempted, "No credential store matched");

        if !attempted.is_empty() && attempted.iter().all(|a| a.outcome.is_failure()) {
            Err(AuthError::Unavailable)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// License gate applied after a credential match. The organization is
    /// read from the matching store first, then from the others in order.
    async fn check_license(&self, matched: usize, tenant_id: &str) -> Result<(), AuthError> {
        let order = std::iter::once(matched).chain((0..self.stores.len()).filter(|i| *i != matched));

        let mut any_answered = false;
        for index in order {
            let store = &self.stores[index];
            match bounded(self.timeout, store.find_organization(tenant_id)).await {
                Ok(Some(mut org)) => {
                    expire_if_due(store.as_ref(), &mut org, self.timeout).await;
                    return license_gate(&org);
                }
                Ok(None) => any_answered = true,
                Err(e) => {
                    tracing::warn!(store = %store.kind(), "Organization lookup failed: {e}");
                }
            }
        }

        if any_answered {
            tracing::warn!(tenant = tenant_id, "Credentials matched but organization is missing");
            Err(AuthError::InvalidCredentials)
        } else {
            Err(AuthError::Unavailable)
        }
    }
}

fn license_gate(org: &Organization) -> Result<(), AuthError> {
    if org.is_licensed() {
        Ok(())
    } else {
        tracing::info!(
            organization = %org.id,
            status = %org.license_status,
            "Login refused for unlicensed organization"
        );
        Err(AuthError::LicenseInvalid(org.license_status))
    }
}
