use std::sync::Arc;
use std::time::Duration;

use crate::auth::resolver::Resolver;
use crate::config::Config;
use crate::directory::Directory;
use crate::document::JsonDocument;
use crate::models::{Lead, SiteContent};
use crate::rate_limit::LoginRateLimiter;
use crate::stores::{CredentialStore, LocalStore, MemberStore, OrganizationStore, PgStore, TenantStore};

pub const CONTENT_FILE: &str = "content.json";
pub const LEADS_FILE: &str = "leads.json";

pub type SharedState = Arc<AppState>;

/// The configured backends. The local store is always present.
pub struct Stores {
    pub primary: Option<Arc<PgStore>>,
    pub tenant: Option<Arc<TenantStore>>,
    pub local: Arc<LocalStore>,
}

impl Stores {
    pub fn local_only(local: LocalStore) -> Self {
        Self {
            primary: None,
            tenant: None,
            local: Arc::new(local),
        }
    }
}

pub struct AppState {
    pub config: Config,
    pub resolver: Resolver,
    pub directory: Directory,
    pub members: Arc<dyn MemberStore>,
    pub content: JsonDocument<SiteContent>,
    pub leads: JsonDocument<Vec<Lead>>,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        let timeout: Duration = config.store_timeout;

        // Priority order: primary, per-tenant, local
        let mut credential_chain: Vec<Arc<dyn CredentialStore>> = Vec::new();
        let mut writable: Vec<Arc<dyn OrganizationStore>> = Vec::new();
        if let Some(primary) = &stores.primary {
            credential_chain.push(primary.clone());
            writable.push(primary.clone());
        }
        if let Some(tenant) = &stores.tenant {
            credential_chain.push(tenant.clone());
        }
        credential_chain.push(stores.local.clone());
        writable.push(stores.local.clone());

        let members: Arc<dyn MemberStore> = match &stores.tenant {
            Some(tenant) => tenant.clone(),
            None => stores.local.clone(),
        };

        let content = JsonDocument::new(config.data_dir.join(CONTENT_FILE));
        let leads = JsonDocument::new(config.data_dir.join(LEADS_FILE));

        AppState {
            resolver: Resolver::new(credential_chain, timeout),
            directory: Directory::new(writable, stores.tenant, timeout, config.trial_days),
            members,
            content,
            leads,
            login_limiter: LoginRateLimiter::new(),
            config,
        }
    }
}
