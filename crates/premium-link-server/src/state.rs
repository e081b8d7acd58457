//! Shared application state handed to every route.

use std::sync::Arc;
use std::time::Duration;

use crate::eligibility::ProfileEligibilityResolver;
use crate::linking::LinkingEngine;
use crate::oracle::OwnershipOracle;
use crate::registry::LinkRegistry;
use crate::status::StatusResolver;

#[derive(Clone)]
pub struct AppState {
    pub eligibility: ProfileEligibilityResolver,
    pub engine: LinkingEngine,
    pub status: StatusResolver,
    /// Bearer token for admin routes. Admin routes are disabled when unset.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Wires the core components around one registry and one oracle.
    pub fn new(
        registry: Arc<dyn LinkRegistry>,
        oracle: Arc<dyn OwnershipOracle>,
        oracle_timeout: Duration,
    ) -> Self {
        let eligibility = ProfileEligibilityResolver::new(oracle, registry.clone(), oracle_timeout);
        Self {
            engine: LinkingEngine::new(eligibility.clone(), registry.clone()),
            status: StatusResolver::new(eligibility.clone(), registry),
            eligibility,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }
}
