use std::sync::Arc;

use secrecy::SecretString;

use crate::services::{CatalogService, IdentityService, IncidentService};

#[derive(Clone)]
pub struct AppContext {
    pub incidents: Arc<dyn IncidentService>,
    pub identity: Arc<dyn IdentityService>,
    pub catalog: Arc<dyn CatalogService>,
    /// Service token the proxy presents to the catalog.
    pub catalog_token: Option<SecretString>,
}

impl AppContext {
    pub fn new(
        incidents: Arc<dyn IncidentService>,
        identity: Arc<dyn IdentityService>,
        catalog: Arc<dyn CatalogService>,
        catalog_token: Option<SecretString>,
    ) -> Self {
        Self {
            incidents,
            identity,
            catalog,
            catalog_token,
        }
    }
}
