use std::sync::Arc;

use shared::domain::{Department, Post};
use tracing::info;

pub mod api;
pub mod config;
pub mod controller;
pub mod draft;
pub mod error;
pub mod form;
pub mod store;

pub use api::{HttpResourceApi, ResourceApi};
pub use config::{load_settings, ClientSettings};
pub use controller::{ResourceController, StoreEvent};
pub use draft::{
    DepartmentDraft, Draft, DraftError, EmployeeField, FieldPath, PostDraft, PostField,
};
pub use error::{user_facing_message, ClientError};
pub use form::{FormEvent, FormSession};
pub use store::{QueryStatus, ResourceStore};

/// Controllers for every collection the backend exposes, sharing one HTTP client.
pub struct CrudClient {
    pub posts: ResourceController<Post>,
    pub departments: ResourceController<Department>,
    settings: ClientSettings,
}

impl CrudClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let api = Arc::new(HttpResourceApi::from_settings(&settings)?);
        info!(api_base_url = %api.base_url(), "configured REST client");
        Ok(Self::with_api(settings, api))
    }

    pub fn with_api<A>(settings: ClientSettings, api: Arc<A>) -> Self
    where
        A: ResourceApi<Post> + ResourceApi<Department> + 'static,
    {
        Self {
            posts: ResourceController::<Post>::new(api.clone(), settings.event_capacity),
            departments: ResourceController::<Department>::new(api, settings.event_capacity),
            settings,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn post_form(&self) -> FormSession<PostDraft> {
        FormSession::new(self.settings.event_capacity)
    }

    pub fn department_form(&self) -> FormSession<DepartmentDraft> {
        FormSession::new(self.settings.event_capacity)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
