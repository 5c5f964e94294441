use std::sync::Arc;

use shared::resource::Resource;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::{
    api::ResourceApi,
    error::{user_facing_message, ClientError},
    store::{QueryStatus, ResourceStore},
};

#[derive(Debug, Clone)]
pub enum StoreEvent<R: Resource> {
    Loading,
    Loaded { count: usize },
    Created(R),
    Updated(R),
    Removed(R::Id),
    Invalidated,
    Failed(String),
}

/// Pairs one collection's [`ResourceStore`] with the API that backs it.
pub struct ResourceController<R: Resource> {
    api: Arc<dyn ResourceApi<R>>,
    store: RwLock<ResourceStore<R>>,
    events: broadcast::Sender<StoreEvent<R>>,
}

impl<R: Resource> ResourceController<R> {
    pub fn new(api: Arc<dyn ResourceApi<R>>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            api,
            store: RwLock::new(ResourceStore::new()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent<R>> {
        self.events.subscribe()
    }

    pub async fn entries(&self) -> Vec<R> {
        self.store.read().await.entries().to_vec()
    }

    pub async fn entry(&self, index: usize) -> Option<R> {
        self.store.read().await.entry(index).cloned()
    }

    pub async fn status(&self) -> QueryStatus {
        self.store.read().await.status().clone()
    }

    pub async fn invalidate(&self) {
        self.store.write().await.invalidate();
        let _ = self.events.send(StoreEvent::Invalidated);
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.store.write().await.begin_loading();
        let _ = self.events.send(StoreEvent::Loading);

        match self.api.list().await {
            Ok(entries) => {
                let count = entries.len();
                self.store.write().await.set_loaded(entries);
                let _ = self.events.send(StoreEvent::Loaded { count });
                Ok(())
            }
            Err(err) => {
                let message = user_facing_message(&err);
                warn!(resource = R::PATH, error = %err, "failed to load collection");
                self.store.write().await.set_failed(message.clone());
                let _ = self.events.send(StoreEvent::Failed(message));
                Err(err)
            }
        }
    }

    /// Fetches when nothing is loaded yet, the last load failed, or the
    /// store was invalidated.
    pub async fn ensure_fresh(&self) -> Result<(), ClientError> {
        if self.store.read().await.needs_fetch() {
            self.refresh().await?;
        }
        Ok(())
    }

    pub async fn create(&self, entity: R) -> Result<R, ClientError> {
        let created = self.api.create(&entity).await.inspect_err(|err| {
            warn!(resource = R::PATH, error = %err, "create failed");
        })?;
        info!(resource = R::PATH, id = ?created.id(), "created entity");
        self.store.write().await.apply_created(created.clone());
        let _ = self.events.send(StoreEvent::Created(created.clone()));
        Ok(created)
    }

    pub async fn update(&self, entity: R) -> Result<R, ClientError> {
        let id = entity
            .id()
            .ok_or(ClientError::MissingId { resource: R::PATH })?;
        let updated = self.api.update(id, &entity).await.inspect_err(|err| {
            warn!(resource = R::PATH, %id, error = %err, "update failed");
        })?;
        info!(resource = R::PATH, %id, "updated entity");
        let folded = self.store.write().await.apply_updated(updated.clone());
        if !folded {
            warn!(resource = R::PATH, %id, "updated entity not in cached list; marked stale");
        }
        let _ = self.events.send(StoreEvent::Updated(updated.clone()));
        Ok(updated)
    }

    pub async fn delete(&self, id: R::Id) -> Result<(), ClientError> {
        self.api.delete(id).await.inspect_err(|err| {
            warn!(resource = R::PATH, %id, error = %err, "delete failed");
        })?;
        info!(resource = R::PATH, %id, "deleted entity");
        self.store.write().await.apply_removed(id);
        let _ = self.events.send(StoreEvent::Removed(id));
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
