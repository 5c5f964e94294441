use shared::resource::Resource;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    controller::ResourceController,
    draft::{DepartmentDraft, Draft, DraftError, FieldPath, PostDraft, PostField},
    error::{user_facing_message, ClientError},
};

#[derive(Debug, Clone)]
pub enum FormEvent<D: Draft> {
    DraftChanged(D),
    EditRejected(DraftError),
    DraftCleared,
    Submitted(D::Resource),
    SubmitFailed(String),
}

/// Owns the draft of one in-progress form.
///
/// At most one draft exists at a time. Beginning a new create/edit replaces
/// the previous draft. Submitting hands the finalized entity to the
/// controller and discards the draft only on success.
pub struct FormSession<D: Draft> {
    draft: Option<D>,
    events: broadcast::Sender<FormEvent<D>>,
}

impl<D: Draft> FormSession<D> {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            draft: None,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FormEvent<D>> {
        self.events.subscribe()
    }

    pub fn draft(&self) -> Option<&D> {
        self.draft.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.draft.is_some()
    }

    fn replace(&mut self, draft: D) -> &D {
        let _ = self.events.send(FormEvent::DraftChanged(draft.clone()));
        self.draft.insert(draft)
    }

    pub fn begin_create(&mut self) -> &D {
        debug!(resource = <D::Resource as Resource>::PATH, "begin create");
        self.replace(D::blank())
    }

    pub fn begin_edit(&mut self, selected: &D::Resource) -> &D {
        debug!(
            resource = <D::Resource as Resource>::PATH,
            id = ?selected.id(),
            "begin edit"
        );
        self.replace(D::from_resource(selected))
    }

    /// Starts editing the entry shown at `index` in the controller's list.
    pub async fn begin_edit_at(
        &mut self,
        controller: &ResourceController<D::Resource>,
        index: usize,
    ) -> Result<&D, ClientError> {
        let selected = controller
            .entry(index)
            .await
            .ok_or(ClientError::NoSuchEntry {
                resource: <D::Resource as Resource>::PATH,
                index,
            })?;
        Ok(self.begin_edit(&selected))
    }

    /// Applies `op` to the current draft.
    ///
    /// Returns `Ok(false)` when `op` rejects the edit; the draft is then left
    /// as it was.
    pub fn edit<F>(&mut self, op: F) -> Result<bool, ClientError>
    where
        F: FnOnce(&D) -> Result<D, DraftError>,
    {
        let current = self.draft.as_ref().ok_or(ClientError::NoActiveDraft)?;
        match op(current) {
            Ok(next) => {
                self.replace(next);
                Ok(true)
            }
            Err(err) => {
                warn!(
                    resource = <D::Resource as Resource>::PATH,
                    error = %err,
                    "ignored draft edit"
                );
                let _ = self.events.send(FormEvent::EditRejected(err));
                Ok(false)
            }
        }
    }

    pub fn cancel(&mut self) {
        if self.draft.take().is_some() {
            let _ = self.events.send(FormEvent::DraftCleared);
        }
    }

    /// Creates the entity when the draft has no id, updates it otherwise.
    pub async fn submit(
        &mut self,
        controller: &ResourceController<D::Resource>,
    ) -> Result<D::Resource, ClientError> {
        let entity = self
            .draft
            .as_ref()
            .ok_or(ClientError::NoActiveDraft)?
            .finalize();

        let result = match entity.id() {
            None => controller.create(entity).await,
            Some(_) => controller.update(entity).await,
        };

        match result {
            Ok(saved) => {
                info!(
                    resource = <D::Resource as Resource>::PATH,
                    id = ?saved.id(),
                    "form submitted"
                );
                self.draft = None;
                let _ = self.events.send(FormEvent::Submitted(saved.clone()));
                let _ = self.events.send(FormEvent::DraftCleared);
                Ok(saved)
            }
            Err(err) => {
                let _ = self
                    .events
                    .send(FormEvent::SubmitFailed(user_facing_message(&err)));
                Err(err)
            }
        }
    }
}

impl FormSession<DepartmentDraft> {
    pub fn add_employee(&mut self) -> Result<bool, ClientError> {
        self.edit(|draft| Ok(draft.add_employee()))
    }

    pub fn remove_employee(&mut self, index: usize) -> Result<bool, ClientError> {
        self.edit(|draft| draft.remove_employee(index))
    }

    pub fn add_skill(&mut self, employee: usize) -> Result<bool, ClientError> {
        self.edit(|draft| draft.add_skill(employee))
    }

    pub fn remove_skill(&mut self, employee: usize, skill: usize) -> Result<bool, ClientError> {
        self.edit(|draft| draft.remove_skill(employee, skill))
    }

    pub fn update_field(
        &mut self,
        path: FieldPath,
        value: impl Into<String>,
    ) -> Result<bool, ClientError> {
        let value = value.into();
        self.edit(|draft| draft.update_field(path, value))
    }
}

impl FormSession<PostDraft> {
    pub fn update_field(
        &mut self,
        field: PostField,
        value: impl Into<String>,
    ) -> Result<bool, ClientError> {
        let value = value.into();
        self.edit(|draft| Ok(draft.update_field(field, value)))
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
