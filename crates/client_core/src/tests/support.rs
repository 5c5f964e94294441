//! In-memory [`ResourceApi`] used by controller and form tests.

use std::sync::{
    atomic::{AtomicBool, AtomicI64, Ordering},
    Mutex,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{Department, DepartmentId, Post, PostId},
    resource::Resource,
};

use crate::{api::ResourceApi, error::ClientError};

pub struct FakeApi<R: Resource> {
    pub entries: Mutex<Vec<R>>,
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<R>>,
    failing: AtomicBool,
    next_id: AtomicI64,
    assign_id: fn(&mut R, i64),
}

impl<R: Resource> FakeApi<R> {
    fn with_assigner(entries: Vec<R>, assign_id: fn(&mut R, i64)) -> Self {
        Self {
            next_id: AtomicI64::new(entries.len() as i64 + 100),
            entries: Mutex::new(entries),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            assign_id,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    fn record(&self, call: String) -> Result<(), ClientError> {
        self.calls.lock().expect("calls").push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                method: "TEST",
                url: format!("http://fake/{}", R::PATH),
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(())
    }
}

impl FakeApi<Post> {
    pub fn posts(entries: Vec<Post>) -> Self {
        Self::with_assigner(entries, |post, id| post.id = Some(PostId(id)))
    }
}

impl FakeApi<Department> {
    pub fn departments(entries: Vec<Department>) -> Self {
        Self::with_assigner(entries, |department, id| {
            department.id = Some(DepartmentId(id))
        })
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for FakeApi<R> {
    async fn list(&self) -> Result<Vec<R>, ClientError> {
        self.record("list".to_string())?;
        Ok(self.entries.lock().expect("entries").clone())
    }

    async fn create(&self, entity: &R) -> Result<R, ClientError> {
        self.record("create".to_string())?;
        self.sent.lock().expect("sent").push(entity.clone());
        let mut created = entity.clone();
        (self.assign_id)(&mut created, self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries.lock().expect("entries").push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: R::Id, entity: &R) -> Result<R, ClientError> {
        self.record(format!("update {id}"))?;
        self.sent.lock().expect("sent").push(entity.clone());
        let mut entries = self.entries.lock().expect("entries");
        match entries.iter_mut().find(|entry| entry.id() == Some(id)) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity.clone())
            }
            None => Err(ClientError::Status {
                method: "PUT",
                url: format!("http://fake/{}/{id}", R::PATH),
                status: StatusCode::NOT_FOUND,
            }),
        }
    }

    async fn delete(&self, id: R::Id) -> Result<(), ClientError> {
        self.record(format!("delete {id}"))?;
        self.entries
            .lock()
            .expect("entries")
            .retain(|entry| entry.id() != Some(id));
        Ok(())
    }
}
