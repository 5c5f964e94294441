//! REST-addressable entity collections.

use std::{fmt, hash::Hash};

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::{Department, DepartmentId, Post, PostId};

/// An entity served under `/{PATH}` with `GET`, `POST`, `PUT /{id}` and `DELETE /{id}`.
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    const PATH: &'static str;

    fn id(&self) -> Option<Self::Id>;
}

impl Resource for Post {
    type Id = PostId;

    const PATH: &'static str = "posts";

    fn id(&self) -> Option<PostId> {
        self.id
    }
}

impl Resource for Department {
    type Id = DepartmentId;

    const PATH: &'static str = "departments";

    fn id(&self) -> Option<DepartmentId> {
        self.id
    }
}
