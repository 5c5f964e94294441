//! Editable working copies of entities.
//!
//! Every edit returns a new draft value and leaves its input untouched, so a
//! view holding the previous draft keeps seeing consistent data. Each change
//! bumps [`Draft::revision`], which is what observers compare to detect
//! updates.
//!
//! Malformed indices are rejected with a [`DraftError`]; the form session
//! turns a rejection into a no-op.

use std::{collections::HashSet, fmt, str::FromStr};

use shared::{
    domain::{Department, DepartmentId, Employee, EmployeeId, Post, PostId, Skill},
    resource::Resource,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("employee index {index} out of range ({len} employees)")]
    EmployeeIndexOutOfRange { index: usize, len: usize },
    #[error("skill index {index} out of range for employee {employee} ({len} skills)")]
    SkillIndexOutOfRange {
        employee: usize,
        index: usize,
        len: usize,
    },
    #[error("employee {employee} must keep at least one skill")]
    LastSkill { employee: usize },
}

pub trait Draft: Clone + fmt::Debug + Send + Sync + 'static {
    type Resource: Resource;

    /// Draft backing the "create" form.
    fn blank() -> Self;

    /// Independent copy of an existing entity for the "edit" form.
    fn from_resource(resource: &Self::Resource) -> Self;

    fn revision(&self) -> u64;

    /// Entity handed to the create/update call.
    fn finalize(&self) -> Self::Resource;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeField {
    Name,
    Position,
}

/// Addresses one editable leaf of a department draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    DepartmentName,
    Employee { index: usize, field: EmployeeField },
    Skill { employee: usize, skill: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDraft {
    id: Option<DepartmentId>,
    name: String,
    employees: Vec<Employee>,
    next_employee_id: Option<i64>,
    revision: u64,
}

impl Default for DepartmentDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl DepartmentDraft {
    /// One blank employee with one blank skill.
    pub fn new() -> Self {
        let empty = Self {
            id: None,
            name: String::new(),
            employees: Vec::new(),
            next_employee_id: Some(1),
            revision: 0,
        };
        let mut draft = empty.add_employee();
        draft.revision = 0;
        draft
    }

    /// Employee ids missing in `selected` stay missing until [`submit`](Self::submit);
    /// repeated ids after their first occurrence are replaced with fresh ones.
    /// Employees without skills get one blank skill.
    pub fn begin_edit(selected: &Department) -> Self {
        let mut taken: HashSet<EmployeeId> = selected
            .employees
            .iter()
            .filter_map(|employee| employee.id)
            .collect();
        let next_employee_id = match taken.iter().map(|id| id.0).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        };
        let mut draft = Self {
            id: selected.id,
            name: selected.name.clone(),
            employees: Vec::with_capacity(selected.employees.len()),
            next_employee_id,
            revision: 0,
        };

        let mut seen = HashSet::new();
        for employee in &selected.employees {
            let mut employee = employee.clone();
            if employee.skills.is_empty() {
                employee.skills.push(Skill::default());
            }
            if let Some(id) = employee.id {
                if !seen.insert(id) {
                    employee.id = Some(draft.allocate_employee_id(&mut taken));
                }
            }
            draft.employees.push(employee);
        }
        draft
    }

    pub fn id(&self) -> Option<DepartmentId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn next_revision(&self) -> Self {
        let mut next = self.clone();
        next.revision += 1;
        next
    }

    fn taken_employee_ids(&self) -> HashSet<EmployeeId> {
        self.employees
            .iter()
            .filter_map(|employee| employee.id)
            .collect()
    }

    /// Hands out the counter value when it is free, otherwise the lowest
    /// positive id not in `taken`. The counter is `None` once it has passed
    /// `i64::MAX`.
    fn allocate_employee_id(&mut self, taken: &mut HashSet<EmployeeId>) -> EmployeeId {
        let id = match self.next_employee_id {
            Some(candidate) if !taken.contains(&EmployeeId(candidate)) => EmployeeId(candidate),
            _ => lowest_free_employee_id(taken),
        };
        self.next_employee_id = id.0.checked_add(1);
        taken.insert(id);
        id
    }

    fn check_employee(&self, index: usize) -> Result<(), DraftError> {
        if index < self.employees.len() {
            Ok(())
        } else {
            Err(DraftError::EmployeeIndexOutOfRange {
                index,
                len: self.employees.len(),
            })
        }
    }

    fn check_skill(&self, employee: usize, skill: usize) -> Result<(), DraftError> {
        self.check_employee(employee)?;
        let len = self.employees[employee].skills.len();
        if skill < len {
            Ok(())
        } else {
            Err(DraftError::SkillIndexOutOfRange {
                employee,
                index: skill,
                len,
            })
        }
    }

    pub fn add_employee(&self) -> Self {
        let mut next = self.next_revision();
        let mut taken = next.taken_employee_ids();
        let id = next.allocate_employee_id(&mut taken);
        next.employees.push(Employee {
            id: Some(id),
            name: String::new(),
            position: String::new(),
            skills: vec![Skill::default()],
        });
        next
    }

    pub fn remove_employee(&self, index: usize) -> Result<Self, DraftError> {
        self.check_employee(index)?;
        let mut next = self.next_revision();
        next.employees.remove(index);
        Ok(next)
    }

    pub fn add_skill(&self, employee: usize) -> Result<Self, DraftError> {
        self.check_employee(employee)?;
        let mut next = self.next_revision();
        next.employees[employee].skills.push(Skill::default());
        Ok(next)
    }

    pub fn remove_skill(&self, employee: usize, skill: usize) -> Result<Self, DraftError> {
        self.check_skill(employee, skill)?;
        if self.employees[employee].skills.len() == 1 {
            return Err(DraftError::LastSkill { employee });
        }
        let mut next = self.next_revision();
        next.employees[employee].skills.remove(skill);
        Ok(next)
    }

    pub fn update_field(&self, path: FieldPath, value: impl Into<String>) -> Result<Self, DraftError> {
        match path {
            FieldPath::DepartmentName => {}
            FieldPath::Employee { index, .. } => self.check_employee(index)?,
            FieldPath::Skill { employee, skill } => self.check_skill(employee, skill)?,
        }

        let mut next = self.next_revision();
        let value = value.into();
        match path {
            FieldPath::DepartmentName => next.name = value,
            FieldPath::Employee { index, field } => {
                let employee = &mut next.employees[index];
                match field {
                    EmployeeField::Name => employee.name = value,
                    EmployeeField::Position => employee.position = value,
                }
            }
            FieldPath::Skill { employee, skill } => {
                next.employees[employee].skills[skill].name = value;
            }
        }
        Ok(next)
    }

    /// Finalized department; employees without an id get one from the
    /// draft's allocator.
    pub fn submit(&self) -> Department {
        let mut allocator = self.clone();
        let mut taken = self.taken_employee_ids();
        let employees = self
            .employees
            .iter()
            .map(|employee| {
                let mut employee = employee.clone();
                if employee.id.is_none() {
                    employee.id = Some(allocator.allocate_employee_id(&mut taken));
                }
                employee
            })
            .collect();

        Department {
            id: self.id,
            name: self.name.clone(),
            employees,
        }
    }
}

fn lowest_free_employee_id(taken: &HashSet<EmployeeId>) -> EmployeeId {
    // taken holds far fewer than i64::MAX ids, so this stops before overflowing
    let mut candidate = 1;
    while taken.contains(&EmployeeId(candidate)) {
        candidate += 1;
    }
    EmployeeId(candidate)
}

impl Draft for DepartmentDraft {
    type Resource = Department;

    fn blank() -> Self {
        Self::new()
    }

    fn from_resource(resource: &Department) -> Self {
        Self::begin_edit(resource)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn finalize(&self) -> Department {
        self.submit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Name,
    Email,
}

impl FromStr for PostField {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            other => Err(format!("unknown post field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    id: Option<PostId>,
    name: String,
    email: String,
    revision: u64,
}

impl PostDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            name: post.name.clone(),
            email: post.email.clone(),
            revision: 0,
        }
    }

    pub fn id(&self) -> Option<PostId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn update_field(&self, field: PostField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.revision += 1;
        match field {
            PostField::Name => next.name = value.into(),
            PostField::Email => next.email = value.into(),
        }
        next
    }

    pub fn submit(&self) -> Post {
        Post {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

impl Draft for PostDraft {
    type Resource = Post;

    fn blank() -> Self {
        Self::new()
    }

    fn from_resource(resource: &Post) -> Self {
        Self::from_post(resource)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn finalize(&self) -> Post {
        self.submit()
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
