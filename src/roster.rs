//! Per-role allow-lists of external IDs that may sign up.

use std::collections::HashSet;

use crate::db::Role;

/// Built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: HashSet<String>,
    lecturers: HashSet<String>,
}

impl Roster {
    pub fn new<S, L>(students: S, lecturers: L) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            students: normalize(students),
            lecturers: normalize(lecturers),
        }
    }

    /// Whether `external_id` may sign up with `role`.
    pub fn allows(&self, role: Role, external_id: &str) -> bool {
        self.ids(role).contains(external_id)
    }

    pub fn ids(&self, role: Role) -> &HashSet<String> {
        match role {
            Role::Student => &self.students,
            Role::Lecturer => &self.lecturers,
        }
    }

    /// IDs listed under both roles. Such an ID can only ever be claimed once.
    pub fn overlap(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .students
            .intersection(&self.lecturers)
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids
    }
}

fn normalize<I>(ids: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    ids.into_iter()
        .map(Into::into)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}
