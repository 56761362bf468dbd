//! Entity records for the HR schema.
//!
//! Each entity is a plain value type with an optional surrogate identifier (`None` until the
//! store assigns one on insert) and optional scalar fields. Foreign keys are scalar fields such
//! as `region_id`; related objects are never embedded in the entity itself. A joined fetch
//! returns them next to the entity in [`Loaded::relations`].
//!
//! # The [`Entity`] trait
//!
//! The generic repository, query builder and link table manager work off [`Entity`]:
//!
//! - [`Entity::SCHEMA`]: static table, join and link descriptors
//! - [`Entity::from_row`]: the row mapper, reading `<alias>_<column>` labels
//! - [`Entity::relations_from_row`]: maps the joined aliases of the same row
//! - [`Entity::column_values`]: values written on insert and update
//! - [`Entity::apply_patch`]: partial update merge
//!
//! # Entities
//!
//! - [`regions`], [`countries`], [`locations`], [`departments`]: the location hierarchy
//! - [`employees`]: employees, with a self-referencing manager
//! - [`jobs`], [`tasks`]: jobs and their many-to-many tasks
//! - [`job_histories`]: job history records referencing job, department and employee

use crate::db::errors::Result;
use crate::db::row::{RowAccess, Value};
use crate::db::schema::{EntitySchema, LinkTable, TableAlias};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub mod countries;
pub mod departments;
pub mod employees;
pub mod job_histories;
pub mod jobs;
pub mod locations;
pub mod regions;
pub mod tasks;

pub use countries::{Country, CountryPatch, CountryRelations};
pub use departments::{Department, DepartmentPatch, DepartmentRelations};
pub use employees::{Employee, EmployeePatch, EmployeeRelations};
pub use job_histories::{JobHistory, JobHistoryPatch, JobHistoryRelations};
pub use jobs::{Job, JobPatch, JobRelations};
pub use locations::{Location, LocationPatch, LocationRelations};
pub use regions::{Region, RegionPatch};
pub use tasks::{Task, TaskPatch};

/// Behaviour shared by every persisted entity kind.
pub trait Entity: Clone + fmt::Debug + Serialize + Send + Sync + Unpin + 'static {
    /// Objects loaded through the joins of [`Entity::SCHEMA`].
    type Relations: Clone + fmt::Debug + Default + Serialize + Send + Sync + Unpin + 'static;

    /// Partial update payload: every field optional, absent fields left untouched.
    type Patch: fmt::Debug + DeserializeOwned + Send + Sync + 'static;

    const SCHEMA: &'static EntitySchema;

    fn id(&self) -> Option<i64>;

    /// Record the identifier assigned by the store. Only the repository calls this.
    fn set_id(&mut self, id: i64);

    /// Map the columns of `alias` in `row` onto a new entity, foreign keys included.
    fn from_row(row: &impl RowAccess, alias: TableAlias) -> Result<Self>;

    /// Map the joined aliases of `row` onto relation objects.
    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations>;

    /// `(column, value)` for every non-id column of the table.
    fn column_values(&self) -> Vec<(&'static str, Value)>;

    /// Target ids of a many-to-many association held in memory.
    fn linked_ids(&self, _link: &LinkTable) -> Option<&BTreeSet<i64>> {
        None
    }

    fn set_linked_ids(&mut self, _link: &LinkTable, _ids: BTreeSet<i64>) {}

    /// Identifier carried by a patch body.
    fn patch_id(patch: &Self::Patch) -> Option<i64>;

    /// Overwrite the fields present in `patch`, keep everything else.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Field rules checked before every write. The message is returned to API clients.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Identity comparison: both identifiers assigned and equal.
    fn same_entity(&self, other: &Self) -> bool {
        matches!((self.id(), other.id()), (Some(a), Some(b)) if a == b)
    }
}

/// An entity together with the relation objects its joined fetch produced.
#[derive(Debug, Clone, Serialize)]
pub struct Loaded<E: Entity> {
    #[serde(flatten)]
    pub entity: E,
    #[serde(flatten)]
    pub relations: E::Relations,
}

impl<E: Entity> Loaded<E> {
    pub fn new(entity: E, relations: E::Relations) -> Self {
        Self { entity, relations }
    }

    pub fn into_entity(self) -> E {
        self.entity
    }
}

/// Relations of an entity kind that joins nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoRelations {}

/// Map the entity under `alias`, or `None` when the left join found no row.
pub fn related<R: Entity>(row: &impl RowAccess, alias: TableAlias) -> Result<Option<R>> {
    let entity = R::from_row(row, alias)?;
    Ok(entity.id().is_some().then_some(entity))
}

/// Apply one double-option patch field: absent keeps the value, `Some(v)` replaces it.
pub(crate) fn merge<T>(field: &mut Option<T>, patch: Option<Option<T>>) {
    if let Some(value) = patch {
        *field = value;
    }
}

/// Language of a job history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    French,
    English,
    Spanish,
}

impl Language {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Language::French => "FRENCH",
            Language::English => "ENGLISH",
            Language::Spanish => "SPANISH",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "FRENCH" => Ok(Language::French),
            "ENGLISH" => Ok(Language::English),
            "SPANISH" => Ok(Language::Spanish),
            other => Err(format!("'{other}' is not a language (FRENCH, ENGLISH, SPANISH)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_distinguishes_absent_from_cleared() {
        let mut name = Some("Sales".to_string());
        merge(&mut name, None);
        assert_eq!(name.as_deref(), Some("Sales"));

        merge(&mut name, Some(Some("Marketing".to_string())));
        assert_eq!(name.as_deref(), Some("Marketing"));

        merge(&mut name, Some(None));
        assert_eq!(name, None);
    }

    #[test]
    fn language_round_trips_through_text() {
        for language in [Language::French, Language::English, Language::Spanish] {
            assert_eq!(language.as_str().parse::<Language>().unwrap(), language);
        }
        assert!("french".parse::<Language>().is_err());
        assert_eq!(serde_json::to_string(&Language::English).unwrap(), "\"ENGLISH\"");
    }

    #[test]
    fn entities_without_ids_are_never_the_same() {
        let a = Region::default();
        let b = Region::default();
        assert!(!a.same_entity(&b));
        assert!(!a.same_entity(&a));

        let mut c = Region::default();
        c.set_id(3);
        let mut d = Region {
            region_name: Some("Other name".into()),
            ..Default::default()
        };
        d.set_id(3);
        assert!(c.same_entity(&d));
    }
}
