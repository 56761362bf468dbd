//! Database models for tasks.

use super::{Entity, NoRelations, merge};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, TableAlias, tables};
use crate::types::TaskId;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Task",
    table: &tables::TASK,
    joins: &[],
    links: &[],
};

/// A task. Tasks do not know which jobs reference them; the association is owned by
/// [`super::Job`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: Option<TaskId>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description: Option<Option<String>>,
}

impl Entity for Task {
    type Relations = NoRelations;
    type Patch = TaskPatch;

    const SCHEMA: &'static EntitySchema = &SCHEMA;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_row(row: &impl RowAccess, alias: TableAlias) -> Result<Self> {
        Ok(Self {
            id: convert(row, alias.column(ID))?,
            title: convert(row, alias.column("title"))?,
            description: convert(row, alias.column("description"))?,
        })
    }

    fn relations_from_row(_row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(NoRelations {})
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("title", String::to_value(self.title.as_ref())),
            ("description", String::to_value(self.description.as_ref())),
        ]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.title, patch.title);
        merge(&mut self.description, patch.description);
    }
}
