//! Database models for departments.

use super::{Entity, Location, merge, related};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, Join, TableAlias, aliases, tables};
use crate::types::{DepartmentId, LocationId};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Department",
    table: &tables::DEPARTMENT,
    joins: &[Join {
        alias: aliases::LOCATION,
        target: &tables::LOCATION,
        foreign_key: "location_id",
    }],
    links: &[],
};

/// A department. `department_name` is required by the API but nullable in storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(default)]
    pub id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub location_id: Option<LocationId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DepartmentRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentPatch {
    #[serde(default)]
    pub id: Option<DepartmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub department_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub location_id: Option<Option<LocationId>>,
}

impl Entity for Department {
    type Relations = DepartmentRelations;
    type Patch = DepartmentPatch;

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
            department_name: convert(row, alias.column("department_name"))?,
            location_id: convert(row, alias.column("location_id"))?,
        })
    }

    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(DepartmentRelations {
            location: related(row, aliases::LOCATION)?,
        })
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("department_name", String::to_value(self.department_name.as_ref())),
            ("location_id", i64::to_value(self.location_id.as_ref())),
        ]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.department_name, patch.department_name);
        merge(&mut self.location_id, patch.location_id);
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self.department_name {
            Some(_) => Ok(()),
            None => Err("department_name is required".to_string()),
        }
    }
}
