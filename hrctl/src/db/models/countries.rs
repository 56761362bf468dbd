//! Database models for countries.

use super::{Entity, Region, merge, related};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, Join, TableAlias, aliases, tables};
use crate::types::{CountryId, RegionId};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Country",
    table: &tables::COUNTRY,
    joins: &[Join {
        alias: aliases::REGION,
        target: &tables::REGION,
        foreign_key: "region_id",
    }],
    links: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(default)]
    pub id: Option<CountryId>,
    pub country_name: Option<String>,
    pub region_id: Option<RegionId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CountryRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryPatch {
    #[serde(default)]
    pub id: Option<CountryId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub country_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub region_id: Option<Option<RegionId>>,
}

impl Entity for Country {
    type Relations = CountryRelations;
    type Patch = CountryPatch;

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
            country_name: convert(row, alias.column("country_name"))?,
            region_id: convert(row, alias.column("region_id"))?,
        })
    }

    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(CountryRelations {
            region: related(row, aliases::REGION)?,
        })
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("country_name", String::to_value(self.country_name.as_ref())),
            ("region_id", i64::to_value(self.region_id.as_ref())),
        ]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.country_name, patch.country_name);
        merge(&mut self.region_id, patch.region_id);
    }
}
