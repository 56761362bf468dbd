//! Database models for locations.

use super::{Country, Entity, merge, related};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, Join, TableAlias, aliases, tables};
use crate::types::{CountryId, LocationId};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Location",
    table: &tables::LOCATION,
    joins: &[Join {
        alias: aliases::COUNTRY,
        target: &tables::COUNTRY,
        foreign_key: "country_id",
    }],
    links: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: Option<LocationId>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub country_id: Option<CountryId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationPatch {
    #[serde(default)]
    pub id: Option<LocationId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub street_address: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub postal_code: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub state_province: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub country_id: Option<Option<CountryId>>,
}

impl Entity for Location {
    type Relations = LocationRelations;
    type Patch = LocationPatch;

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
            street_address: convert(row, alias.column("street_address"))?,
            postal_code: convert(row, alias.column("postal_code"))?,
            city: convert(row, alias.column("city"))?,
            state_province: convert(row, alias.column("state_province"))?,
            country_id: convert(row, alias.column("country_id"))?,
        })
    }

    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(LocationRelations {
            country: related(row, aliases::COUNTRY)?,
        })
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("street_address", String::to_value(self.street_address.as_ref())),
            ("postal_code", String::to_value(self.postal_code.as_ref())),
            ("city", String::to_value(self.city.as_ref())),
            ("state_province", String::to_value(self.state_province.as_ref())),
            ("country_id", i64::to_value(self.country_id.as_ref())),
        ]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.street_address, patch.street_address);
        merge(&mut self.postal_code, patch.postal_code);
        merge(&mut self.city, patch.city);
        merge(&mut self.state_province, patch.state_province);
        merge(&mut self.country_id, patch.country_id);
    }
}
