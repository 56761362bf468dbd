//! Database models for regions.

use super::{Entity, NoRelations, merge};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, TableAlias, tables};
use crate::types::RegionId;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Region",
    table: &tables::REGION,
    joins: &[],
    links: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub id: Option<RegionId>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionPatch {
    #[serde(default)]
    pub id: Option<RegionId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub region_name: Option<Option<String>>,
}

impl Entity for Region {
    type Relations = NoRelations;
    type Patch = RegionPatch;

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
            region_name: convert(row, alias.column("region_name"))?,
        })
    }

    fn relations_from_row(_row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(NoRelations {})
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![("region_name", String::to_value(self.region_name.as_ref()))]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.region_name, patch.region_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row::MemoryRow;
    use crate::db::schema::aliases;

    #[test]
    fn maps_prefixed_columns() {
        let row = MemoryRow::new()
            .with(aliases::REGION.column("id"), Value::BigInt(Some(1)))
            .with(aliases::REGION.column("region_name"), Value::Text(Some("Europe".into())));

        let region = Region::from_row(&row, aliases::REGION).unwrap();
        assert_eq!(region.id, Some(1));
        assert_eq!(region.region_name.as_deref(), Some("Europe"));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut region = Region {
            id: Some(1),
            region_name: Some("Europe".into()),
        };
        region.apply_patch(serde_json::from_str(r#"{"id": 1}"#).unwrap());
        assert_eq!(region.region_name.as_deref(), Some("Europe"));

        region.apply_patch(serde_json::from_str(r#"{"id": 1, "region_name": null}"#).unwrap());
        assert_eq!(region.region_name, None);
    }
}
