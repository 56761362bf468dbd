//! Query string parsing for list endpoints.
//!
//! Besides `page`, `size` and `sort` (see [`super::pagination`]), a list request may filter on
//! the entity's own columns:
//!
//! - `<column>.equals=<value>`: the value is parsed with the column's type
//! - `<column>.specified=<true|false>`: the column is (not) NULL
//!
//! For an entity with a link table, `<target column>.equals=<id>` (e.g. `task_id.equals=4` on
//! jobs) selects the owners linked to that target. Parameters without a recognised suffix are
//! ignored.

use super::pagination::{PageParams, parse_sort};
use crate::db::query::Criteria;
use crate::db::row::Value;
use crate::db::schema::EntitySchema;
use crate::errors::{Error, Result};

/// Everything a list request asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: PageParams,
    pub criteria: Criteria,
}

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest { message: message.into() }
}

fn parse_number(key: &str, raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| bad_request(format!("'{key}' must be an integer")))
}

impl ListQuery {
    pub fn parse(schema: &'static EntitySchema, pairs: &[(String, String)]) -> Result<Self> {
        let mut query = ListQuery::default();

        for (key, raw) in pairs {
            match key.as_str() {
                "page" => query.page.page = Some(parse_number(key, raw)?),
                "size" => query.page.size = Some(parse_number(key, raw)?),
                "sort" => query.page.sort.push(parse_sort(raw).map_err(bad_request)?),
                _ => {
                    if let Some(column) = key.strip_suffix(".equals") {
                        query.criteria = equals(schema, query.criteria, column, raw)?;
                    } else if let Some(column) = key.strip_suffix(".specified") {
                        query.criteria = specified(schema, query.criteria, column, raw)?;
                    }
                }
            }
        }

        Ok(query)
    }
}

fn unknown_column(schema: &EntitySchema, column: &str) -> Error {
    bad_request(format!("Unknown field '{column}' for {}", schema.name))
}

fn equals(schema: &'static EntitySchema, criteria: Criteria, column: &str, raw: &str) -> Result<Criteria> {
    if let Some(def) = schema.table.column(column) {
        let value = Value::parse(def.ty, raw).map_err(|e| bad_request(format!("Invalid value for '{column}': {e}")))?;
        return Ok(criteria.eq(def.name, value));
    }

    if let Some(link) = schema.links.iter().find(|link| link.target_column == column) {
        return Ok(criteria.linked_to(*link, parse_number(column, raw)?));
    }

    Err(unknown_column(schema, column))
}

fn specified(schema: &EntitySchema, criteria: Criteria, column: &str, raw: &str) -> Result<Criteria> {
    let def = schema.table.column(column).ok_or_else(|| unknown_column(schema, column))?;

    match raw {
        "true" => Ok(criteria.is_not_null(def.name)),
        "false" => Ok(criteria.is_null(def.name)),
        _ => Err(bad_request(format!("'{column}.specified' must be true or false"))),
    }
}
