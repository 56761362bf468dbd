//! Join assembly for entity reads.
//!
//! Every read of an entity goes through one SELECT that left-joins all of the entity's to-one
//! relations, labelling each column `<alias>_<column>` so the row mappers can tell the primary
//! entity apart from a joined copy of the same table:
//!
//! ```text
//! SELECT e.id AS e_id, e.first_name AS e_first_name, ..., manager.id AS manager_id, ...
//! FROM employee e
//! LEFT OUTER JOIN employee manager ON e.manager_id = manager.id
//! LEFT OUTER JOIN department department ON e.department_id = department.id
//! WHERE e.department_id = $1
//! ORDER BY e.last_name ASC, e.id ASC LIMIT $2 OFFSET $3
//! ```
//!
//! Filters only ever address the primary entity's own columns. Column names arriving from
//! callers are resolved against the static [`TableSchema`](crate::db::schema::TableSchema)
//! first, so only descriptor names reach the SQL text and every value is a bound parameter.

use crate::db::errors::{DbError, Result};
use crate::db::row::Value;
use crate::db::schema::{ColumnDef, ColumnType, EntitySchema, ID, LinkTable, aliases};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

/// One conjunct of a [`Criteria`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `e.<column> = value`. A NULL value is treated as [`Condition::IsNull`].
    Equals { column: String, value: Value },
    IsNull { column: String },
    IsNotNull { column: String },
    /// The entity is the owner of a link row pointing at `target`.
    LinkedTo { link: &'static LinkTable, target: i64 },
}

/// Conjunctive filter over the primary entity's columns. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    conditions: Vec<Condition>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.conditions.push(Condition::Equals {
            column: column.into(),
            value,
        });
        self
    }

    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull { column: column.into() });
        self
    }

    pub fn is_not_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNotNull { column: column.into() });
        self
    }

    pub fn linked_to(mut self, link: &'static LinkTable, target: i64) -> Self {
        self.conditions.push(Condition::LinkedTo { link, target });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub column: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Offset pagination with an optional sort. Paged reads are always totally ordered: `e.id` is
/// appended to the sort unless it is already part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
    pub sort: Vec<SortOrder>,
}

impl PageRequest {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            sort: Vec::new(),
        }
    }

    /// Zero-based page `number` of `size` rows.
    pub fn page(number: i64, size: i64) -> Self {
        Self::new(number.saturating_mul(size), size)
    }

    pub fn sorted_by(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }
}

/// Build the joined SELECT for `schema`, filtered by `criteria` and optionally paged.
pub fn select(schema: &EntitySchema, criteria: &Criteria, page: Option<&PageRequest>) -> Result<QueryBuilder<'static, Postgres>> {
    let e = aliases::ENTITY;
    let mut query = QueryBuilder::new("SELECT ");

    let mut first = true;
    for column in schema.table.column_names() {
        if !first {
            query.push(", ");
        }
        first = false;
        query.push(format_args!("{e}.{column} AS {}", e.column(column)));
    }
    for join in schema.joins {
        for column in join.target.column_names() {
            query.push(format_args!(", {alias}.{column} AS {}", join.alias.column(column), alias = join.alias));
        }
    }

    query.push(format_args!(" FROM {} {e}", schema.table.table));
    for join in schema.joins {
        query.push(format_args!(
            " LEFT OUTER JOIN {target} {alias} ON {e}.{fk} = {alias}.{ID}",
            target = join.target.table,
            alias = join.alias,
            fk = join.foreign_key,
        ));
    }

    push_where(&mut query, schema, criteria)?;

    if let Some(page) = page {
        push_order_by(&mut query, schema, &page.sort)?;
        query.push(" LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);
    }

    Ok(query)
}

/// Build `SELECT COUNT(*)` over the primary table with the same filter semantics as [`select`].
pub fn count(schema: &EntitySchema, criteria: &Criteria) -> Result<QueryBuilder<'static, Postgres>> {
    let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} {}", schema.table.table, aliases::ENTITY));
    push_where(&mut query, schema, criteria)?;
    Ok(query)
}

/// Bind a column value with the SQL type it is stored as.
pub(crate) fn push_value(query: &mut QueryBuilder<'static, Postgres>, value: Value) {
    match value {
        Value::BigInt(v) => query.push_bind(v),
        Value::Text(v) => query.push_bind(v),
        Value::Timestamp(v) => query.push_bind(v),
    };
}

fn resolve(schema: &EntitySchema, column: &str) -> Result<ColumnDef> {
    schema.table.column(column).ok_or_else(|| DbError::InvalidColumn {
        table: schema.table.table,
        column: column.to_string(),
    })
}

fn accepts(ty: ColumnType, value: &Value) -> bool {
    matches!(
        (ty, value),
        (ColumnType::BigInt, Value::BigInt(_))
            | (ColumnType::Text | ColumnType::Language, Value::Text(_))
            | (ColumnType::Timestamp, Value::Timestamp(_))
    )
}

fn push_where(query: &mut QueryBuilder<'static, Postgres>, schema: &EntitySchema, criteria: &Criteria) -> Result<()> {
    let e = aliases::ENTITY;

    for (i, condition) in criteria.conditions().iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        match condition {
            Condition::Equals { column, value } => {
                let def = resolve(schema, column)?;
                if !accepts(def.ty, value) {
                    return Err(DbError::ColumnMismatch {
                        column: column.clone(),
                        expected: def.ty.name(),
                    });
                }
                if value.is_null() {
                    query.push(format_args!("{e}.{} IS NULL", def.name));
                } else {
                    query.push(format_args!("{e}.{} = ", def.name));
                    push_value(query, value.clone());
                }
            }
            Condition::IsNull { column } => {
                let def = resolve(schema, column)?;
                query.push(format_args!("{e}.{} IS NULL", def.name));
            }
            Condition::IsNotNull { column } => {
                let def = resolve(schema, column)?;
                query.push(format_args!("{e}.{} IS NOT NULL", def.name));
            }
            Condition::LinkedTo { link, target } => {
                if !schema.links.iter().any(|candidate| *candidate == *link) {
                    return Err(DbError::InvalidColumn {
                        table: schema.table.table,
                        column: link.table.to_string(),
                    });
                }
                query.push(format_args!(
                    "{e}.{ID} IN (SELECT {owner} FROM {table} WHERE {target_column} = ",
                    owner = link.owner_column,
                    table = link.table,
                    target_column = link.target_column,
                ));
                query.push_bind(*target);
                query.push(")");
            }
        }
    }

    Ok(())
}

fn push_order_by(query: &mut QueryBuilder<'static, Postgres>, schema: &EntitySchema, sort: &[SortOrder]) -> Result<()> {
    let e = aliases::ENTITY;
    let mut clauses = Vec::with_capacity(sort.len() + 1);
    let mut has_id = false;

    for order in sort {
        let def = resolve(schema, &order.column)?;
        has_id |= def.name == ID;
        clauses.push(format!("{e}.{} {}", def.name, order.direction.as_sql()));
    }
    if !has_id {
        clauses.push(format!("{e}.{ID} ASC"));
    }

    query.push(" ORDER BY ").push(clauses.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Employee, Entity, Job, Region};
    use crate::db::schema::JOB_TASKS;

    #[test]
    fn plain_table_select() {
        let query = select(Region::SCHEMA, &Criteria::new(), None).unwrap();
        assert_eq!(query.sql(), "SELECT e.id AS e_id, e.region_name AS e_region_name FROM region e");
    }

    #[test]
    fn employee_self_join_uses_distinct_aliases() {
        let query = select(Employee::SCHEMA, &Criteria::new(), None).unwrap();
        let sql = query.sql();

        assert!(sql.starts_with("SELECT e.id AS e_id, e.first_name AS e_first_name"));
        assert!(sql.contains("manager.id AS manager_id, manager.first_name AS manager_first_name"));
        assert!(sql.contains("department.department_name AS department_department_name"));
        assert!(sql.contains(
            " FROM employee e LEFT OUTER JOIN employee manager ON e.manager_id = manager.id \
             LEFT OUTER JOIN department department ON e.department_id = department.id"
        ));
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn criteria_filter_primary_columns_with_binds() {
        let criteria = Criteria::new()
            .eq("department_id", Value::BigInt(Some(3)))
            .is_null("manager_id")
            .eq("email", Value::Text(None));
        let query = select(Employee::SCHEMA, &criteria, None).unwrap();

        assert!(
            query
                .sql()
                .ends_with(" WHERE e.department_id = $1 AND e.manager_id IS NULL AND e.email IS NULL")
        );
    }

    #[test]
    fn paging_appends_identifier_tie_break() {
        let page = PageRequest::page(2, 20).sorted_by(SortOrder::desc("region_name"));
        let query = select(Region::SCHEMA, &Criteria::new(), Some(&page)).unwrap();
        assert!(
            query
                .sql()
                .ends_with(" FROM region e ORDER BY e.region_name DESC, e.id ASC LIMIT $1 OFFSET $2")
        );

        let unsorted = select(Region::SCHEMA, &Criteria::new(), Some(&PageRequest::new(0, 5))).unwrap();
        assert!(unsorted.sql().ends_with(" ORDER BY e.id ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn explicit_id_sort_is_not_duplicated() {
        let page = PageRequest::new(0, 10).sorted_by(SortOrder::desc("id"));
        let query = select(Region::SCHEMA, &Criteria::new(), Some(&page)).unwrap();
        assert!(query.sql().ends_with(" ORDER BY e.id DESC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn page_number_becomes_offset() {
        let page = PageRequest::page(3, 25);
        assert_eq!(page.offset, 75);
        assert_eq!(page.limit, 25);
    }

    #[test]
    fn joined_columns_are_not_filterable() {
        let criteria = Criteria::new().eq("region_name", Value::Text(Some("Europe".into())));
        let Err(err) = select(crate::db::models::Country::SCHEMA, &criteria, None) else {
            panic!("expected InvalidColumn");
        };
        assert!(matches!(err, DbError::InvalidColumn { table: "country", .. }));

        let page = PageRequest::new(0, 10).sorted_by(SortOrder::asc("region_name"));
        assert!(select(crate::db::models::Country::SCHEMA, &Criteria::new(), Some(&page)).is_err());
    }

    #[test]
    fn filter_value_must_match_column_type() {
        let criteria = Criteria::new().eq("salary", Value::Text(Some("lots".into())));
        assert!(matches!(
            select(Employee::SCHEMA, &criteria, None),
            Err(DbError::ColumnMismatch { expected: "bigint", .. })
        ));
    }

    #[test]
    fn linked_to_filters_through_the_link_table() {
        let query = select(Job::SCHEMA, &Criteria::new().linked_to(&JOB_TASKS, 100), None).unwrap();
        assert!(
            query
                .sql()
                .ends_with(" WHERE e.id IN (SELECT job_id FROM rel_job__task WHERE task_id = $1)")
        );

        assert!(select(Employee::SCHEMA, &Criteria::new().linked_to(&JOB_TASKS, 100), None).is_err());
    }

    #[test]
    fn count_uses_primary_table_only() {
        let query = count(Employee::SCHEMA, &Criteria::new().is_not_null("manager_id")).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM employee e WHERE e.manager_id IS NOT NULL"
        );
    }
}
