//! Static table descriptors driving query assembly and row mapping.
//!
//! Every entity kind is described once: its table and columns ([`TableSchema`]), the to-one
//! relations joined on every read ([`Join`]), and the link tables holding its many-to-many
//! associations ([`LinkTable`]). The query builder, the row mappers and the link table manager
//! are all generic over these descriptors, so no entity carries its own SQL.

use std::fmt;

/// Name under which a table appears in a joined SELECT.
///
/// Selected columns are labelled `<alias>_<column>`, which lets one result row carry the same
/// table twice (an employee and their manager) without collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableAlias(&'static str);

impl TableAlias {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Typed key of one of this alias' columns in a result row.
    pub const fn column(self, column: &'static str) -> ColumnKey {
        ColumnKey { alias: self, column }
    }
}

impl fmt::Display for TableAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Aliases used by the joined SELECTs.
pub mod aliases {
    use super::TableAlias;

    /// The primary entity of every query.
    pub const ENTITY: TableAlias = TableAlias::new("e");
    pub const REGION: TableAlias = TableAlias::new("region");
    pub const COUNTRY: TableAlias = TableAlias::new("country");
    pub const LOCATION: TableAlias = TableAlias::new("location");
    pub const DEPARTMENT: TableAlias = TableAlias::new("department");
    pub const MANAGER: TableAlias = TableAlias::new("manager");
    pub const EMPLOYEE: TableAlias = TableAlias::new("employee");
    pub const JOB: TableAlias = TableAlias::new("job");
}

/// Column of an aliased table inside a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub alias: TableAlias,
    pub column: &'static str,
}

impl ColumnKey {
    /// Label the column carries in the result set (`<alias>_<column>`).
    pub fn label(&self) -> String {
        format!("{}_{}", self.alias, self.column)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.alias, self.column)
    }
}

/// Semantic type of a stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Text,
    Timestamp,
    /// Text column restricted to the [`crate::db::models::Language`] values.
    Language,
}

impl ColumnType {
    pub const fn name(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "bigint",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Language => "language",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// Primary key column shared by every entity table.
pub const ID: &str = "id";

/// A persisted table. `columns` excludes the `id` primary key, which every table has.
#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    /// Look up a column by name, including the implicit `id`.
    pub fn column(&self, name: &str) -> Option<ColumnDef> {
        if name == ID {
            return Some(ColumnDef::new(ID, ColumnType::BigInt));
        }
        self.columns.iter().find(|c| c.name == name).copied()
    }

    /// All column names in select order, `id` first.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(ID).chain(self.columns.iter().map(|c| c.name))
    }
}

/// A to-one relation left-joined on every read: `LEFT OUTER JOIN <target> <alias> ON
/// e.<foreign_key> = <alias>.id`.
#[derive(Debug)]
pub struct Join {
    pub alias: TableAlias,
    pub target: &'static TableSchema,
    pub foreign_key: &'static str,
}

/// Association table of a many-to-many relation, holding `(owner, target)` pairs only.
#[derive(Debug, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
}

/// Everything the generic components need to know about one entity kind.
#[derive(Debug)]
pub struct EntitySchema {
    /// Human readable name used in logs and errors ("Job", "JobHistory").
    pub name: &'static str,
    pub table: &'static TableSchema,
    pub joins: &'static [Join],
    pub links: &'static [&'static LinkTable],
}

pub mod tables {
    use super::ColumnDef;
    use super::ColumnType::{BigInt, Language, Text, Timestamp};
    use super::TableSchema;

    pub static REGION: TableSchema = TableSchema {
        table: "region",
        columns: &[ColumnDef::new("region_name", Text)],
    };

    pub static COUNTRY: TableSchema = TableSchema {
        table: "country",
        columns: &[ColumnDef::new("country_name", Text), ColumnDef::new("region_id", BigInt)],
    };

    pub static LOCATION: TableSchema = TableSchema {
        table: "location",
        columns: &[
            ColumnDef::new("street_address", Text),
            ColumnDef::new("postal_code", Text),
            ColumnDef::new("city", Text),
            ColumnDef::new("state_province", Text),
            ColumnDef::new("country_id", BigInt),
        ],
    };

    pub static DEPARTMENT: TableSchema = TableSchema {
        table: "department",
        columns: &[ColumnDef::new("department_name", Text), ColumnDef::new("location_id", BigInt)],
    };

    pub static EMPLOYEE: TableSchema = TableSchema {
        table: "employee",
        columns: &[
            ColumnDef::new("first_name", Text),
            ColumnDef::new("last_name", Text),
            ColumnDef::new("email", Text),
            ColumnDef::new("phone_number", Text),
            ColumnDef::new("hire_date", Timestamp),
            ColumnDef::new("salary", BigInt),
            ColumnDef::new("commission_pct", BigInt),
            ColumnDef::new("manager_id", BigInt),
            ColumnDef::new("department_id", BigInt),
        ],
    };

    pub static JOB: TableSchema = TableSchema {
        table: "job",
        columns: &[
            ColumnDef::new("job_title", Text),
            ColumnDef::new("min_salary", BigInt),
            ColumnDef::new("max_salary", BigInt),
            ColumnDef::new("employee_id", BigInt),
        ],
    };

    pub static TASK: TableSchema = TableSchema {
        table: "task",
        columns: &[ColumnDef::new("title", Text), ColumnDef::new("description", Text)],
    };

    pub static JOB_HISTORY: TableSchema = TableSchema {
        table: "job_history",
        columns: &[
            ColumnDef::new("start_date", Timestamp),
            ColumnDef::new("end_date", Timestamp),
            ColumnDef::new("language", Language),
            ColumnDef::new("job_id", BigInt),
            ColumnDef::new("department_id", BigInt),
            ColumnDef::new("employee_id", BigInt),
        ],
    };
}

/// Job <-> Task association.
pub static JOB_TASKS: LinkTable = LinkTable {
    table: "rel_job__task",
    owner_column: "job_id",
    target_column: "task_id",
};
