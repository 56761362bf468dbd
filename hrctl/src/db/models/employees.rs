//! Database models for employees.
//!
//! An employee may reference another employee as its manager. The joined SELECT reads the same
//! `employee` table twice, once as the primary entity (`e`) and once as `manager`, so the
//! manager object is mapped with the employee mapper under the manager alias.

use super::{Department, Entity, merge, related};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, Join, TableAlias, aliases, tables};
use crate::types::{DepartmentId, EmployeeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Employee",
    table: &tables::EMPLOYEE,
    joins: &[
        Join {
            alias: aliases::MANAGER,
            target: &tables::EMPLOYEE,
            foreign_key: "manager_id",
        },
        Join {
            alias: aliases::DEPARTMENT,
            target: &tables::DEPARTMENT,
            foreign_key: "department_id",
        },
    ],
    links: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: Option<EmployeeId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
    pub salary: Option<i64>,
    pub commission_pct: Option<i64>,
    pub manager_id: Option<EmployeeId>,
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployeeRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<Employee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeePatch {
    #[serde(default)]
    pub id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub hire_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub salary: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub commission_pct: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub manager_id: Option<Option<EmployeeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub department_id: Option<Option<DepartmentId>>,
}

impl Entity for Employee {
    type Relations = EmployeeRelations;
    type Patch = EmployeePatch;

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
            first_name: convert(row, alias.column("first_name"))?,
            last_name: convert(row, alias.column("last_name"))?,
            email: convert(row, alias.column("email"))?,
            phone_number: convert(row, alias.column("phone_number"))?,
            hire_date: convert(row, alias.column("hire_date"))?,
            salary: convert(row, alias.column("salary"))?,
            commission_pct: convert(row, alias.column("commission_pct"))?,
            manager_id: convert(row, alias.column("manager_id"))?,
            department_id: convert(row, alias.column("department_id"))?,
        })
    }

    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(EmployeeRelations {
            manager: related(row, aliases::MANAGER)?,
            department: related(row, aliases::DEPARTMENT)?,
        })
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("first_name", String::to_value(self.first_name.as_ref())),
            ("last_name", String::to_value(self.last_name.as_ref())),
            ("email", String::to_value(self.email.as_ref())),
            ("phone_number", String::to_value(self.phone_number.as_ref())),
            ("hire_date", DateTime::<Utc>::to_value(self.hire_date.as_ref())),
            ("salary", i64::to_value(self.salary.as_ref())),
            ("commission_pct", i64::to_value(self.commission_pct.as_ref())),
            ("manager_id", i64::to_value(self.manager_id.as_ref())),
            ("department_id", i64::to_value(self.department_id.as_ref())),
        ]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.first_name, patch.first_name);
        merge(&mut self.last_name, patch.last_name);
        merge(&mut self.email, patch.email);
        merge(&mut self.phone_number, patch.phone_number);
        merge(&mut self.hire_date, patch.hire_date);
        merge(&mut self.salary, patch.salary);
        merge(&mut self.commission_pct, patch.commission_pct);
        merge(&mut self.manager_id, patch.manager_id);
        merge(&mut self.department_id, patch.department_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row::MemoryRow;
    use chrono::TimeZone;

    fn employee_columns(row: MemoryRow, alias: TableAlias, id: Option<i64>, first: &str, manager_id: Option<i64>) -> MemoryRow {
        row.with(alias.column("id"), Value::BigInt(id))
            .with(alias.column("first_name"), Value::Text(id.map(|_| first.to_string())))
            .with(alias.column("last_name"), Value::Text(None))
            .with(alias.column("email"), Value::Text(None))
            .with(alias.column("phone_number"), Value::Text(None))
            .with(alias.column("hire_date"), Value::Timestamp(None))
            .with(alias.column("salary"), Value::BigInt(None))
            .with(alias.column("commission_pct"), Value::BigInt(None))
            .with(alias.column("manager_id"), Value::BigInt(manager_id))
            .with(alias.column("department_id"), Value::BigInt(None))
    }

    fn no_department(row: MemoryRow) -> MemoryRow {
        row.with(aliases::DEPARTMENT.column("id"), Value::BigInt(None))
            .with(aliases::DEPARTMENT.column("department_name"), Value::Text(None))
            .with(aliases::DEPARTMENT.column("location_id"), Value::BigInt(None))
    }

    #[test]
    fn self_join_maps_manager_under_its_own_alias() {
        let row = employee_columns(MemoryRow::new(), aliases::ENTITY, Some(2), "Grace", Some(1));
        let row = employee_columns(row, aliases::MANAGER, Some(1), "Ada", None);
        let row = no_department(row);

        let employee = Employee::from_row(&row, aliases::ENTITY).unwrap();
        assert_eq!(employee.id, Some(2));
        assert_eq!(employee.first_name.as_deref(), Some("Grace"));
        assert_eq!(employee.manager_id, Some(1));

        let relations = Employee::relations_from_row(&row).unwrap();
        let manager = relations.manager.expect("manager should be loaded");
        assert_eq!(manager.id, Some(1));
        assert_eq!(manager.first_name.as_deref(), Some("Ada"));
        assert!(relations.department.is_none());
    }

    #[test]
    fn employee_without_manager_has_no_manager_relation() {
        let row = employee_columns(MemoryRow::new(), aliases::ENTITY, Some(1), "Ada", None);
        let row = employee_columns(row, aliases::MANAGER, None, "", None);
        let row = no_department(row);

        let relations = Employee::relations_from_row(&row).unwrap();
        assert!(relations.manager.is_none());
    }

    #[test]
    fn column_values_cover_every_non_id_column() {
        let employee = Employee {
            hire_date: Some(Utc.with_ymd_and_hms(2019, 6, 1, 9, 0, 0).unwrap()),
            salary: Some(50_000),
            ..Default::default()
        };
        let columns: Vec<_> = employee.column_values().into_iter().map(|(c, _)| c).collect();
        let declared: Vec<_> = tables::EMPLOYEE.columns.iter().map(|c| c.name).collect();
        assert_eq!(columns, declared);
    }
}
