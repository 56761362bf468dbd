//! Database models for job history records.

use super::{Department, Employee, Entity, Job, Language, merge, related};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, Join, TableAlias, aliases, tables};
use crate::types::{DepartmentId, EmployeeId, JobHistoryId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "JobHistory",
    table: &tables::JOB_HISTORY,
    joins: &[
        Join {
            alias: aliases::JOB,
            target: &tables::JOB,
            foreign_key: "job_id",
        },
        Join {
            alias: aliases::DEPARTMENT,
            target: &tables::DEPARTMENT,
            foreign_key: "department_id",
        },
        Join {
            alias: aliases::EMPLOYEE,
            target: &tables::EMPLOYEE,
            foreign_key: "employee_id",
        },
    ],
    links: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobHistory {
    #[serde(default)]
    pub id: Option<JobHistoryId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub language: Option<Language>,
    pub job_id: Option<JobId>,
    pub department_id: Option<DepartmentId>,
    pub employee_id: Option<EmployeeId>,
}

/// Joined objects of a job history record. The job is mapped without its task set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobHistoryRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobHistoryPatch {
    #[serde(default)]
    pub id: Option<JobHistoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub language: Option<Option<Language>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub job_id: Option<Option<JobId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub department_id: Option<Option<DepartmentId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub employee_id: Option<Option<EmployeeId>>,
}

impl Entity for JobHistory {
    type Relations = JobHistoryRelations;
    type Patch = JobHistoryPatch;

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
            start_date: convert(row, alias.column("start_date"))?,
            end_date: convert(row, alias.column("end_date"))?,
            language: convert(row, alias.column("language"))?,
            job_id: convert(row, alias.column("job_id"))?,
            department_id: convert(row, alias.column("department_id"))?,
            employee_id: convert(row, alias.column("employee_id"))?,
        })
    }

    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(JobHistoryRelations {
            job: related(row, aliases::JOB)?,
            department: related(row, aliases::DEPARTMENT)?,
            employee: related(row, aliases::EMPLOYEE)?,
        })
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("start_date", DateTime::<Utc>::to_value(self.start_date.as_ref())),
            ("end_date", DateTime::<Utc>::to_value(self.end_date.as_ref())),
            ("language", Language::to_value(self.language.as_ref())),
            ("job_id", i64::to_value(self.job_id.as_ref())),
            ("department_id", i64::to_value(self.department_id.as_ref())),
            ("employee_id", i64::to_value(self.employee_id.as_ref())),
        ]
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.start_date, patch.start_date);
        merge(&mut self.end_date, patch.end_date);
        merge(&mut self.language, patch.language);
        merge(&mut self.job_id, patch.job_id);
        merge(&mut self.department_id, patch.department_id);
        merge(&mut self.employee_id, patch.employee_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row::MemoryRow;

    #[test]
    fn language_is_read_from_text() {
        let alias = aliases::ENTITY;
        let row = MemoryRow::new()
            .with(alias.column("id"), Value::BigInt(Some(5)))
            .with(alias.column("start_date"), Value::Timestamp(None))
            .with(alias.column("end_date"), Value::Timestamp(None))
            .with(alias.column("language"), Value::Text(Some("ENGLISH".into())))
            .with(alias.column("job_id"), Value::BigInt(Some(1)))
            .with(alias.column("department_id"), Value::BigInt(None))
            .with(alias.column("employee_id"), Value::BigInt(Some(3)));

        let history = JobHistory::from_row(&row, alias).unwrap();
        assert_eq!(history.language, Some(Language::English));
        assert_eq!(history.job_id, Some(1));
        assert_eq!(history.department_id, None);
    }

    #[test]
    fn language_is_written_as_its_name() {
        let history = JobHistory {
            language: Some(Language::French),
            ..Default::default()
        };
        let (_, value) = history
            .column_values()
            .into_iter()
            .find(|(column, _)| *column == "language")
            .unwrap();
        assert_eq!(value, Value::Text(Some("FRENCH".into())));
    }
}
