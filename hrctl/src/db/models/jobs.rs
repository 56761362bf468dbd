//! Database models for jobs.
//!
//! A job owns a many-to-many association with tasks, stored in `rel_job__task`. The set of task
//! ids is not a column: it is populated from the link table on read and reconciled against it
//! on save.

use super::{Employee, Entity, merge, related};
use crate::db::errors::Result;
use crate::db::row::{ColumnValue, RowAccess, Value, convert};
use crate::db::schema::{EntitySchema, ID, JOB_TASKS, Join, LinkTable, TableAlias, aliases, tables};
use crate::types::{EmployeeId, JobId, TaskId};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use std::collections::BTreeSet;

pub static SCHEMA: EntitySchema = EntitySchema {
    name: "Job",
    table: &tables::JOB,
    joins: &[Join {
        alias: aliases::EMPLOYEE,
        target: &tables::EMPLOYEE,
        foreign_key: "employee_id",
    }],
    links: &[&JOB_TASKS],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: Option<JobId>,
    pub job_title: Option<String>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub employee_id: Option<EmployeeId>,
    /// Tasks associated through the link table.
    #[serde(default)]
    pub task_ids: BTreeSet<TaskId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JobRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(default)]
    pub id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub job_title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub min_salary: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub max_salary: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub employee_id: Option<Option<EmployeeId>>,
    /// Replaces the whole task set when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<BTreeSet<TaskId>>,
}

impl Entity for Job {
    type Relations = JobRelations;
    type Patch = JobPatch;

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
            job_title: convert(row, alias.column("job_title"))?,
            min_salary: convert(row, alias.column("min_salary"))?,
            max_salary: convert(row, alias.column("max_salary"))?,
            employee_id: convert(row, alias.column("employee_id"))?,
            task_ids: BTreeSet::new(),
        })
    }

    fn relations_from_row(row: &impl RowAccess) -> Result<Self::Relations> {
        Ok(JobRelations {
            employee: related(row, aliases::EMPLOYEE)?,
        })
    }

    fn column_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("job_title", String::to_value(self.job_title.as_ref())),
            ("min_salary", i64::to_value(self.min_salary.as_ref())),
            ("max_salary", i64::to_value(self.max_salary.as_ref())),
            ("employee_id", i64::to_value(self.employee_id.as_ref())),
        ]
    }

    fn linked_ids(&self, link: &LinkTable) -> Option<&BTreeSet<i64>> {
        (*link == JOB_TASKS).then_some(&self.task_ids)
    }

    fn set_linked_ids(&mut self, link: &LinkTable, ids: BTreeSet<i64>) {
        if *link == JOB_TASKS {
            self.task_ids = ids;
        }
    }

    fn patch_id(patch: &Self::Patch) -> Option<i64> {
        patch.id
    }

    fn apply_patch(&mut self, patch: Self::Patch) {
        merge(&mut self.job_title, patch.job_title);
        merge(&mut self.min_salary, patch.min_salary);
        merge(&mut self.max_salary, patch.max_salary);
        merge(&mut self.employee_id, patch.employee_id);
        if let Some(task_ids) = patch.task_ids {
            self.task_ids = task_ids;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_exposed_for_the_job_task_link_only() {
        let other = LinkTable {
            table: "rel_other",
            owner_column: "job_id",
            target_column: "other_id",
        };
        let mut job = Job {
            task_ids: BTreeSet::from([1, 2]),
            ..Default::default()
        };

        assert_eq!(job.linked_ids(&JOB_TASKS), Some(&BTreeSet::from([1, 2])));
        assert_eq!(job.linked_ids(&other), None);

        job.set_linked_ids(&other, BTreeSet::from([9]));
        assert_eq!(job.task_ids, BTreeSet::from([1, 2]));
        job.set_linked_ids(&JOB_TASKS, BTreeSet::from([3]));
        assert_eq!(job.task_ids, BTreeSet::from([3]));
    }

    #[test]
    fn patch_replaces_task_set_only_when_present() {
        let mut job = Job {
            id: Some(1),
            job_title: Some("Engineer".into()),
            task_ids: BTreeSet::from([1, 2]),
            ..Default::default()
        };

        job.apply_patch(serde_json::from_str(r#"{"id": 1, "job_title": "Manager"}"#).unwrap());
        assert_eq!(job.task_ids, BTreeSet::from([1, 2]));
        assert_eq!(job.job_title.as_deref(), Some("Manager"));

        job.apply_patch(serde_json::from_str(r#"{"id": 1, "task_ids": []}"#).unwrap());
        assert!(job.task_ids.is_empty());
    }

    #[test]
    fn missing_task_ids_deserialize_as_empty() {
        let job: Job = serde_json::from_str(r#"{"job_title": "Engineer"}"#).unwrap();
        assert_eq!(job.id, None);
        assert!(job.task_ids.is_empty());
    }
}
