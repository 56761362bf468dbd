//! Common type definitions.
//!
//! # ID Types
//!
//! Every entity is identified by a store-assigned 64-bit surrogate key. The aliases document
//! which table a foreign key points at:
//!
//! - [`RegionId`], [`CountryId`], [`LocationId`], [`DepartmentId`]
//! - [`EmployeeId`]: also used for an employee's manager
//! - [`JobId`], [`TaskId`], [`JobHistoryId`]
//!
//! # Operations
//!
//! [`Operation`] names the write performed on an entity; it is used to build the alert headers
//! returned by the REST layer.

// Type aliases for IDs
pub type RegionId = i64;
pub type CountryId = i64;
pub type LocationId = i64;
pub type DepartmentId = i64;
pub type EmployeeId = i64;
pub type JobId = i64;
pub type TaskId = i64;
pub type JobHistoryId = i64;

/// A write performed on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Past tense used in alert keys (`hrctl.region.created`).
    pub fn past_tense(&self) -> &'static str {
        match self {
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
        }
    }
}
