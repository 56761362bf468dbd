//! Repository implementations for database access.
//!
//! [`Entities`] is the one repository for every entity kind: it is generic over
//! [`crate::db::models::Entity`] and takes the table layout from the entity's static schema.
//! Like every repository here it borrows a `PgConnection`, so the caller decides whether the
//! operations run inside a transaction.

pub mod entities;
pub mod repository;

pub use entities::{Entities, EntityFilter};
pub use repository::Repository;
