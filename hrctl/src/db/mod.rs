//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL. It is table driven:
//! each entity kind is described once by a static [`schema::EntitySchema`], and a single set of
//! generic components reads and writes every kind.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  (crate::service - transactions, partial updates)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - Entities<E>)
//! └──────┬──────┘
//!        │
//!   ┌────┴─────────────┐
//!   ↓                  ↓
//! ┌─────────────┐  ┌─────────────┐
//! │ query + row │  │ link_table  │  (joined SELECTs and row mapping / many-to-many upkeep)
//! └──────┬──────┘  └──────┬──────┘
//!        └────────┬───────┘
//!                 ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`schema`]: static table, join and link table descriptors
//! - [`row`]: typed column access and conversion
//! - [`models`]: entity records and the [`models::Entity`] trait
//! - [`query`]: joined SELECT and COUNT assembly, criteria and pagination
//! - [`link_table`]: many-to-many reconciliation
//! - [`handlers`]: the generic repository
//! - [`pools`]: connection pool construction
//! - [`errors`]: database-specific error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use hrctl::db::handlers::{Entities, Repository};
//! use hrctl::db::models::Region;
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut regions = Entities::<Region>::new(&mut tx);
//!
//!     let region = regions.save(&Region { id: None, region_name: Some("Europe".into()) }).await?;
//!     if let Some(found) = regions.find_by_id(region.id.unwrap()).await? {
//!         println!("Found region: {:?}", found.entity.region_name);
//!     }
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Transactions
//!
//! Repositories borrow a `PgConnection` and never open transactions themselves. A save that
//! also reconciles link rows, or a delete that removes link rows first, is only atomic when the
//! connection is a transaction.
//!
//! # Migrations
//!
//! The baseline schema lives in the `migrations/` directory. The [`crate::migrator`] function
//! provides access to the migrator:
//!
//! ```ignore
//! hrctl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod link_table;
pub mod models;
pub mod pools;
pub mod query;
pub mod row;
pub mod schema;
