//! Base repository trait for database operations.

/// Contains the Repository trait.
///
/// A repository is the data access layer for one entity table. It provides methods for
/// inserting, reading, updating and deleting entities, as well as listing and counting them
/// with simple filters.
use crate::db::errors::Result;

/// Base repository trait providing common database operations
///
/// Writes take the entity value and return it as persisted; reads return the response type,
/// which may carry more than the entity itself (joined relation objects).
#[async_trait::async_trait]
pub trait Repository {
    /// The entity value written by insert and update
    type Entity: Send + Sync;

    /// The response type returned by read operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Insert a new entity. The store assigns its identifier.
    async fn insert(&mut self, entity: &Self::Entity) -> Result<Self::Entity>;

    /// Get an entity by ID
    async fn find_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn find_by(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Count the entities matching a filter, ignoring its pagination
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;

    /// Delete an entity by ID
    async fn delete_by_id(&mut self, id: Self::Id) -> Result<bool>;

    /// Update an existing entity. Fails when no row has its identifier.
    async fn update(&mut self, entity: &Self::Entity) -> Result<Self::Entity>;
}
