//! Transactional entity service.
//!
//! [`EntityService`] is the layer the REST handlers talk to. It owns a [`PgPool`] and, for every
//! multi-step write (save with link reconciliation, delete with link cleanup, read-merge-write
//! partial updates), opens one transaction so a failure or a dropped request leaves nothing half
//! written. Reads take a pooled connection.
//!
//! Entity field rules ([`Entity::validate`]) are enforced here before anything is written.

use crate::db::handlers::{Entities, EntityFilter, Repository};
use crate::db::models::{Entity, Loaded};
use crate::db::query::{Criteria, PageRequest};
use crate::errors::{Error, RejectReason, Result};
use sqlx::PgPool;
use std::marker::PhantomData;
use tracing::instrument;

pub struct EntityService<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityService<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn check(entity: &E) -> Result<()> {
        entity
            .validate()
            .map_err(|message| Error::rejected(E::SCHEMA.name, RejectReason::Invalid, message))
    }

    /// Insert or update `entity` and its link rows in one transaction.
    #[instrument(skip(self, entity), fields(entity = E::SCHEMA.name, id = entity.id()), err)]
    pub async fn save(&self, entity: &E) -> Result<E> {
        Self::check(entity)?;

        let mut tx = self.pool.begin().await.map_err(|e| Error::Database(e.into()))?;
        let saved = Entities::<E>::new(&mut tx).save(entity).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        Ok(saved)
    }

    /// Merge `patch` into the stored entity and write it back.
    ///
    /// Returns `None` when no entity has this id. The merged entity is reloaded inside the same
    /// transaction, so changed foreign keys come back with their new relations.
    #[instrument(skip(self, patch), fields(entity = E::SCHEMA.name), err)]
    pub async fn partial_update(&self, id: i64, patch: E::Patch) -> Result<Option<Loaded<E>>> {
        let mut tx = self.pool.begin().await.map_err(|e| Error::Database(e.into()))?;

        let loaded = {
            let mut repo = Entities::<E>::new(&mut tx);
            let Some(current) = repo.find_by_id(id).await? else {
                return Ok(None);
            };

            let mut entity = current.into_entity();
            entity.apply_patch(patch);
            Self::check(&entity)?;

            repo.update(&entity).await?;
            repo.find_by_id(id).await?
        };

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        Ok(loaded)
    }

    pub async fn find_all(&self) -> Result<Vec<Loaded<E>>> {
        let mut conn = self.pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Entities::<E>::new(&mut conn).find_all().await?)
    }

    pub async fn find_page(&self, page: PageRequest) -> Result<Vec<Loaded<E>>> {
        let mut conn = self.pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Entities::<E>::new(&mut conn).find_page(page).await?)
    }

    pub async fn find_by(&self, filter: &EntityFilter) -> Result<Vec<Loaded<E>>> {
        let mut conn = self.pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Entities::<E>::new(&mut conn).find_by(filter).await?)
    }

    pub async fn count(&self, criteria: &Criteria) -> Result<i64> {
        let mut conn = self.pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Entities::<E>::new(&mut conn).count(&EntityFilter::new(criteria.clone())).await?)
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<Loaded<E>>> {
        let mut conn = self.pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Entities::<E>::new(&mut conn).find_by_id(id).await?)
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let mut conn = self.pool.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Entities::<E>::new(&mut conn).exists(id).await?)
    }

    /// Delete the entity and its link rows. Returns whether the entity existed.
    #[instrument(skip(self), fields(entity = E::SCHEMA.name), err)]
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| Error::Database(e.into()))?;
        let deleted = Entities::<E>::new(&mut tx).delete_by_id(id).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::models::{Department, DepartmentPatch, Job, JobPatch, Region, Task};
    use crate::test_utils::insert_task;
    use std::collections::BTreeSet;

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_keeps_absent_fields(pool: PgPool) {
        let service = EntityService::<Department>::new(pool.clone());
        let sales = service
            .save(&Department {
                id: None,
                department_name: Some("Sales".into()),
                location_id: None,
            })
            .await
            .unwrap();
        let id = sales.id.unwrap();

        let patch: DepartmentPatch = serde_json::from_value(serde_json::json!({ "id": id })).unwrap();
        let unchanged = service.partial_update(id, patch).await.unwrap().unwrap();
        assert_eq!(unchanged.entity.department_name.as_deref(), Some("Sales"));

        let patch: DepartmentPatch = serde_json::from_value(serde_json::json!({ "id": id, "department_name": "Marketing" })).unwrap();
        let renamed = service.partial_update(id, patch).await.unwrap().unwrap();
        assert_eq!(renamed.entity.department_name.as_deref(), Some("Marketing"));
        assert_eq!(renamed.entity.id, Some(id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_of_missing_entity_is_none(pool: PgPool) {
        let service = EntityService::<Region>::new(pool);
        let result = service.partial_update(404, Default::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_entity_is_rejected_before_write(pool: PgPool) {
        let service = EntityService::<Department>::new(pool.clone());

        let err = service.save(&Department::default()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected {
                reason: RejectReason::Invalid,
                ..
            }
        ));
        assert_eq!(service.count(&Criteria::new()).await.unwrap(), 0);

        let saved = service
            .save(&Department {
                department_name: Some("Sales".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = saved.id.unwrap();

        let clear: DepartmentPatch = serde_json::from_value(serde_json::json!({ "department_name": null })).unwrap();
        assert!(service.partial_update(id, clear).await.is_err());

        let stored = service.find_one(id).await.unwrap().unwrap();
        assert_eq!(stored.entity.department_name.as_deref(), Some("Sales"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_link_write_rolls_back_the_row(pool: PgPool) {
        let service = EntityService::<Job>::new(pool.clone());

        // Task 999_999 does not exist, so reconciling the link rows violates the foreign key
        let job = Job {
            job_title: Some("Engineer".into()),
            task_ids: BTreeSet::from([999_999]),
            ..Default::default()
        };
        let err = service.save(&job).await.unwrap_err();
        assert!(matches!(err, Error::Database(DbError::ForeignKeyViolation { .. })));

        assert_eq!(service.count(&Criteria::new()).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_replaces_task_set_only_when_given(pool: PgPool) {
        let t1 = insert_task(&pool, "Review").await;
        let t2 = insert_task(&pool, "Deploy").await;
        let service = EntityService::<Job>::new(pool.clone());

        let job = service
            .save(&Job {
                job_title: Some("Engineer".into()),
                task_ids: BTreeSet::from([t1]),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = job.id.unwrap();

        let retitle: JobPatch = serde_json::from_value(serde_json::json!({ "job_title": "Senior Engineer" })).unwrap();
        let loaded = service.partial_update(id, retitle).await.unwrap().unwrap();
        assert_eq!(loaded.entity.task_ids, BTreeSet::from([t1]));

        let retask: JobPatch = serde_json::from_value(serde_json::json!({ "task_ids": [t2] })).unwrap();
        let loaded = service.partial_update(id, retask).await.unwrap().unwrap();
        assert_eq!(loaded.entity.task_ids, BTreeSet::from([t2]));
        assert_eq!(loaded.entity.job_title.as_deref(), Some("Senior Engineer"));

        assert!(service.delete(id).await.unwrap());
        assert!(!service.exists(id).await.unwrap());
        assert_eq!(EntityService::<Task>::new(pool).find_all().await.unwrap().len(), 2);
    }
}
