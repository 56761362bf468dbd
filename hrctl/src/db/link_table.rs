//! Many-to-many association maintenance.
//!
//! A link table stores nothing but `(owner, target)` pairs. [`LinkTables`] brings the pairs of
//! one owner in line with a desired target set using the minimal set of inserts and deletes,
//! and removes all pairs of an owner before the owner row itself is deleted.
//!
//! Reconciliation reads the current set and then writes the difference. Two reconciles for the
//! same owner on independent connections are not coordinated and can interleave; run them
//! inside a transaction (as [`crate::service::EntityService`] does) when that matters.

use crate::db::errors::Result;
use crate::db::schema::LinkTable;
use sqlx::PgConnection;
use std::collections::{BTreeSet, HashMap};
use tracing::instrument;

/// The inserts and deletes that turn a current target set into a desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_insert: BTreeSet<i64>,
    pub to_delete: BTreeSet<i64>,
}

impl ReconcilePlan {
    pub fn between(current: &BTreeSet<i64>, desired: &BTreeSet<i64>) -> Self {
        Self {
            to_insert: desired.difference(current).copied().collect(),
            to_delete: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty()
    }
}

pub struct LinkTables<'c> {
    db: &'c mut PgConnection,
}

impl<'c> LinkTables<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Targets currently linked to `owner`.
    #[instrument(skip(self, link), fields(link = link.table), err)]
    pub async fn targets(&mut self, link: &LinkTable, owner: i64) -> Result<BTreeSet<i64>> {
        let sql = format!(
            "SELECT {target} FROM {table} WHERE {owner_column} = $1",
            target = link.target_column,
            table = link.table,
            owner_column = link.owner_column,
        );
        let targets = sqlx::query_scalar::<_, i64>(&sql).bind(owner).fetch_all(&mut *self.db).await?;

        Ok(targets.into_iter().collect())
    }

    /// Targets of many owners in one round trip. Every requested owner is present in the result,
    /// with an empty set when it has no links.
    #[instrument(skip(self, link, owners), fields(link = link.table, count = owners.len()), err)]
    pub async fn targets_bulk(&mut self, link: &LinkTable, owners: &[i64]) -> Result<HashMap<i64, BTreeSet<i64>>> {
        let mut result: HashMap<i64, BTreeSet<i64>> = owners.iter().map(|owner| (*owner, BTreeSet::new())).collect();
        if owners.is_empty() {
            return Ok(result);
        }

        let sql = format!(
            "SELECT {owner_column}, {target} FROM {table} WHERE {owner_column} = ANY($1)",
            owner_column = link.owner_column,
            target = link.target_column,
            table = link.table,
        );
        let pairs = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(owners.to_vec())
            .fetch_all(&mut *self.db)
            .await?;

        for (owner, target) in pairs {
            result.entry(owner).or_default().insert(target);
        }

        Ok(result)
    }

    /// Make the targets of `owner` exactly `desired`. An empty `desired` unlinks everything.
    /// Returns the changes that were applied.
    #[instrument(skip(self, link, desired), fields(link = link.table, desired = desired.len()), err)]
    pub async fn reconcile(&mut self, link: &LinkTable, owner: i64, desired: &BTreeSet<i64>) -> Result<ReconcilePlan> {
        let current = self.targets(link, owner).await?;
        let plan = ReconcilePlan::between(&current, desired);

        if !plan.to_insert.is_empty() {
            let sql = format!(
                "INSERT INTO {table} ({owner_column}, {target}) SELECT $1, UNNEST($2::bigint[]) ON CONFLICT DO NOTHING",
                table = link.table,
                owner_column = link.owner_column,
                target = link.target_column,
            );
            sqlx::query(&sql)
                .bind(owner)
                .bind(plan.to_insert.iter().copied().collect::<Vec<i64>>())
                .execute(&mut *self.db)
                .await?;
        }

        if !plan.to_delete.is_empty() {
            let sql = format!(
                "DELETE FROM {table} WHERE {owner_column} = $1 AND {target} = ANY($2)",
                table = link.table,
                owner_column = link.owner_column,
                target = link.target_column,
            );
            sqlx::query(&sql)
                .bind(owner)
                .bind(plan.to_delete.iter().copied().collect::<Vec<i64>>())
                .execute(&mut *self.db)
                .await?;
        }

        tracing::debug!(inserted = plan.to_insert.len(), deleted = plan.to_delete.len(), "reconciled link rows");
        Ok(plan)
    }

    /// Remove every link row of `owner`. Returns the number of rows removed.
    #[instrument(skip(self, link), fields(link = link.table), err)]
    pub async fn delete_all_for_owner(&mut self, link: &LinkTable, owner: i64) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", link.table, link.owner_column);
        let result = sqlx::query(&sql).bind(owner).execute(&mut *self.db).await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::JOB_TASKS;
    use crate::test_utils::{insert_job, insert_task};
    use sqlx::PgPool;

    #[test]
    fn plan_inserts_missing_and_deletes_stale() {
        let current = BTreeSet::from([1, 2, 3]);
        let desired = BTreeSet::from([2, 4]);

        let plan = ReconcilePlan::between(&current, &desired);
        assert_eq!(plan.to_insert, BTreeSet::from([4]));
        assert_eq!(plan.to_delete, BTreeSet::from([1, 3]));
    }

    #[test]
    fn plan_for_identical_sets_is_empty() {
        let set = BTreeSet::from([7, 8]);
        assert!(ReconcilePlan::between(&set, &set).is_empty());
    }

    #[test]
    fn plan_to_empty_set_deletes_everything() {
        let plan = ReconcilePlan::between(&BTreeSet::from([1, 2]), &BTreeSet::new());
        assert!(plan.to_insert.is_empty());
        assert_eq!(plan.to_delete, BTreeSet::from([1, 2]));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reconcile_to_exact_desired_set(pool: PgPool) {
        let job = insert_job(&pool, "Dev").await;
        let t1 = insert_task(&pool, "t1").await;
        let t2 = insert_task(&pool, "t2").await;
        let t3 = insert_task(&pool, "t3").await;
        let t4 = insert_task(&pool, "t4").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut links = LinkTables::new(&mut conn);

        links.reconcile(&JOB_TASKS, job, &BTreeSet::from([t1, t2, t3])).await.unwrap();
        assert_eq!(links.targets(&JOB_TASKS, job).await.unwrap(), BTreeSet::from([t1, t2, t3]));

        let plan = links.reconcile(&JOB_TASKS, job, &BTreeSet::from([t2, t4])).await.unwrap();
        assert_eq!(plan.to_insert, BTreeSet::from([t4]));
        assert_eq!(plan.to_delete, BTreeSet::from([t1, t3]));
        assert_eq!(links.targets(&JOB_TASKS, job).await.unwrap(), BTreeSet::from([t2, t4]));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reconcile_is_idempotent(pool: PgPool) {
        let job = insert_job(&pool, "Dev").await;
        let t1 = insert_task(&pool, "t1").await;
        let t2 = insert_task(&pool, "t2").await;
        let desired = BTreeSet::from([t1, t2]);

        let mut conn = pool.acquire().await.unwrap();
        let mut links = LinkTables::new(&mut conn);

        links.reconcile(&JOB_TASKS, job, &desired).await.unwrap();
        let once = links.targets(&JOB_TASKS, job).await.unwrap();

        let second = links.reconcile(&JOB_TASKS, job, &desired).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(links.targets(&JOB_TASKS, job).await.unwrap(), once);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reconcile_with_empty_set_unlinks(pool: PgPool) {
        let job = insert_job(&pool, "Dev").await;
        let t1 = insert_task(&pool, "t1").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut links = LinkTables::new(&mut conn);

        links.reconcile(&JOB_TASKS, job, &BTreeSet::from([t1])).await.unwrap();
        links.reconcile(&JOB_TASKS, job, &BTreeSet::new()).await.unwrap();
        assert!(links.targets(&JOB_TASKS, job).await.unwrap().is_empty());

        // The task itself is untouched.
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task WHERE id = $1")
            .bind(t1)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_targets_bulk_and_delete_all_for_owner(pool: PgPool) {
        let job_a = insert_job(&pool, "A").await;
        let job_b = insert_job(&pool, "B").await;
        let job_c = insert_job(&pool, "C").await;
        let t1 = insert_task(&pool, "t1").await;
        let t2 = insert_task(&pool, "t2").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut links = LinkTables::new(&mut conn);

        links.reconcile(&JOB_TASKS, job_a, &BTreeSet::from([t1, t2])).await.unwrap();
        links.reconcile(&JOB_TASKS, job_b, &BTreeSet::from([t2])).await.unwrap();

        let bulk = links.targets_bulk(&JOB_TASKS, &[job_a, job_b, job_c]).await.unwrap();
        assert_eq!(bulk[&job_a], BTreeSet::from([t1, t2]));
        assert_eq!(bulk[&job_b], BTreeSet::from([t2]));
        assert!(bulk[&job_c].is_empty());

        assert_eq!(links.delete_all_for_owner(&JOB_TASKS, job_a).await.unwrap(), 2);
        assert!(links.targets(&JOB_TASKS, job_a).await.unwrap().is_empty());
        assert_eq!(links.targets(&JOB_TASKS, job_b).await.unwrap(), BTreeSet::from([t2]));
    }
}
