//! Generic entity repository.
//!
//! Reads go through the joined SELECT of [`crate::db::query`] and map each row into a
//! [`Loaded`] entity. Writes build their INSERT/UPDATE from [`Entity::column_values`] and then
//! bring the entity's link tables in line with its in-memory id sets. Delete removes link rows
//! first and the entity row second.
//!
//! The steps of one write are not atomic by themselves: use a transaction connection when a
//! failure between the row write and the link writes must roll back both.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    link_table::LinkTables,
    models::{Entity, Loaded},
    query::{self, Criteria, PageRequest, push_value},
    row::Value,
    schema::{ID, aliases},
};
use futures::TryStreamExt;
use futures::stream::BoxStream;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, QueryBuilder};
use std::marker::PhantomData;
use tracing::instrument;

/// Filter for listing entities
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub criteria: Criteria,
    pub page: Option<PageRequest>,
}

impl EntityFilter {
    pub fn new(criteria: Criteria) -> Self {
        Self { criteria, page: None }
    }

    pub fn paged(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }
}

/// Rows per page when streaming a kind that has link tables.
pub const STREAM_CHUNK: i64 = 100;

pub struct Entities<'c, E> {
    db: &'c mut PgConnection,
    _entity: PhantomData<fn() -> E>,
}

fn load<E: Entity>(row: &PgRow) -> Result<Loaded<E>> {
    Ok(Loaded::new(E::from_row(row, aliases::ENTITY)?, E::relations_from_row(row)?))
}

impl<'c, E: Entity> Entities<'c, E> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Every entity of the kind, in database order.
    pub async fn find_all(&mut self) -> Result<Vec<Loaded<E>>> {
        self.find_by(&EntityFilter::default()).await
    }

    /// One page of entities, ordered by the page's sort plus the identifier.
    pub async fn find_page(&mut self, page: PageRequest) -> Result<Vec<Loaded<E>>> {
        self.find_by(&EntityFilter::default().paged(page)).await
    }

    #[instrument(skip(self), fields(entity = E::SCHEMA.name), err)]
    pub async fn exists(&mut self, id: i64) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {ID} = $1)", E::SCHEMA.table.table);
        let exists = sqlx::query_scalar::<_, bool>(&sql).bind(id).fetch_one(&mut *self.db).await?;

        Ok(exists)
    }

    /// Insert when the entity has no identifier, update otherwise.
    pub async fn save(&mut self, entity: &E) -> Result<E> {
        match entity.id() {
            None => self.insert(entity).await,
            Some(_) => self.update(entity).await,
        }
    }

    /// Lazily stream matching entities.
    ///
    /// Kinds without link tables are read through a single cursor. Kinds with link tables are
    /// read in pages of [`STREAM_CHUNK`] rows so each page can have its link id sets attached
    /// before it is yielded.
    pub fn stream(&mut self, filter: EntityFilter) -> BoxStream<'_, Result<Loaded<E>>> {
        if E::SCHEMA.links.is_empty() {
            let db = &mut *self.db;
            return Box::pin(async_stream::try_stream! {
                let mut query = query::select(E::SCHEMA, &filter.criteria, filter.page.as_ref())?;
                let mut rows = query.build().fetch(db);
                while let Some(row) = rows.try_next().await? {
                    yield load::<E>(&row)?;
                }
            });
        }

        self.stream_in_chunks(filter, STREAM_CHUNK)
    }

    fn stream_in_chunks(&mut self, filter: EntityFilter, chunk: i64) -> BoxStream<'_, Result<Loaded<E>>> {
        Box::pin(async_stream::try_stream! {
            let window = filter.page.clone().unwrap_or_else(|| PageRequest::new(0, i64::MAX));
            let end = window.offset.saturating_add(window.limit);
            let mut offset = window.offset;

            while offset < end {
                let limit = chunk.min(end - offset);
                let page = PageRequest {
                    offset,
                    limit,
                    sort: window.sort.clone(),
                };
                let batch = self.find_by(&EntityFilter::new(filter.criteria.clone()).paged(page)).await?;
                let fetched = batch.len() as i64;

                for item in batch {
                    yield item;
                }

                if fetched < limit {
                    break;
                }
                offset += fetched;
            }
        })
    }

    /// Fill the in-memory link id sets of `loaded` with one query per link table.
    async fn attach_links(&mut self, loaded: &mut [Loaded<E>]) -> Result<()> {
        if E::SCHEMA.links.is_empty() || loaded.is_empty() {
            return Ok(());
        }

        let owners: Vec<i64> = loaded.iter().filter_map(|l| l.entity.id()).collect();
        for link in E::SCHEMA.links {
            let mut targets = LinkTables::new(&mut *self.db).targets_bulk(link, &owners).await?;
            for item in loaded.iter_mut() {
                if let Some(id) = item.entity.id() {
                    item.entity.set_linked_ids(link, targets.remove(&id).unwrap_or_default());
                }
            }
        }

        Ok(())
    }

    async fn reconcile_links(&mut self, entity: &E, id: i64) -> Result<()> {
        for link in E::SCHEMA.links {
            if let Some(desired) = entity.linked_ids(link) {
                LinkTables::new(&mut *self.db).reconcile(link, id, desired).await?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c, E: Entity> Repository for Entities<'c, E> {
    type Entity = E;
    type Response = Loaded<E>;
    type Id = i64;
    type Filter = EntityFilter;

    #[instrument(skip(self, entity), fields(entity = E::SCHEMA.name, id = tracing::field::Empty), err)]
    async fn insert(&mut self, entity: &Self::Entity) -> Result<Self::Entity> {
        let columns = entity.column_values();

        let mut query = QueryBuilder::new(format!("INSERT INTO {} (", E::SCHEMA.table.table));
        let names: Vec<&str> = columns.iter().map(|(column, _)| *column).collect();
        query.push(names.join(", ")).push(") VALUES (");
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            push_value(&mut query, value);
        }
        query.push(format_args!(") RETURNING {ID}"));

        let id: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        tracing::Span::current().record("id", id);

        let mut saved = entity.clone();
        saved.set_id(id);
        self.reconcile_links(&saved, id).await?;

        Ok(saved)
    }

    #[instrument(skip(self), fields(entity = E::SCHEMA.name), err)]
    async fn find_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let criteria = Criteria::new().eq(ID, Value::BigInt(Some(id)));
        let mut query = query::select(E::SCHEMA, &criteria, None)?;

        let Some(row) = query.build().fetch_optional(&mut *self.db).await? else {
            return Ok(None);
        };

        let mut loaded = [load::<E>(&row)?];
        self.attach_links(&mut loaded).await?;
        let [loaded] = loaded;

        Ok(Some(loaded))
    }

    #[instrument(skip(self, filter), fields(entity = E::SCHEMA.name, paged = filter.page.is_some()), err)]
    async fn find_by(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = query::select(E::SCHEMA, &filter.criteria, filter.page.as_ref())?;
        let rows = query.build().fetch_all(&mut *self.db).await?;

        let mut loaded = rows.iter().map(load::<E>).collect::<Result<Vec<_>>>()?;
        self.attach_links(&mut loaded).await?;

        Ok(loaded)
    }

    #[instrument(skip(self, filter), fields(entity = E::SCHEMA.name), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = query::count(E::SCHEMA, &filter.criteria)?;
        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(entity = E::SCHEMA.name), err)]
    async fn delete_by_id(&mut self, id: Self::Id) -> Result<bool> {
        for link in E::SCHEMA.links {
            LinkTables::new(&mut *self.db).delete_all_for_owner(link, id).await?;
        }

        let sql = format!("DELETE FROM {} WHERE {ID} = $1", E::SCHEMA.table.table);
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, entity), fields(entity = E::SCHEMA.name, id = entity.id()), err)]
    async fn update(&mut self, entity: &Self::Entity) -> Result<Self::Entity> {
        let id = entity.id().ok_or_else(|| anyhow::anyhow!("cannot update a {} without an id", E::SCHEMA.name))?;

        let mut query = QueryBuilder::new(format!("UPDATE {} SET ", E::SCHEMA.table.table));
        for (i, (column, value)) in entity.column_values().into_iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            query.push(format_args!("{column} = "));
            push_value(&mut query, value);
        }
        query.push(format_args!(" WHERE {ID} = ")).push_bind(id);

        let result = query.build().execute(&mut *self.db).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::StaleUpdate {
                entity: E::SCHEMA.name,
                id,
            });
        }

        self.reconcile_links(entity, id).await?;

        Ok(entity.clone())
    }
}
