//! CRUD handlers shared by every entity kind.
//!
//! Each handler is generic over a [`Resource`]; [`super::resource_routes`] instantiates them once
//! per kind. Writes answer with alert headers naming the operation and the entity id:
//!
//! ```text
//! X-hrctl-alert: hrctl.job.created
//! X-hrctl-params: 42
//! ```

use super::Resource;
use crate::AppState;
use crate::api::models::filters::ListQuery;
use crate::api::models::pagination::{TOTAL_COUNT_HEADER, link_header};
use crate::db::handlers::EntityFilter;
use crate::db::models::Loaded;
use crate::errors::{Error, RejectReason, Result};
use crate::service::EntityService;
use crate::types::Operation;
use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::LOCATION},
};
use tracing::debug;

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Internal {
        operation: format!("build header value '{value}': {e}"),
    })
}

fn header_name(name: String) -> Result<HeaderName> {
    HeaderName::try_from(name.to_ascii_lowercase()).map_err(|e| Error::Internal {
        operation: format!("build header name '{name}': {e}"),
    })
}

/// `X-{app}-alert` and `X-{app}-params` for a write on entity `id`.
pub fn alert_headers(application_name: &str, entity_name: &str, operation: Operation, id: i64) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header_name(format!("x-{application_name}-alert"))?,
        header_value(&format!("{application_name}.{entity_name}.{}", operation.past_tense()))?,
    );
    headers.insert(header_name(format!("x-{application_name}-params"))?, header_value(&id.to_string())?);
    Ok(headers)
}

/// Check the body id of an update against the path id and the store.
async fn check_update_target<E: Resource>(service: &EntityService<E>, path_id: i64, body_id: Option<i64>) -> Result<()> {
    let Some(body_id) = body_id else {
        return Err(Error::rejected(E::ENTITY_NAME, RejectReason::IdNull, "Invalid id"));
    };
    if body_id != path_id {
        return Err(Error::rejected(E::ENTITY_NAME, RejectReason::IdInvalid, "Invalid ID"));
    }
    if !service.exists(path_id).await? {
        return Err(Error::rejected(E::ENTITY_NAME, RejectReason::IdNotFound, "Entity not found"));
    }
    Ok(())
}

/// `POST /api/{kind}`
#[tracing::instrument(skip_all, fields(entity = E::ENTITY_NAME))]
pub async fn create<E: Resource>(State(state): State<AppState>, Json(entity): Json<E>) -> Result<(StatusCode, HeaderMap, Json<E>)> {
    if entity.id().is_some() {
        return Err(Error::rejected(
            E::ENTITY_NAME,
            RejectReason::IdExists,
            format!("A new {} cannot already have an ID", E::ENTITY_NAME),
        ));
    }

    let saved = EntityService::<E>::new(state.db.clone()).save(&entity).await?;
    let id = saved.id().ok_or_else(|| Error::Internal {
        operation: format!("read the id assigned to a new {}", E::ENTITY_NAME),
    })?;

    let mut headers = alert_headers(&state.config.application_name, E::ENTITY_NAME, Operation::Create, id)?;
    headers.insert(LOCATION, header_value(&format!("/api/{}/{id}", E::PATH))?);

    Ok((StatusCode::CREATED, headers, Json(saved)))
}

/// `PUT /api/{kind}/{id}`: replace every field.
#[tracing::instrument(skip_all, fields(entity = E::ENTITY_NAME))]
pub async fn update<E: Resource>(State(state): State<AppState>, Path(id): Path<i64>, Json(entity): Json<E>) -> Result<(HeaderMap, Json<E>)> {
    let service = EntityService::<E>::new(state.db.clone());
    check_update_target(&service, id, entity.id()).await?;

    let saved = service.save(&entity).await?;
    let headers = alert_headers(&state.config.application_name, E::ENTITY_NAME, Operation::Update, id)?;

    Ok((headers, Json(saved)))
}

/// `PATCH /api/{kind}/{id}`: overwrite only the fields present in the body.
#[tracing::instrument(skip_all, fields(entity = E::ENTITY_NAME))]
pub async fn partial_update<E: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<E::Patch>,
) -> Result<(HeaderMap, Json<Loaded<E>>)> {
    let service = EntityService::<E>::new(state.db.clone());
    check_update_target(&service, id, E::patch_id(&patch)).await?;

    // The row can still disappear between the existence check and the merge
    let loaded = service.partial_update(id, patch).await?.ok_or_else(|| Error::NotFound {
        resource: E::SCHEMA.name.to_string(),
        id: id.to_string(),
    })?;
    let headers = alert_headers(&state.config.application_name, E::ENTITY_NAME, Operation::Update, id)?;

    Ok((headers, Json(loaded)))
}

/// `GET /api/{kind}`: one page of entities with their relations.
#[tracing::instrument(skip_all, fields(entity = E::ENTITY_NAME))]
pub async fn list<E: Resource>(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<(HeaderMap, Json<Vec<Loaded<E>>>)> {
    let query = ListQuery::parse(E::SCHEMA, &pairs)?;
    let pagination = &state.config.pagination;
    let page = query.page.page();
    let size = query.page.size(pagination);

    let service = EntityService::<E>::new(state.db.clone());
    let filter = EntityFilter::new(query.criteria.clone()).paged(query.page.page_request(pagination));
    let items = service.find_by(&filter).await?;
    let total = service.count(&query.criteria).await?;

    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, header_value(&total.to_string())?);
    headers.insert(
        axum::http::header::LINK,
        header_value(&link_header(&format!("/api/{}", E::PATH), raw_query.as_deref(), page, size, total))?,
    );

    Ok((headers, Json(items)))
}

/// `GET /api/{kind}/{id}`
#[tracing::instrument(skip_all, fields(entity = E::ENTITY_NAME))]
pub async fn get<E: Resource>(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Loaded<E>>> {
    match EntityService::<E>::new(state.db.clone()).find_one(id).await? {
        Some(loaded) => Ok(Json(loaded)),
        None => Err(Error::NotFound {
            resource: E::SCHEMA.name.to_string(),
            id: id.to_string(),
        }),
    }
}

/// `DELETE /api/{kind}/{id}`: 204 whether or not the entity existed.
#[tracing::instrument(skip_all, fields(entity = E::ENTITY_NAME))]
pub async fn delete<E: Resource>(State(state): State<AppState>, Path(id): Path<i64>) -> Result<(StatusCode, HeaderMap)> {
    let deleted = EntityService::<E>::new(state.db.clone()).delete(id).await?;
    if !deleted {
        debug!("Nothing to delete");
    }

    let headers = alert_headers(&state.config.application_name, E::ENTITY_NAME, Operation::Delete, id)?;
    Ok((StatusCode::NO_CONTENT, headers))
}
