//! HTTP request handlers for the REST API.
//!
//! Every entity kind is exposed the same way under `/api/{kind}`, so the handlers are written
//! once in [`entities`] and instantiated per kind through [`Resource`].

use crate::AppState;
use crate::db::models::{Country, Department, Employee, Entity, Job, JobHistory, Location, Region, Task};
use axum::Router;
use axum::routing::get;
use serde::de::DeserializeOwned;

pub mod entities;

/// An entity kind served by the REST API.
pub trait Resource: Entity + DeserializeOwned {
    /// Path segment under `/api`.
    const PATH: &'static str;
    /// Name used in alert keys and rejection bodies.
    const ENTITY_NAME: &'static str;
}

impl Resource for Region {
    const PATH: &'static str = "regions";
    const ENTITY_NAME: &'static str = "region";
}

impl Resource for Country {
    const PATH: &'static str = "countries";
    const ENTITY_NAME: &'static str = "country";
}

impl Resource for Location {
    const PATH: &'static str = "locations";
    const ENTITY_NAME: &'static str = "location";
}

impl Resource for Department {
    const PATH: &'static str = "departments";
    const ENTITY_NAME: &'static str = "department";
}

impl Resource for Employee {
    const PATH: &'static str = "employees";
    const ENTITY_NAME: &'static str = "employee";
}

impl Resource for Job {
    const PATH: &'static str = "jobs";
    const ENTITY_NAME: &'static str = "job";
}

impl Resource for Task {
    const PATH: &'static str = "tasks";
    const ENTITY_NAME: &'static str = "task";
}

impl Resource for JobHistory {
    const PATH: &'static str = "job-histories";
    const ENTITY_NAME: &'static str = "jobHistory";
}

/// The six CRUD routes of one kind.
pub fn resource_routes<E: Resource>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", E::PATH), get(entities::list::<E>).post(entities::create::<E>))
        .route(
            &format!("/{}/{{id}}", E::PATH),
            get(entities::get::<E>)
                .put(entities::update::<E>)
                .patch(entities::partial_update::<E>)
                .delete(entities::delete::<E>),
        )
}

/// Routes of every kind, to be nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(resource_routes::<Region>())
        .merge(resource_routes::<Country>())
        .merge(resource_routes::<Location>())
        .merge(resource_routes::<Department>())
        .merge(resource_routes::<Employee>())
        .merge(resource_routes::<Job>())
        .merge(resource_routes::<Task>())
        .merge(resource_routes::<JobHistory>())
}
