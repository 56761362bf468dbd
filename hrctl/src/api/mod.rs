//! API layer for HTTP request handling.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers, generic over the entity kind
//! - **[`models`]**: Query string parsing and pagination headers
//!
//! # API Structure
//!
//! Every kind is served under `/api/{kind}`, where `{kind}` is one of `regions`, `countries`,
//! `locations`, `departments`, `employees`, `jobs`, `tasks` or `job-histories`:
//!
//! | Method   | Path                | Result                                       |
//! |----------|---------------------|----------------------------------------------|
//! | `POST`   | `/api/{kind}`       | 201, `Location` and alert headers            |
//! | `GET`    | `/api/{kind}`       | one page, `X-Total-Count` and `Link` headers |
//! | `GET`    | `/api/{kind}/{id}`  | entity with relations, or 404                |
//! | `PUT`    | `/api/{kind}/{id}`  | full replace                                 |
//! | `PATCH`  | `/api/{kind}/{id}`  | merge of the fields present in the body      |
//! | `DELETE` | `/api/{kind}/{id}`  | 204                                          |
//!
//! `GET /healthz` answers `OK` for liveness checks.

pub mod handlers;
pub mod models;
