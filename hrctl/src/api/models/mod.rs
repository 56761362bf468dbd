//! Request and response shapes of the REST layer that are not entity records themselves.
//!
//! Entity bodies are the [`crate::db::models`] types serialized directly: a response is a
//! [`crate::db::models::Loaded`] entity with its relations flattened in, a patch body is the
//! entity's patch type.

pub mod filters;
pub mod pagination;
