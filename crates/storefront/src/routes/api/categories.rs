//! `/api/categories`

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use cartwright_core::CategoryId;

use super::{ApiJson, Deleted, Doc, Docs};
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::CategoryPatch;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Response> {
    let categories = CatalogService::new(state.store()).categories().await?;
    Ok(Docs::from(categories).into_response())
}

pub async fn show(State(state): State<AppState>, Path(id): Path<CategoryId>) -> Result<Response> {
    let category = CatalogService::new(state.store()).category(id).await?;
    Ok(Doc { doc: category }.into_response())
}

/// Categories the given one may choose as its parent.
pub async fn parent_options(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let options = CatalogService::new(state.store())
        .parent_options(id)
        .await?;
    Ok(Docs::from(options).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    auth: OptionalAuth,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<Response> {
    let category = CatalogService::new(state.store())
        .create_category(auth.principal(), patch)
        .await?;
    Ok(Doc::created(category))
}

pub async fn update(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<CategoryId>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<Response> {
    let category = CatalogService::new(state.store())
        .update_category(auth.principal(), id, patch)
        .await?;
    Ok(Doc { doc: category }.into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let id = CatalogService::new(state.store())
        .delete_category(auth.principal(), id)
        .await?;
    Ok(Deleted { id }.into_response())
}
