//! `/api/products`

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use cartwright_core::{CategoryId, ProductId, ProductStatus};
use serde::Deserialize;

use super::{ApiJson, Deleted, Doc, Docs};
use crate::db::ProductFilter;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::ProductPatch;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Listing filters: `?status=published&category=3&featured=true`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub status: Option<ProductStatus>,
    pub category: Option<CategoryId>,
    pub featured: Option<bool>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            status: query.status,
            category: query.category,
            featured: query.featured,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Response> {
    let products = CatalogService::new(state.store())
        .products(query.into())
        .await?;
    Ok(Docs::from(products).into_response())
}

pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Response> {
    let product = CatalogService::new(state.store()).product(id).await?;
    Ok(Doc { doc: product }.into_response())
}

pub async fn create(
    State(state): State<AppState>,
    auth: OptionalAuth,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Response> {
    let product = CatalogService::new(state.store())
        .create_product(auth.principal(), patch)
        .await?;
    Ok(Doc::created(product))
}

pub async fn update(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Response> {
    let product = CatalogService::new(state.store())
        .update_product(auth.principal(), id, patch)
        .await?;
    Ok(Doc { doc: product }.into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let id = CatalogService::new(state.store())
        .delete_product(auth.principal(), id)
        .await?;
    Ok(Deleted { id }.into_response())
}
