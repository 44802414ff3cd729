//! JSON REST API, one module per collection.
//!
//! Responses use a small set of envelopes: a single record is `{doc}`, a
//! list is `{docs, totalDocs}` and a delete answers `{id}`. Errors are the
//! JSON bodies produced by [`AppError`].

pub mod categories;
pub mod customers;
pub mod media;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// `Json` with rejections reported as a JSON 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// A single record.
#[derive(Debug, Serialize)]
pub struct Doc<T> {
    pub doc: T,
}

impl<T: Serialize> Doc<T> {
    /// `201 Created` with the new record.
    pub fn created(doc: T) -> Response {
        (StatusCode::CREATED, axum::Json(Self { doc })).into_response()
    }
}

impl<T: Serialize> IntoResponse for Doc<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// A list of records.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Docs<T> {
    pub docs: Vec<T>,
    pub total_docs: usize,
}

impl<T> From<Vec<T>> for Docs<T> {
    fn from(docs: Vec<T>) -> Self {
        Self {
            total_docs: docs.len(),
            docs,
        }
    }
}

impl<T: Serialize> IntoResponse for Docs<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// The id of a deleted record.
#[derive(Debug, Serialize)]
pub struct Deleted<I> {
    pub id: I,
}

impl<I: Serialize> IntoResponse for Deleted<I> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}
