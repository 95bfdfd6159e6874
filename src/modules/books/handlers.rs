use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use libris_http::error::AppError;

use super::models::{Book, BookPayload};
use crate::modules::catalog::Catalog;

pub async fn list_books(State(catalog): State<Catalog>) -> Json<Vec<Book>> {
    Json(catalog.list_books())
}

pub async fn get_book(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(catalog.get_book(&id)?))
}

pub async fn create_book(
    State(catalog): State<Catalog>,
    Json(payload): Json<BookPayload>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = catalog.create_book(payload)?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Partial update: absent fields keep their stored value.
pub async fn update_book(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(catalog.update_book(&id, payload)?))
}

pub async fn delete_book(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog.delete_book(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
