use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use libris_http::error::AppError;

use super::models::{Author, AuthorPayload};
use crate::modules::books::models::Book;
use crate::modules::books::query::{BookQueryParams, Paged};
use crate::modules::catalog::Catalog;

pub async fn list_authors(State(catalog): State<Catalog>) -> Json<Vec<Author>> {
    Json(catalog.list_authors())
}

pub async fn get_author(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
) -> Result<Json<Author>, AppError> {
    Ok(Json(catalog.get_author(&id)?))
}

pub async fn create_author(
    State(catalog): State<Catalog>,
    Json(payload): Json<AuthorPayload>,
) -> Result<(StatusCode, Json<Author>), AppError> {
    let author = catalog.create_author(payload)?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
    Json(payload): Json<AuthorPayload>,
) -> Result<Json<Author>, AppError> {
    Ok(Json(catalog.update_author(&id, payload)?))
}

pub async fn delete_author(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog.delete_author(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /authors/{id}/books?q=&genre=&minYear=&maxYear=&sort=&page=&limit=`
pub async fn author_books(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
    Query(params): Query<BookQueryParams>,
) -> Result<Json<Paged<Book>>, AppError> {
    Ok(Json(catalog.author_books(&id, &params)?))
}
