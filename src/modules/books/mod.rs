pub mod handlers;
pub mod models;
pub mod query;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use libris_kernel::{InitCtx, Module};
use serde_json::{json, Value};

use crate::modules::catalog::Catalog;
use crate::modules::openapi::{error_response, id_parameter, json_body, json_response, schema_ref};
use crate::utils;

/// Book CRUD, mounted at `/books`.
pub struct BooksModule {
    catalog: Catalog,
}

impl BooksModule {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            target: "libris::modules",
            prefix = %utils::log_prefix(self.name()),
            environment = ?ctx.settings.environment,
            min_published_year = validation::MIN_PUBLISHED_YEAR,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_books).post(handlers::create_book))
            .route(
                "/{id}",
                get(handlers::get_book)
                    .put(handlers::update_book)
                    .delete(handlers::delete_book),
            )
            .with_state(self.catalog.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": json_response("All books", json!({
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }))
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": json_body("BookInput"),
                        "responses": {
                            "201": json_response("Created book", schema_ref("Book")),
                            "400": error_response("Validation failed or unknown author"),
                            "409": error_response("Duplicate ISBN")
                        }
                    }
                },
                "/{id}": {
                    "parameters": [id_parameter()],
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": json_response("Book", schema_ref("Book")),
                            "404": error_response("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Update the given fields of a book",
                        "tags": ["Books"],
                        "requestBody": json_body("BookInput"),
                        "responses": {
                            "200": json_response("Updated book", schema_ref("Book")),
                            "400": error_response("Validation failed or unknown author"),
                            "404": error_response("Book not found"),
                            "409": error_response("Duplicate ISBN")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error_response("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "authorId": { "type": "string" },
                            "isbn": { "type": "string" },
                            "publishedYear": { "type": "integer" },
                            "genre": { "type": "string" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "authorId", "isbn", "publishedYear", "createdAt", "updatedAt"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "authorId": { "type": "string" },
                            "isbn": { "type": "string" },
                            "publishedYear": {
                                "type": "integer",
                                "minimum": validation::MIN_PUBLISHED_YEAR
                            },
                            "genre": { "type": "string" }
                        },
                        "required": ["title", "authorId", "isbn", "publishedYear"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(catalog: Catalog) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(catalog))
}
