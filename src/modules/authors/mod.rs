pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use libris_kernel::{InitCtx, Module};
use serde_json::{json, Value};

use crate::modules::catalog::Catalog;
use crate::modules::openapi::{
    error_response, id_parameter, json_body, json_response, query_parameter, schema_ref,
};
use crate::utils;

/// Author CRUD plus the per-author book query, mounted at `/authors`.
pub struct AuthorsModule {
    catalog: Catalog,
}

impl AuthorsModule {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            target: "libris::modules",
            prefix = %utils::log_prefix(self.name()),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_authors).post(handlers::create_author))
            .route(
                "/{id}",
                get(handlers::get_author)
                    .put(handlers::update_author)
                    .delete(handlers::delete_author),
            )
            .route("/{id}/books", get(handlers::author_books))
            .with_state(self.catalog.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List authors",
                        "tags": ["Authors"],
                        "responses": {
                            "200": json_response("All authors", json!({
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Author" }
                            }))
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": json_body("AuthorInput"),
                        "responses": {
                            "201": json_response("Created author", schema_ref("Author")),
                            "400": error_response("Missing name"),
                            "409": error_response("Duplicate author name")
                        }
                    }
                },
                "/{id}": {
                    "parameters": [id_parameter()],
                    "get": {
                        "summary": "Get an author",
                        "tags": ["Authors"],
                        "responses": {
                            "200": json_response("Author", schema_ref("Author")),
                            "404": error_response("Author not found")
                        }
                    },
                    "put": {
                        "summary": "Replace an author's name and bio",
                        "tags": ["Authors"],
                        "requestBody": json_body("AuthorInput"),
                        "responses": {
                            "200": json_response("Updated author", schema_ref("Author")),
                            "400": error_response("Missing name"),
                            "404": error_response("Author not found"),
                            "409": error_response("Duplicate author name")
                        }
                    },
                    "delete": {
                        "summary": "Delete an author without books",
                        "tags": ["Authors"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error_response("Author not found"),
                            "409": error_response("Author still has books")
                        }
                    }
                },
                "/{id}/books": {
                    "parameters": [id_parameter()],
                    "get": {
                        "summary": "Search an author's books",
                        "tags": ["Authors"],
                        "parameters": [
                            query_parameter(
                                "q",
                                "Case-insensitive substring of title, ISBN or genre"
                            ),
                            query_parameter("genre", "Exact genre, case-insensitive"),
                            query_parameter("minYear", "Earliest published year"),
                            query_parameter("maxYear", "Latest published year"),
                            query_parameter(
                                "sort",
                                "`title|publishedYear|createdAt|updatedAt[:asc|desc]`, default `publishedYear:desc`"
                            ),
                            query_parameter("page", "1-based page, default 1"),
                            query_parameter("limit", "Page size 1..=100, default 10")
                        ],
                        "responses": {
                            "200": json_response("One page of books", schema_ref("BookPage")),
                            "400": error_response("Invalid sort field"),
                            "404": error_response("Author not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "bio": { "type": "string" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "createdAt", "updatedAt"]
                    },
                    "AuthorInput": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "bio": { "type": "string" }
                        },
                        "required": ["name"]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "data": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            },
                            "meta": {
                                "type": "object",
                                "properties": {
                                    "total": { "type": "integer" },
                                    "page": { "type": "integer" },
                                    "limit": { "type": "integer" },
                                    "totalPages": { "type": "integer" }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let (authors, books) = self.catalog.counts();
        tracing::info!(module = self.name(), authors, books, "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}


/// Create a new instance of the authors module
pub fn create_module(catalog: Catalog) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(catalog))
}
