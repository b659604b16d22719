pub mod models;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    extract::{OriginalUri, State},
    response::Response,
    routing::get,
    Json, Router,
};
use library_http::{AppError, IdPath, OptionalJson};
use library_kernel::{InitCtx, Module};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use self::models::{AuthorDto, AuthorForCreation};
use super::LibraryState;
use crate::utils;

/// Authors resource: listing, lookup and single creation
pub struct AuthorsModule {
    state: LibraryState,
}

impl AuthorsModule {
    pub fn new(state: LibraryState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/authors", get(list_authors).post(create_author))
            .route(
                "/authors/{author_id}",
                get(get_author).post(block_author_creation),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/authors": {
                    "get": {
                        "summary": "List authors",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "All authors",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Author" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorForCreation" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Author created; Location points at it" },
                            "400": { "description": "Missing or unreadable body" }
                        }
                    }
                },
                "/authors/{authorId}": {
                    "get": {
                        "summary": "Get an author",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "The author",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Author" }
                                    }
                                }
                            },
                            "404": { "description": "Unknown author" }
                        }
                    },
                    "post": {
                        "summary": "Blocked: authors cannot be created with a chosen id",
                        "tags": ["Authors"],
                        "responses": {
                            "404": { "description": "No author has this id" },
                            "409": { "description": "An author with this id already exists" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" },
                            "age": { "type": "integer" },
                            "genre": { "type": "string" }
                        },
                        "required": ["id", "name", "age", "genre"]
                    },
                    "AuthorForCreation": {
                        "type": "object",
                        "properties": {
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" },
                            "dateOfBirth": { "type": "string", "format": "date" },
                            "genre": { "type": "string" }
                        },
                        "required": ["firstName", "lastName", "dateOfBirth", "genre"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

pub(crate) fn today() -> time::Date {
    OffsetDateTime::now_utc().date()
}

/// GET /authors
async fn list_authors(State(state): State<LibraryState>) -> Json<Vec<AuthorDto>> {
    let today = today();
    let authors = state.repository().get_authors().await;

    Json(
        authors
            .iter()
            .map(|author| AuthorDto::from_entity(author, today))
            .collect(),
    )
}

/// GET /authors/{author_id}
async fn get_author(
    State(state): State<LibraryState>,
    IdPath(author_id): IdPath<Uuid>,
) -> Result<Json<AuthorDto>, AppError> {
    let author = state
        .repository()
        .get_author(author_id)
        .await
        .ok_or_else(|| AppError::not_found(format!("author {} does not exist", author_id)))?;

    Ok(Json(AuthorDto::from_entity(&author, today())))
}

/// POST /authors
async fn create_author(
    State(state): State<LibraryState>,
    OriginalUri(uri): OriginalUri,
    body: OptionalJson<AuthorForCreation>,
) -> Result<Response, AppError> {
    let input = body.required()?;

    let author = input.into_entity(Uuid::now_v7());
    let mut repository = state.repository();
    repository.add_author(author.clone());

    if !repository.save().await {
        return Err(anyhow!("Creating an author failed on save").into());
    }

    tracing::info!(author_id = %author.id, "author created");

    Ok(utils::created(
        utils::child_location(&uri, author.id),
        AuthorDto::from_entity(&author, today()),
    ))
}

/// POST /authors/{author_id}
///
/// Creating an author under a caller-chosen id is not supported. The answer
/// still tells the caller whether that id is taken.
async fn block_author_creation(
    State(state): State<LibraryState>,
    IdPath(author_id): IdPath<Uuid>,
) -> AppError {
    if state.repository().author_exists(author_id).await {
        return AppError::conflict(
            vec![json!({ "field": "id", "error": "an author with this id already exists" })],
            format!("author {} already exists", author_id),
        );
    }

    AppError::not_found(format!("author {} does not exist", author_id))
}

/// Create a new instance of the authors module
pub fn create_module(state: LibraryState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsModule::new(state))
}
