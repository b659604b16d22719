pub mod models;
pub mod patch;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use json_patch::Patch;
use library_db::LibraryRepository;
use library_http::{AppError, IdPath, OptionalJson};
use library_kernel::{InitCtx, Module};
use serde_json::json;
use uuid::Uuid;

use self::models::{validate_book, BookDto, BookForCreation, BookForUpdate};
use super::LibraryState;
use crate::patch::apply_patch;
use crate::utils;

/// Books of an author, including PUT/PATCH upserts
pub struct BooksModule {
    state: LibraryState,
}

impl BooksModule {
    pub fn new(state: LibraryState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/authors/{author_id}/books",
                get(list_books).post(create_book),
            )
            .route(
                "/authors/{author_id}/books/{id}",
                get(get_book)
                    .put(replace_book)
                    .patch(partially_update_book)
                    .delete(delete_book),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_ref = json!({ "$ref": "#/components/schemas/Book" });
        let upsert_responses = json!({
            "201": {
                "description": "Book did not exist and was created with the given id",
                "content": { "application/json": { "schema": book_ref.clone() } }
            },
            "204": { "description": "Book updated" },
            "400": { "description": "Missing or unreadable body, or a failing patch operation" },
            "404": { "description": "Unknown author" },
            "409": { "description": "The id belongs to a book of another author" },
            "422": {
                "description": "Book breaks a validation rule",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            }
        });

        Some(json!({
            "paths": {
                "/authors/{authorId}/books": {
                    "get": {
                        "summary": "List the books of an author",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Books ordered by title",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": book_ref.clone() }
                                    }
                                }
                            },
                            "404": { "description": "Unknown author" }
                        }
                    },
                    "post": {
                        "summary": "Create a book for an author",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookForManipulation" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book created; Location points at it",
                                "content": { "application/json": { "schema": book_ref.clone() } }
                            },
                            "400": { "description": "Missing or unreadable body" },
                            "404": { "description": "Unknown author" },
                            "422": { "description": "Book breaks a validation rule" }
                        }
                    }
                },
                "/authors/{authorId}/books/{id}": {
                    "get": {
                        "summary": "Get a book of an author",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": { "application/json": { "schema": book_ref } }
                            },
                            "404": { "description": "Unknown author or book" }
                        }
                    },
                    "put": {
                        "summary": "Replace a book, creating it when absent",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookForManipulation" }
                                }
                            }
                        },
                        "responses": upsert_responses.clone()
                    },
                    "patch": {
                        "summary": "Apply JSON Patch operations to a book, creating it when absent",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json-patch+json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/PatchOperation" }
                                    }
                                }
                            }
                        },
                        "responses": upsert_responses
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "404": { "description": "Unknown author or book" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "authorId": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "description": { "type": ["string", "null"] }
                        },
                        "required": ["id", "authorId", "title"]
                    },
                    "BookForManipulation": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": 100 },
                            "description": { "type": "string", "maxLength": 500 }
                        },
                        "required": ["title"]
                    },
                    "PatchOperation": {
                        "type": "object",
                        "properties": {
                            "op": {
                                "type": "string",
                                "enum": ["add", "remove", "replace", "copy", "move", "test"]
                            },
                            "path": { "type": "string" },
                            "from": { "type": "string" },
                            "value": {}
                        },
                        "required": ["op", "path"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

async fn ensure_author(repository: &dyn LibraryRepository, author_id: Uuid) -> Result<(), AppError> {
    if repository.author_exists(author_id).await {
        Ok(())
    } else {
        Err(AppError::not_found(format!("author {} does not exist", author_id)))
    }
}

/// The upsert target id already belongs to a book of another author.
async fn ensure_book_id_free(repository: &dyn LibraryRepository, id: Uuid) -> Result<(), AppError> {
    if repository.book_exists(id).await {
        Err(AppError::conflict(
            vec![json!({ "field": "id", "error": "a book with this id already exists" })],
            format!("book {} belongs to another author", id),
        ))
    } else {
        Ok(())
    }
}

fn book_not_found(author_id: Uuid, id: Uuid) -> AppError {
    AppError::not_found(format!("author {} has no book {}", author_id, id))
}

/// GET /authors/{author_id}/books
async fn list_books(
    State(state): State<LibraryState>,
    IdPath(author_id): IdPath<Uuid>,
) -> Result<Json<Vec<BookDto>>, AppError> {
    let repository = state.repository();
    ensure_author(repository.as_ref(), author_id).await?;

    let books = repository.get_books_for_author(author_id).await;
    Ok(Json(books.iter().map(BookDto::from).collect()))
}

/// GET /authors/{author_id}/books/{id}
async fn get_book(
    State(state): State<LibraryState>,
    IdPath((author_id, id)): IdPath<(Uuid, Uuid)>,
) -> Result<Json<BookDto>, AppError> {
    let repository = state.repository();
    ensure_author(repository.as_ref(), author_id).await?;

    let book = repository
        .get_book_for_author(author_id, id)
        .await
        .ok_or_else(|| book_not_found(author_id, id))?;

    Ok(Json(BookDto::from(&book)))
}

/// POST /authors/{author_id}/books
async fn create_book(
    State(state): State<LibraryState>,
    OriginalUri(uri): OriginalUri,
    IdPath(author_id): IdPath<Uuid>,
    body: OptionalJson<BookForCreation>,
) -> Result<Response, AppError> {
    let mut repository = state.repository();
    ensure_author(repository.as_ref(), author_id).await?;

    let input = body.required()?;
    validate_book(&input)?;

    let book = input.into_entity(Uuid::now_v7(), author_id);
    repository.add_book_for_author(author_id, book.clone());
    if !repository.save().await {
        return Err(anyhow!("Creating book for author {} failed on save", author_id).into());
    }

    tracing::info!(%author_id, book_id = %book.id, "book created");

    Ok(utils::created(
        utils::child_location(&uri, book.id),
        BookDto::from(&book),
    ))
}

/// DELETE /authors/{author_id}/books/{id}
async fn delete_book(
    State(state): State<LibraryState>,
    IdPath((author_id, id)): IdPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let mut repository = state.repository();
    ensure_author(repository.as_ref(), author_id).await?;

    let book = repository
        .get_book_for_author(author_id, id)
        .await
        .ok_or_else(|| book_not_found(author_id, id))?;

    repository.delete_book(book);
    if !repository.save().await {
        return Err(anyhow!("Deleting book {} for author {} failed on save", id, author_id).into());
    }

    tracing::info!(%author_id, book_id = %id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /authors/{author_id}/books/{id}
///
/// Replaces every mutable field, or creates the book under `id` when the
/// author has no such book.
async fn replace_book(
    State(state): State<LibraryState>,
    OriginalUri(uri): OriginalUri,
    IdPath((author_id, id)): IdPath<(Uuid, Uuid)>,
    body: OptionalJson<BookForUpdate>,
) -> Result<Response, AppError> {
    let input = body.required()?;
    validate_book(&input)?;

    let mut repository = state.repository();
    ensure_author(repository.as_ref(), author_id).await?;

    let Some(mut book) = repository.get_book_for_author(author_id, id).await else {
        ensure_book_id_free(repository.as_ref(), id).await?;
        let book = input.into_entity(id, author_id);
        repository.add_book_for_author(author_id, book.clone());
        if !repository.save().await {
            return Err(anyhow!("Upserting book {} for author {} failed on save", id, author_id).into());
        }

        tracing::info!(%author_id, book_id = %id, "book upserted by replace");
        return Ok(utils::created(uri.path().to_string(), BookDto::from(&book)));
    };

    input.apply_to(&mut book);
    repository.update_book_for_author(book);
    if !repository.save().await {
        return Err(anyhow!("Updating book {} for author {} failed on save", id, author_id).into());
    }

    tracing::info!(%author_id, book_id = %id, "book replaced");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// PATCH /authors/{author_id}/books/{id}
///
/// Patches the update representation of the book, or of an empty book which
/// is then created under `id`. The patched representation is validated like
/// a PUT body on both paths.
async fn partially_update_book(
    State(state): State<LibraryState>,
    OriginalUri(uri): OriginalUri,
    IdPath((author_id, id)): IdPath<(Uuid, Uuid)>,
    body: OptionalJson<Patch>,
) -> Result<Response, AppError> {
    let document = body.required()?;

    let mut repository = state.repository();
    ensure_author(repository.as_ref(), author_id).await?;

    let existing = repository.get_book_for_author(author_id, id).await;

    let mut update = existing
        .as_ref()
        .map(BookForUpdate::from_entity)
        .unwrap_or_default();
    apply_patch(&mut update, &document).map_err(|err| AppError::bad_request(err.to_string()))?;
    validate_book(&update)?;

    let Some(mut book) = existing else {
        ensure_book_id_free(repository.as_ref(), id).await?;
        let book = update.into_entity(id, author_id);
        repository.add_book_for_author(author_id, book.clone());
        if !repository.save().await {
            return Err(anyhow!("Upserting book {} for author {} failed on save", id, author_id).into());
        }

        tracing::info!(%author_id, book_id = %id, "book upserted by patch");
        return Ok(utils::created(uri.path().to_string(), BookDto::from(&book)));
    };

    update.apply_to(&mut book);
    repository.update_book_for_author(book);
    if !repository.save().await {
        return Err(anyhow!("Patching book {} for author {} failed on save", id, author_id).into());
    }

    tracing::info!(%author_id, book_id = %id, "book patched");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Create a new instance of the books module
pub fn create_module(state: LibraryState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
