use std::collections::HashSet;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    extract::{OriginalUri, Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use library_http::{id_list, AppError, OptionalJson};
use library_kernel::{InitCtx, Module};
use serde_json::json;
use uuid::Uuid;

use super::authors::{
    models::{AuthorDto, AuthorForCreation},
    today,
};
use super::LibraryState;
use crate::utils;

/// Batch creation and all-or-nothing batch lookup of authors
pub struct AuthorsCollectionModule {
    state: LibraryState,
}

impl AuthorsCollectionModule {
    pub fn new(state: LibraryState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthorsCollectionModule {
    fn name(&self) -> &'static str {
        "authors-collection"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors collection module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/authorscollection", post(create_author_collection))
            .route("/authorscollection/{ids}", get(get_author_collection))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/authorscollection": {
                    "post": {
                        "summary": "Create several authors at once",
                        "tags": ["Authors"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/AuthorForCreation" }
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Authors created; Location lists their ids" },
                            "400": { "description": "Missing or empty body" }
                        }
                    }
                },
                "/authorscollection/({ids})": {
                    "get": {
                        "summary": "Get several authors by a comma-separated id list",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "Every requested author",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Author" }
                                        }
                                    }
                                }
                            },
                            "400": { "description": "Blank or malformed id list" },
                            "404": { "description": "At least one id is unknown" }
                        }
                    }
                }
            }
        }))
    }
}

/// POST /authorscollection
async fn create_author_collection(
    State(state): State<LibraryState>,
    OriginalUri(uri): OriginalUri,
    body: OptionalJson<Vec<AuthorForCreation>>,
) -> Result<Response, AppError> {
    let inputs = body.required()?;
    if inputs.is_empty() {
        return Err(AppError::bad_request("at least one author is required"));
    }

    let authors: Vec<_> = inputs
        .into_iter()
        .map(|input| input.into_entity(Uuid::now_v7()))
        .collect();

    let mut repository = state.repository();
    for author in &authors {
        repository.add_author(author.clone());
    }

    if !repository.save().await {
        return Err(anyhow!("Creating an author collection failed on save").into());
    }

    tracing::info!(count = authors.len(), "author collection created");

    let ids = authors
        .iter()
        .map(|author| author.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let today = today();
    let body: Vec<AuthorDto> = authors
        .iter()
        .map(|author| AuthorDto::from_entity(author, today))
        .collect();

    Ok(utils::created(
        utils::child_location(&uri, format!("({})", ids)),
        body,
    ))
}

/// GET /authorscollection/({ids})
async fn get_author_collection(
    State(state): State<LibraryState>,
    Path(segment): Path<String>,
) -> Result<Json<Vec<AuthorDto>>, AppError> {
    let raw = id_list::ungroup(&segment)
        .map_err(|_| AppError::not_found("no resource matches the request path"))?;

    let ids: Vec<Uuid> = id_list::decode_ids(raw)
        .map_err(|err| AppError::bad_request(err.to_string()))?
        .ok_or_else(|| AppError::bad_request("at least one author id is required"))?;

    let requested = distinct(&ids);
    let authors = state.repository().get_authors_by_ids(&requested).await;

    let found: HashSet<Uuid> = authors.iter().map(|author| author.id).collect();
    let missing = requested.iter().filter(|id| !found.contains(id)).count();
    if missing > 0 {
        tracing::debug!(requested = requested.len(), missing, "author collection incomplete");
        return Err(AppError::not_found(format!(
            "{} of {} requested authors do not exist",
            missing,
            requested.len()
        )));
    }

    let today = today();
    Ok(Json(
        authors
            .iter()
            .map(|author| AuthorDto::from_entity(author, today))
            .collect(),
    ))
}

/// Ids in first-seen order without repeats.
fn distinct(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Create a new instance of the authors collection module
pub fn create_module(state: LibraryState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsCollectionModule::new(state))
}
