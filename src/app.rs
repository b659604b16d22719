use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use library_db::{InMemoryLibrary, RepositoryProvider};
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, LibraryState};

/// Registry holding every resource module, backed by `repositories`.
pub fn build_registry(repositories: Arc<dyn RepositoryProvider>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, LibraryState::new(repositories));
    registry
}

/// The complete HTTP application for `settings`, without lifecycle hooks.
pub fn router(settings: &Settings, repositories: Arc<dyn RepositoryProvider>) -> Router {
    library_http::build_router(&build_registry(repositories), settings)
}

/// Run the API until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let library = if settings.repository.seed {
        tracing::info!("seeding in-memory library with sample authors");
        InMemoryLibrary::seeded()
    } else {
        InMemoryLibrary::new()
    };

    let registry = build_registry(Arc::new(library));
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .init_modules(&ctx)
        .await
        .context("failed to initialize modules")?;
    registry
        .start_modules(&ctx)
        .await
        .context("failed to start modules")?;

    let served = library_http::start_server(&registry, &settings).await;

    registry
        .stop_modules()
        .await
        .context("failed to stop modules")?;
    served
}
