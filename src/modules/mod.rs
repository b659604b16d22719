pub mod authors;
pub mod authors_collection;
pub mod books;

use std::sync::Arc;

use library_db::{LibraryRepository, RepositoryProvider};
use library_kernel::ModuleRegistry;

/// State shared by every resource handler.
#[derive(Clone)]
pub struct LibraryState {
    repositories: Arc<dyn RepositoryProvider>,
}

impl LibraryState {
    pub fn new(repositories: Arc<dyn RepositoryProvider>) -> Self {
        Self { repositories }
    }

    /// A fresh unit of work for the current request.
    pub fn repository(&self) -> Box<dyn LibraryRepository> {
        self.repositories.repository()
    }
}

/// Register all resource modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: LibraryState) {
    registry.register(authors::create_module(state.clone()));
    registry.register(authors_collection::create_module(state.clone()));
    registry.register(books::create_module(state));
}
