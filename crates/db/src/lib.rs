//! Persistence for the library API: entities, the repository port and an
//! in-memory store implementing it.

pub mod entities;
pub mod memory;
pub mod repository;
pub mod seed;

pub use entities::{Author, Book};
pub use memory::InMemoryLibrary;
pub use repository::{LibraryRepository, RepositoryProvider};
