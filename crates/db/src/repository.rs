use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Author, Book};

/// Unit of work over the author/book store.
///
/// Reads always observe committed state. `add_*`, `update_*` and `delete_*`
/// only stage changes; nothing is visible to other units of work until
/// [`LibraryRepository::save`] commits every staged change at once.
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// All authors, ordered by first then last name.
    async fn get_authors(&self) -> Vec<Author>;

    async fn get_author(&self, id: Uuid) -> Option<Author>;

    /// Authors whose id is in `ids`. Unknown ids are skipped and duplicates
    /// collapse, so callers must compare the result against the request.
    async fn get_authors_by_ids(&self, ids: &[Uuid]) -> Vec<Author>;

    async fn author_exists(&self, id: Uuid) -> bool;

    fn add_author(&mut self, author: Author);

    /// Books of one author, ordered by title.
    async fn get_books_for_author(&self, author_id: Uuid) -> Vec<Book>;

    async fn get_book_for_author(&self, author_id: Uuid, id: Uuid) -> Option<Book>;

    /// Whether any author has a book with this id.
    async fn book_exists(&self, id: Uuid) -> bool;

    /// Stage a new book; the stored `author_id` is always `author_id`.
    fn add_book_for_author(&mut self, author_id: Uuid, book: Book);

    /// Stage a full replacement of an existing book.
    fn update_book_for_author(&mut self, book: Book);

    fn delete_book(&mut self, book: Book);

    /// Commit staged changes. `false` means nothing was committed.
    async fn save(&mut self) -> bool;
}

/// Hands out a fresh [`LibraryRepository`] per request.
pub trait RepositoryProvider: Send + Sync + 'static {
    fn repository(&self) -> Box<dyn LibraryRepository>;
}
