use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::{Author, Book};
use crate::repository::{LibraryRepository, RepositoryProvider};

#[derive(Debug, Clone, Default)]
struct LibraryData {
    authors: HashMap<Uuid, Author>,
    books: HashMap<Uuid, Book>,
}

#[derive(Debug, Clone)]
enum Change {
    AddAuthor(Author),
    AddBook(Book),
    UpdateBook(Book),
    DeleteBook(Uuid),
}

impl LibraryData {
    fn apply(&mut self, change: Change) -> Result<(), String> {
        match change {
            Change::AddAuthor(author) => {
                if self.authors.contains_key(&author.id) {
                    return Err(format!("author {} already exists", author.id));
                }
                self.authors.insert(author.id, author);
            }
            Change::AddBook(book) => {
                if !self.authors.contains_key(&book.author_id) {
                    return Err(format!("author {} does not exist", book.author_id));
                }
                if self.books.contains_key(&book.id) {
                    return Err(format!("book {} already exists", book.id));
                }
                self.books.insert(book.id, book);
            }
            Change::UpdateBook(book) => match self.books.get_mut(&book.id) {
                Some(stored) if stored.author_id == book.author_id => *stored = book,
                _ => return Err(format!("book {} does not exist", book.id)),
            },
            Change::DeleteBook(id) => {
                if self.books.remove(&id).is_none() {
                    return Err(format!("book {} does not exist", id));
                }
            }
        }
        Ok(())
    }
}

/// Process-local store shared by every unit of work it hands out.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibrary {
    data: Arc<RwLock<LibraryData>>,
    read_only: Arc<AtomicBool>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with [`crate::seed::sample_library`].
    pub fn seeded() -> Self {
        let (authors, books) = crate::seed::sample_library();
        let data = LibraryData {
            authors: authors.into_iter().map(|a| (a.id, a)).collect(),
            books: books.into_iter().map(|b| (b.id, b)).collect(),
        };
        Self {
            data: Arc::new(RwLock::new(data)),
            read_only: Arc::default(),
        }
    }

    /// While read-only, every `save` fails and commits nothing.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn session(&self) -> InMemorySession {
        InMemorySession {
            data: Arc::clone(&self.data),
            read_only: Arc::clone(&self.read_only),
            pending: Vec::new(),
        }
    }

    pub async fn author_count(&self) -> usize {
        self.data.read().await.authors.len()
    }

    pub async fn book_count(&self) -> usize {
        self.data.read().await.books.len()
    }
}

impl RepositoryProvider for InMemoryLibrary {
    fn repository(&self) -> Box<dyn LibraryRepository> {
        Box::new(self.session())
    }
}

/// Unit of work over an [`InMemoryLibrary`].
#[derive(Debug)]
pub struct InMemorySession {
    data: Arc<RwLock<LibraryData>>,
    read_only: Arc<AtomicBool>,
    pending: Vec<Change>,
}

fn sort_authors(authors: &mut [Author]) {
    authors.sort_by(|a, b| {
        a.first_name
            .cmp(&b.first_name)
            .then_with(|| a.last_name.cmp(&b.last_name))
    });
}

#[async_trait]
impl LibraryRepository for InMemorySession {
    async fn get_authors(&self) -> Vec<Author> {
        let mut authors: Vec<Author> = self.data.read().await.authors.values().cloned().collect();
        sort_authors(&mut authors);
        authors
    }

    async fn get_author(&self, id: Uuid) -> Option<Author> {
        self.data.read().await.authors.get(&id).cloned()
    }

    async fn get_authors_by_ids(&self, ids: &[Uuid]) -> Vec<Author> {
        let data = self.data.read().await;
        let mut authors: Vec<Author> = data
            .authors
            .values()
            .filter(|author| ids.contains(&author.id))
            .cloned()
            .collect();
        sort_authors(&mut authors);
        authors
    }

    async fn author_exists(&self, id: Uuid) -> bool {
        self.data.read().await.authors.contains_key(&id)
    }

    fn add_author(&mut self, author: Author) {
        self.pending.push(Change::AddAuthor(author));
    }

    async fn get_books_for_author(&self, author_id: Uuid) -> Vec<Book> {
        let data = self.data.read().await;
        let mut books: Vec<Book> = data
            .books
            .values()
            .filter(|book| book.author_id == author_id)
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        books
    }

    async fn get_book_for_author(&self, author_id: Uuid, id: Uuid) -> Option<Book> {
        self.data
            .read()
            .await
            .books
            .get(&id)
            .filter(|book| book.author_id == author_id)
            .cloned()
    }

    async fn book_exists(&self, id: Uuid) -> bool {
        self.data.read().await.books.contains_key(&id)
    }

    fn add_book_for_author(&mut self, author_id: Uuid, mut book: Book) {
        book.author_id = author_id;
        self.pending.push(Change::AddBook(book));
    }

    fn update_book_for_author(&mut self, book: Book) {
        self.pending.push(Change::UpdateBook(book));
    }

    fn delete_book(&mut self, book: Book) {
        self.pending.push(Change::DeleteBook(book.id));
    }

    async fn save(&mut self) -> bool {
        let changes = std::mem::take(&mut self.pending);

        if self.read_only.load(Ordering::SeqCst) {
            tracing::warn!(staged = changes.len(), "store is read-only; save rejected");
            return false;
        }

        let mut data = self.data.write().await;
        let mut next = data.clone();
        for change in changes {
            if let Err(reason) = next.apply(change) {
                tracing::warn!(%reason, "save rejected; no changes committed");
                return false;
            }
        }
        *data = next;
        true
    }
}
