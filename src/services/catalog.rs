//! Catalog management service: books, copies, authors, publishers, subjects

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorQuery, CreateAuthor, UpdateAuthor},
        book::{
            Book, BookCopy, BookQuery, BookSummary, CreateBook, CreateCopy, UpdateBook, UpdateCopy,
        },
        publisher::{CreatePublisher, Publisher, PublisherQuery, UpdatePublisher},
        subject::{CreateSubject, Subject, SubjectQuery, UpdateSubject},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID with full details
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book with ISBN deduplication
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        if let Some(ref isbn) = book.isbn_13 {
            if self.repository.books.isbn_exists(isbn, None).await? {
                return Err(AppError::Conflict(
                    "A book with this ISBN-13 already exists".to_string(),
                ));
            }
        }
        if let Some(ref isbn) = book.isbn_10 {
            if self.repository.books.isbn_exists(isbn, None).await? {
                return Err(AppError::Conflict(
                    "A book with this ISBN-10 already exists".to_string(),
                ));
            }
        }

        // Referenced publisher must exist before insert
        self.repository.catalog.get_publisher(book.publisher_id).await?;

        self.repository.books.create(&book).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: Uuid, book: UpdateBook) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;

        if let Some(ref isbn) = book.isbn_13 {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(
                    "A book with this ISBN-13 already exists".to_string(),
                ));
            }
        }
        if let Some(ref isbn) = book.isbn_10 {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(
                    "A book with this ISBN-10 already exists".to_string(),
                ));
            }
        }

        self.repository.books.update(id, &book).await
    }

    /// Soft-delete a book
    pub async fn delete_book(&self, id: Uuid, force: bool) -> AppResult<()> {
        self.repository.books.soft_delete(id, force).await
    }

    /// List copies of a book
    pub async fn get_copies(&self, book_id: Uuid) -> AppResult<Vec<BookCopy>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.books.list_copies(book_id).await
    }

    /// Add a copy to a book; barcodes must be unique among live copies
    pub async fn create_copy(&self, book_id: Uuid, copy: CreateCopy) -> AppResult<BookCopy> {
        if let Some(ref barcode) = copy.barcode {
            if self.repository.books.copy_barcode_exists(barcode, None).await? {
                return Err(AppError::Conflict(
                    "A copy with this barcode already exists".to_string(),
                ));
            }
        }
        self.repository.books.create_copy(book_id, &copy).await
    }

    /// Update a copy (status, condition, notes)
    pub async fn update_copy(&self, copy_id: Uuid, update: UpdateCopy) -> AppResult<BookCopy> {
        self.repository.books.update_copy(copy_id, &update).await
    }

    /// Remove a copy from circulation
    pub async fn delete_copy(&self, copy_id: Uuid) -> AppResult<()> {
        self.repository.books.delete_copy(copy_id).await
    }

    // --- Authors ---

    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository.catalog.list_authors(query).await
    }

    pub async fn get_author(&self, id: Uuid) -> AppResult<Author> {
        self.repository.catalog.get_author(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        self.repository.catalog.create_author(&author).await
    }

    pub async fn update_author(&self, id: Uuid, author: UpdateAuthor) -> AppResult<Author> {
        self.repository.catalog.update_author(id, &author).await
    }

    pub async fn delete_author(&self, id: Uuid) -> AppResult<()> {
        self.repository.catalog.delete_author(id).await
    }

    // --- Publishers ---

    pub async fn list_publishers(&self, query: &PublisherQuery) -> AppResult<(Vec<Publisher>, i64)> {
        self.repository.catalog.list_publishers(query).await
    }

    pub async fn get_publisher(&self, id: Uuid) -> AppResult<Publisher> {
        self.repository.catalog.get_publisher(id).await
    }

    pub async fn create_publisher(&self, publisher: CreatePublisher) -> AppResult<Publisher> {
        if self
            .repository
            .catalog
            .publisher_name_exists(&publisher.name, None)
            .await?
        {
            return Err(AppError::Conflict(
                "A publisher with this name already exists".to_string(),
            ));
        }
        self.repository.catalog.create_publisher(&publisher).await
    }

    pub async fn update_publisher(&self, id: Uuid, publisher: UpdatePublisher) -> AppResult<Publisher> {
        if let Some(ref name) = publisher.name {
            if self
                .repository
                .catalog
                .publisher_name_exists(name, Some(id))
                .await?
            {
                return Err(AppError::Conflict(
                    "A publisher with this name already exists".to_string(),
                ));
            }
        }
        self.repository.catalog.update_publisher(id, &publisher).await
    }

    pub async fn delete_publisher(&self, id: Uuid) -> AppResult<()> {
        self.repository.catalog.delete_publisher(id).await
    }

    // --- Subjects ---

    pub async fn list_subjects(&self, query: &SubjectQuery) -> AppResult<(Vec<Subject>, i64)> {
        self.repository.catalog.list_subjects(query).await
    }

    pub async fn get_subject(&self, id: Uuid) -> AppResult<Subject> {
        self.repository.catalog.get_subject(id).await
    }

    pub async fn create_subject(&self, subject: CreateSubject) -> AppResult<Subject> {
        if self
            .repository
            .catalog
            .subject_name_exists(&subject.name, None)
            .await?
        {
            return Err(AppError::Conflict(
                "A subject with this name already exists".to_string(),
            ));
        }
        if let Some(parent_id) = subject.parent_subject_id {
            self.repository.catalog.get_subject(parent_id).await?;
        }
        self.repository.catalog.create_subject(&subject).await
    }

    pub async fn update_subject(&self, id: Uuid, subject: UpdateSubject) -> AppResult<Subject> {
        if let Some(ref name) = subject.name {
            if self
                .repository
                .catalog
                .subject_name_exists(name, Some(id))
                .await?
            {
                return Err(AppError::Conflict(
                    "A subject with this name already exists".to_string(),
                ));
            }
        }
        self.repository.catalog.update_subject(id, &subject).await
    }

    pub async fn delete_subject(&self, id: Uuid) -> AppResult<()> {
        self.repository.catalog.delete_subject(id).await
    }
}
