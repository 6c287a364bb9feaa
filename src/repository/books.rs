//! Books repository for catalog and copy operations

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{
            Book, BookAuthorRef, BookCopy, BookQuery, BookSubjectRef, BookSummary, CreateBook,
            CreateCopy, UpdateBook, UpdateCopy,
        },
        enums::CopyStatus,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID with publisher, authors and subjects
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        let mut book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        book.publisher_name = sqlx::query_scalar(
            "SELECT name FROM publishers WHERE id = $1",
        )
        .bind(book.publisher_id)
        .fetch_optional(&self.pool)
        .await?;

        book.authors = sqlx::query_as::<_, BookAuthorRef>(
            r#"
            SELECT a.id, a.full_name, ba.author_order
            FROM book_authors ba
            JOIN authors a ON ba.author_id = a.id
            WHERE ba.book_id = $1
            ORDER BY ba.author_order
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        book.subjects = sqlx::query_as::<_, BookSubjectRef>(
            r#"
            SELECT s.id, s.name
            FROM book_subjects bs
            JOIN subjects s ON bs.subject_id = s.id
            WHERE bs.book_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(book)
    }

    /// Search books with filters, sorting and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec!["b.is_deleted = FALSE".to_string()];
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search.to_lowercase()));
            conditions.push(format!(
                "(LOWER(b.title) LIKE ${n} OR LOWER(COALESCE(b.subtitle, '')) LIKE ${n} \
                 OR b.isbn_13 LIKE ${n} OR b.isbn_10 LIKE ${n})",
                n = params.len()
            ));
        }
        if let Some(ref language) = query.language {
            params.push(language.clone());
            conditions.push(format!("b.language = ${}", params.len()));
        }
        match query.availability.as_deref() {
            Some("available") => conditions.push("b.available_copies > 0".to_string()),
            Some("unavailable") => conditions.push("b.available_copies = 0".to_string()),
            _ => {}
        }
        if let Some(publisher_id) = query.publisher_id {
            params.push(publisher_id.to_string());
            conditions.push(format!("b.publisher_id = ${}::uuid", params.len()));
        }
        if let Some(subject_id) = query.subject_id {
            params.push(subject_id.to_string());
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM book_subjects bs WHERE bs.book_id = b.id AND bs.subject_id = ${}::uuid)",
                params.len()
            ));
        }

        let where_clause = conditions.join(" AND ");

        // Sort columns are whitelisted, never interpolated from raw input
        let sort_column = match query.sort_by.as_deref() {
            Some("publication_year") => "b.publication_year",
            Some("available_copies") => "b.available_copies",
            Some("created_at") => "b.created_at",
            _ => "b.title",
        };
        let sort_order = match query.sort_order.as_deref() {
            Some("desc") => "DESC",
            _ => "ASC",
        };

        let count_query = format!("SELECT COUNT(*) FROM books b WHERE {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            r#"
            SELECT b.id, b.title, b.subtitle, b.isbn_13, b.publication_year, b.language,
                   b.shelf_location, b.total_copies, b.available_copies,
                   p.name as publisher_name
            FROM books b
            LEFT JOIN publishers p ON b.publisher_id = p.id
            WHERE {}
            ORDER BY {} {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, sort_column, sort_order, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, BookSummary>(&list_query);
        for p in &params {
            list_builder = list_builder.bind(p);
        }
        let mut books = list_builder.fetch_all(&self.pool).await?;

        for book in &mut books {
            book.authors = sqlx::query_scalar(
                r#"
                SELECT a.full_name
                FROM book_authors ba
                JOIN authors a ON ba.author_id = a.id
                WHERE ba.book_id = $1
                ORDER BY ba.author_order
                "#,
            )
            .bind(book.id)
            .fetch_all(&self.pool)
            .await?;
        }

        Ok((books, total))
    }

    /// Check if an ISBN is already taken by another live book
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE (isbn_13 = $1 OR isbn_10 = $1) AND id != $2 AND is_deleted = FALSE)",
            )
            .bind(isbn)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE (isbn_13 = $1 OR isbn_10 = $1) AND is_deleted = FALSE)",
            )
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    /// Create a book with author/subject links and seeded copies.
    /// The book, its links and its copy rows are inserted in one transaction
    /// so `available_copies` always equals the number of copy rows created.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let total_copies = book.total_copies.unwrap_or(1);
        let mut tx = self.pool.begin().await?;

        let book_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO books (
                title, subtitle, isbn_13, isbn_10, publisher_id, publication_year,
                edition, pages, language, description, shelf_location,
                acquisition_price, total_copies, available_copies
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'English'), $10, $11, $12, $13, $13)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.subtitle)
        .bind(&book.isbn_13)
        .bind(&book.isbn_10)
        .bind(book.publisher_id)
        .bind(book.publication_year)
        .bind(&book.edition)
        .bind(book.pages)
        .bind(&book.language)
        .bind(&book.description)
        .bind(&book.shelf_location)
        .bind(book.acquisition_price)
        .bind(total_copies)
        .fetch_one(&mut *tx)
        .await?;

        for (i, author_id) in book.author_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO book_authors (book_id, author_id, author_order) VALUES ($1, $2, $3)",
            )
            .bind(book_id)
            .bind(author_id)
            .bind((i + 1) as i32)
            .execute(&mut *tx)
            .await?;
        }

        for subject_id in &book.subject_ids {
            sqlx::query("INSERT INTO book_subjects (book_id, subject_id) VALUES ($1, $2)")
                .bind(book_id)
                .bind(subject_id)
                .execute(&mut *tx)
                .await?;
        }

        for n in 1..=total_copies {
            sqlx::query(
                "INSERT INTO book_copies (book_id, copy_number, status) VALUES ($1, $2, 'available')",
            )
            .bind(book_id)
            .bind(format!("C{:03}", n))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(book_id).await
    }

    /// Update a book; author/subject id lists replace the existing links
    pub async fn update(&self, id: Uuid, book: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                subtitle = COALESCE($3, subtitle),
                isbn_13 = COALESCE($4, isbn_13),
                isbn_10 = COALESCE($5, isbn_10),
                publisher_id = COALESCE($6, publisher_id),
                publication_year = COALESCE($7, publication_year),
                edition = COALESCE($8, edition),
                pages = COALESCE($9, pages),
                language = COALESCE($10, language),
                description = COALESCE($11, description),
                shelf_location = COALESCE($12, shelf_location),
                acquisition_price = COALESCE($13, acquisition_price),
                updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.subtitle)
        .bind(&book.isbn_13)
        .bind(&book.isbn_10)
        .bind(book.publisher_id)
        .bind(book.publication_year)
        .bind(&book.edition)
        .bind(book.pages)
        .bind(&book.language)
        .bind(&book.description)
        .bind(&book.shelf_location)
        .bind(book.acquisition_price)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        if let Some(ref author_ids) = book.author_ids {
            sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for (i, author_id) in author_ids.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO book_authors (book_id, author_id, author_order) VALUES ($1, $2, $3)",
                )
                .bind(id)
                .bind(author_id)
                .bind((i + 1) as i32)
                .execute(&mut *tx)
                .await?;
            }
        }

        if let Some(ref subject_ids) = book.subject_ids {
            sqlx::query("DELETE FROM book_subjects WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for subject_id in subject_ids {
                sqlx::query("INSERT INTO book_subjects (book_id, subject_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(subject_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Soft-delete a book. Refused while copies are on loan unless forced.
    pub async fn soft_delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        let on_loan: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM borrow_requests br
            JOIN book_copies c ON br.book_copy_id = c.id
            WHERE c.book_id = $1 AND br.status IN ('approved', 'overdue')
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if on_loan > 0 && !force {
            return Err(AppError::Conflict(format!(
                "Book has {} copy(ies) on loan",
                on_loan
            )));
        }

        let result = sqlx::query(
            "UPDATE books SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// List copies of a book
    pub async fn list_copies(&self, book_id: Uuid) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE book_id = $1 AND is_deleted = FALSE ORDER BY copy_number",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Check if a copy barcode is already in use
    pub async fn copy_barcode_exists(&self, barcode: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM book_copies WHERE barcode = $1 AND id != $2 AND is_deleted = FALSE)",
            )
            .bind(barcode)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM book_copies WHERE barcode = $1 AND is_deleted = FALSE)",
            )
            .bind(barcode)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    /// Add a copy to a book. Inserts the copy and bumps both counters in one
    /// transaction with the book row locked.
    pub async fn create_copy(&self, book_id: Uuid, copy: &CreateCopy) -> AppResult<BookCopy> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT total_copies FROM books WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let next_number: i32 = row.get::<i32, _>("total_copies") + 1;

        let created = sqlx::query_as::<_, BookCopy>(
            r#"
            INSERT INTO book_copies (book_id, copy_number, barcode, status, condition_rating, notes)
            VALUES ($1, $2, $3, 'available', COALESCE($4, 'good'), $5)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(format!("C{:03}", next_number))
        .bind(&copy.barcode)
        .bind(copy.condition_rating)
        .bind(&copy.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE books SET total_copies = total_copies + 1, available_copies = available_copies + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Update a copy. A status change into or out of `available` adjusts the
    /// book's `available_copies` in the same transaction; withdrawn and lost
    /// copies stay in `total_copies`.
    pub async fn update_copy(&self, copy_id: Uuid, update: &UpdateCopy) -> AppResult<BookCopy> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(copy_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", copy_id)))?;

        if let Some(new_status) = update.status {
            if new_status == CopyStatus::Borrowed && current.status != CopyStatus::Borrowed {
                return Err(AppError::BusinessRule(
                    "Copies are marked borrowed through the borrow workflow".to_string(),
                ));
            }
            sqlx::query(
                "SELECT id FROM books WHERE id = $1 FOR UPDATE",
            )
            .bind(current.book_id)
            .fetch_one(&mut *tx)
            .await?;

            if current.status == CopyStatus::Available && new_status != CopyStatus::Available {
                sqlx::query(
                    "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() WHERE id = $1",
                )
                .bind(current.book_id)
                .execute(&mut *tx)
                .await?;
            } else if current.status != CopyStatus::Available && new_status == CopyStatus::Available {
                sqlx::query(
                    "UPDATE books SET available_copies = available_copies + 1, updated_at = NOW() WHERE id = $1",
                )
                .bind(current.book_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let updated = sqlx::query_as::<_, BookCopy>(
            r#"
            UPDATE book_copies SET
                status = COALESCE($2, status),
                condition_rating = COALESCE($3, condition_rating),
                last_maintenance = COALESCE($4, last_maintenance),
                notes = COALESCE($5, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(copy_id)
        .bind(update.status)
        .bind(update.condition_rating)
        .bind(update.last_maintenance)
        .bind(&update.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Soft-delete a copy and shrink the book's counters
    pub async fn delete_copy(&self, copy_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let copy = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM book_copies WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(copy_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", copy_id)))?;

        if copy.status == CopyStatus::Borrowed {
            return Err(AppError::Conflict("Copy is currently on loan".to_string()));
        }

        sqlx::query("UPDATE book_copies SET is_deleted = TRUE WHERE id = $1")
            .bind(copy_id)
            .execute(&mut *tx)
            .await?;

        let available_delta = if copy.status == CopyStatus::Available { 1 } else { 0 };
        sqlx::query(
            "UPDATE books SET total_copies = total_copies - 1, available_copies = available_copies - $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(copy.book_id)
        .bind(available_delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
