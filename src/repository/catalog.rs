//! Catalog side-entity repository: authors, publishers, subjects

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorQuery, CreateAuthor, UpdateAuthor},
        publisher::{CreatePublisher, Publisher, PublisherQuery, UpdatePublisher},
        subject::{CreateSubject, Subject, SubjectQuery, UpdateSubject},
    },
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // --- Authors ---

    pub async fn get_author(&self, id: Uuid) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let (where_clause, pattern) = match query.name {
            Some(ref name) => (
                "WHERE LOWER(full_name) LIKE $1".to_string(),
                Some(format!("%{}%", name.to_lowercase())),
            ),
            None => (String::new(), None),
        };

        let count_query = format!("SELECT COUNT(*) FROM authors {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref p) = pattern {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT * FROM authors {} ORDER BY full_name LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, Author>(&list_query);
        if let Some(ref p) = pattern {
            list_builder = list_builder.bind(p);
        }
        let authors = list_builder.fetch_all(&self.pool).await?;

        Ok((authors, total))
    }

    pub async fn create_author(&self, author: &CreateAuthor) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (full_name, birth_date, death_date, nationality, biography)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&author.full_name)
        .bind(author.birth_date)
        .bind(author.death_date)
        .bind(&author.nationality)
        .bind(&author.biography)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update_author(&self, id: Uuid, author: &UpdateAuthor) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET
                full_name = COALESCE($2, full_name),
                birth_date = COALESCE($3, birth_date),
                death_date = COALESCE($4, death_date),
                nationality = COALESCE($5, nationality),
                biography = COALESCE($6, biography)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&author.full_name)
        .bind(author.birth_date)
        .bind(author.death_date)
        .bind(&author.nationality)
        .bind(&author.biography)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Delete an author; refused while any book references it
    pub async fn delete_author(&self, id: Uuid) -> AppResult<()> {
        let in_use: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_authors WHERE author_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Author is referenced by {} book(s)",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }

    // --- Publishers ---

    pub async fn get_publisher(&self, id: Uuid) -> AppResult<Publisher> {
        sqlx::query_as::<_, Publisher>("SELECT * FROM publishers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Publisher with id {} not found", id)))
    }

    pub async fn list_publishers(&self, query: &PublisherQuery) -> AppResult<(Vec<Publisher>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let (where_clause, pattern) = match query.name {
            Some(ref name) => (
                "WHERE LOWER(name) LIKE $1".to_string(),
                Some(format!("%{}%", name.to_lowercase())),
            ),
            None => (String::new(), None),
        };

        let count_query = format!("SELECT COUNT(*) FROM publishers {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref p) = pattern {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT * FROM publishers {} ORDER BY name LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, Publisher>(&list_query);
        if let Some(ref p) = pattern {
            list_builder = list_builder.bind(p);
        }
        let publishers = list_builder.fetch_all(&self.pool).await?;

        Ok((publishers, total))
    }

    pub async fn publisher_name_exists(&self, name: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM publishers WHERE LOWER(name) = LOWER($1) AND id != $2)",
            )
            .bind(name)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM publishers WHERE LOWER(name) = LOWER($1))",
            )
            .bind(name)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    pub async fn create_publisher(&self, publisher: &CreatePublisher) -> AppResult<Publisher> {
        let created = sqlx::query_as::<_, Publisher>(
            r#"
            INSERT INTO publishers (name, address, city, country, website, established_year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&publisher.name)
        .bind(&publisher.address)
        .bind(&publisher.city)
        .bind(&publisher.country)
        .bind(&publisher.website)
        .bind(publisher.established_year)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update_publisher(&self, id: Uuid, publisher: &UpdatePublisher) -> AppResult<Publisher> {
        sqlx::query_as::<_, Publisher>(
            r#"
            UPDATE publishers SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                country = COALESCE($5, country),
                website = COALESCE($6, website),
                established_year = COALESCE($7, established_year)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&publisher.name)
        .bind(&publisher.address)
        .bind(&publisher.city)
        .bind(&publisher.country)
        .bind(&publisher.website)
        .bind(publisher.established_year)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Publisher with id {} not found", id)))
    }

    /// Delete a publisher; refused while any book references it
    pub async fn delete_publisher(&self, id: Uuid) -> AppResult<()> {
        let in_use: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE publisher_id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Publisher is referenced by {} book(s)",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM publishers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Publisher with id {} not found", id)));
        }
        Ok(())
    }

    // --- Subjects ---

    pub async fn get_subject(&self, id: Uuid) -> AppResult<Subject> {
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subject with id {} not found", id)))
    }

    pub async fn list_subjects(&self, query: &SubjectQuery) -> AppResult<(Vec<Subject>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let (where_clause, pattern) = match query.name {
            Some(ref name) => (
                "WHERE LOWER(name) LIKE $1".to_string(),
                Some(format!("%{}%", name.to_lowercase())),
            ),
            None => (String::new(), None),
        };

        let count_query = format!("SELECT COUNT(*) FROM subjects {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref p) = pattern {
            count_builder = count_builder.bind(p);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT * FROM subjects {} ORDER BY name LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut list_builder = sqlx::query_as::<_, Subject>(&list_query);
        if let Some(ref p) = pattern {
            list_builder = list_builder.bind(p);
        }
        let subjects = list_builder.fetch_all(&self.pool).await?;

        Ok((subjects, total))
    }

    pub async fn subject_name_exists(&self, name: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM subjects WHERE LOWER(name) = LOWER($1) AND id != $2)",
            )
            .bind(name)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM subjects WHERE LOWER(name) = LOWER($1))",
            )
            .bind(name)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    pub async fn create_subject(&self, subject: &CreateSubject) -> AppResult<Subject> {
        let created = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (name, description, parent_subject_id, dewey_decimal)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&subject.name)
        .bind(&subject.description)
        .bind(subject.parent_subject_id)
        .bind(&subject.dewey_decimal)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update_subject(&self, id: Uuid, subject: &UpdateSubject) -> AppResult<Subject> {
        sqlx::query_as::<_, Subject>(
            r#"
            UPDATE subjects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                parent_subject_id = COALESCE($4, parent_subject_id),
                dewey_decimal = COALESCE($5, dewey_decimal)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&subject.name)
        .bind(&subject.description)
        .bind(subject.parent_subject_id)
        .bind(&subject.dewey_decimal)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Subject with id {} not found", id)))
    }

    /// Delete a subject; refused while books or child subjects reference it
    pub async fn delete_subject(&self, id: Uuid) -> AppResult<()> {
        let in_use: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM book_subjects WHERE subject_id = $1)
                 + (SELECT COUNT(*) FROM subjects WHERE parent_subject_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if in_use > 0 {
            return Err(AppError::Conflict(
                "Subject is referenced by books or child subjects".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Subject with id {} not found", id)));
        }
        Ok(())
    }
}
