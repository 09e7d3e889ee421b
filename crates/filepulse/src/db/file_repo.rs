//! File repository: SQL for the `files` table.
//!
//! Progress, content and error updates are guarded so they never touch a
//! row that already reached `ready` or `failed`. They report whether a row
//! was changed instead of erroring when nothing matched.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

const NOT_TERMINAL: &str = "status NOT IN ('ready', 'failed')";

/// A raw file row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub id: String,
    pub filename: String,
    pub original_filename: String,
    pub file_type: String,
    pub mime_type: Option<String>,
    pub file_size: i64,
    pub status: String,
    pub progress: i64,
    pub content: Option<String>,
    pub error_message: Option<String>,
    pub file_metadata: Option<String>,
    pub processing_time: Option<i64>,
    pub owner_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub processed_at: Option<String>,
}

impl FileRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            original_filename: row.get("original_filename")?,
            file_type: row.get("file_type")?,
            mime_type: row.get("mime_type")?,
            file_size: row.get("file_size")?,
            status: row.get("status")?,
            progress: row.get("progress")?,
            content: row.get("content")?,
            error_message: row.get("error_message")?,
            file_metadata: row.get("file_metadata")?,
            processing_time: row.get("processing_time")?,
            owner_id: row.get("owner_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            processed_at: row.get("processed_at")?,
        })
    }
}

/// Listing filter. `owner_id` is mandatory.
#[derive(Debug, Clone)]
pub struct FileFilter {
    pub owner_id: i64,
    pub file_type: Option<String>,
    pub status: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

impl FileFilter {
    pub fn for_owner(owner_id: i64) -> Self {
        Self {
            owner_id,
            file_type: None,
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Fields written by a successful parse.
#[derive(Debug, Clone)]
pub struct ContentUpdate<'a> {
    pub content: &'a str,
    pub file_metadata: Option<&'a str>,
    pub status: &'a str,
    pub progress: i64,
    pub processing_time: i64,
    pub at: &'a str,
}

pub fn insert(db: &Database, file: &FileRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO files (id, filename, original_filename, file_type, mime_type, file_size,
             status, progress, content, error_message, file_metadata, processing_time, owner_id,
             created_at, updated_at, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                file.id,
                file.filename,
                file.original_filename,
                file.file_type,
                file.mime_type,
                file.file_size,
                file.status,
                file.progress,
                file.content,
                file.error_message,
                file.file_metadata,
                file.processing_time,
                file.owner_id,
                file.created_at,
                file.updated_at,
                file.processed_at,
            ],
        )?;
        Ok(())
    })
}

fn first_row(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<FileRow>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, FileRow::from_row)?;
    match rows.next() {
        Some(Ok(row)) => Ok(Some(row)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<FileRow>, DatabaseError> {
    db.with_conn(|conn| first_row(conn, "SELECT * FROM files WHERE id = ?1", &[&id]))
}

/// Finds a file only if it belongs to `owner_id`.
pub fn find_for_owner(
    db: &Database,
    id: &str,
    owner_id: i64,
) -> Result<Option<FileRow>, DatabaseError> {
    db.with_conn(|conn| {
        first_row(
            conn,
            "SELECT * FROM files WHERE id = ?1 AND owner_id = ?2",
            &[&id, &owner_id],
        )
    })
}

/// Writes progress and optionally status and processing time.
pub fn update_progress(
    db: &Database,
    id: &str,
    progress: i64,
    status: Option<&str>,
    processing_time: Option<i64>,
    at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            &format!(
                "UPDATE files SET progress = ?2, status = COALESCE(?3, status),
                 processing_time = COALESCE(?4, processing_time), updated_at = ?5
                 WHERE id = ?1 AND {}",
                NOT_TERMINAL
            ),
            params![id, progress, status, processing_time, at],
        )?;
        Ok(changed > 0)
    })
}

pub fn update_content(
    db: &Database,
    id: &str,
    update: &ContentUpdate<'_>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            &format!(
                "UPDATE files SET content = ?2, file_metadata = ?3, status = ?4, progress = ?5,
                 processing_time = ?6, error_message = NULL, updated_at = ?7,
                 processed_at = CASE WHEN ?4 IN ('ready', 'failed') THEN ?7 ELSE processed_at END
                 WHERE id = ?1 AND {}",
                NOT_TERMINAL
            ),
            params![
                id,
                update.content,
                update.file_metadata,
                update.status,
                update.progress,
                update.processing_time,
                update.at,
            ],
        )?;
        Ok(changed > 0)
    })
}

/// Marks a file failed. Any stored content is cleared.
pub fn update_error(
    db: &Database,
    id: &str,
    error_message: &str,
    at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            &format!(
                "UPDATE files SET status = 'failed', error_message = ?2, content = NULL,
                 updated_at = ?3, processed_at = ?3
                 WHERE id = ?1 AND {}",
                NOT_TERMINAL
            ),
            params![id, error_message, at],
        )?;
        Ok(changed > 0)
    })
}

/// Queries an owner's files with filters, returning (rows, total_count).
pub fn query(db: &Database, filter: &FileFilter) -> Result<(Vec<FileRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = vec!["owner_id = ?1".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(filter.owner_id)];

        if let Some(ref file_type) = filter.file_type {
            conditions.push(format!("file_type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(file_type.clone()));
        }
        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let count_sql = format!("SELECT COUNT(*) FROM files {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        param_values.push(Box::new(filter.limit as i64));
        param_values.push(Box::new(filter.offset as i64));
        let query_sql = format!(
            "SELECT * FROM files {} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<FileRow> = stmt
            .query_map(params_ref.as_slice(), FileRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Finds an owner's files whose original name or stored content contains `term`.
pub fn search(db: &Database, owner_id: i64, term: &str) -> Result<Vec<FileRow>, DatabaseError> {
    let pattern = like_pattern(term);
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM files
             WHERE owner_id = ?1
               AND (original_filename LIKE ?2 ESCAPE '\\' OR content LIKE ?2 ESCAPE '\\')
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![owner_id, pattern], FileRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a file owned by `owner_id`. Returns false if nothing matched.
pub fn delete(db: &Database, id: &str, owner_id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "DELETE FROM files WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(changed > 0)
    })
}
