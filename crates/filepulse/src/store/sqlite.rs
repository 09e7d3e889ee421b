use chrono::{DateTime, SecondsFormat, Utc};

use super::{FilePage, FileStore, ListQuery};
use crate::db::file_repo::{self, ContentUpdate, FileFilter, FileRow};
use crate::db::stats_repo::{self, OwnerStats};
use crate::db::Database;
use crate::error::StoreError;
use crate::files::{FileMetadata, FileRecord, FileStatus, NewFileRecord};

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str, file_id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("Bad timestamp '{}' on file {}: {}", s, file_id, e);
            Utc::now()
        })
}

fn invalid(id: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidRow {
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn record_from_row(row: FileRow) -> Result<FileRecord, StoreError> {
    let file_type = row
        .file_type
        .parse()
        .map_err(|t| invalid(&row.id, format!("unknown file type '{}'", t)))?;
    let status = row
        .status
        .parse()
        .map_err(|s| invalid(&row.id, format!("unknown status '{}'", s)))?;

    let content = row
        .content
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| invalid(&row.id, format!("content: {}", e)))?;
    let metadata = row
        .file_metadata
        .as_deref()
        .map(serde_json::from_str::<FileMetadata>)
        .transpose()
        .map_err(|e| invalid(&row.id, format!("metadata: {}", e)))?;

    Ok(FileRecord {
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: row
            .updated_at
            .as_deref()
            .map(|s| parse_timestamp(s, &row.id)),
        processed_at: row
            .processed_at
            .as_deref()
            .map(|s| parse_timestamp(s, &row.id)),
        file_type,
        status,
        content,
        metadata,
        progress: row.progress.clamp(0, 100) as u8,
        file_size: row.file_size.max(0) as u64,
        id: row.id,
        filename: row.filename,
        original_filename: row.original_filename,
        mime_type: row.mime_type,
        error_message: row.error_message,
        processing_time: row.processing_time,
        owner_id: row.owner_id,
    })
}

/// [`FileStore`] backed by the SQLite `files` table.
#[derive(Clone)]
pub struct SqliteFileStore {
    db: Database,
}

impl SqliteFileStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl FileStore for SqliteFileStore {
    fn create(&self, new: NewFileRecord) -> Result<FileRecord, StoreError> {
        let row = FileRow {
            id: new.id,
            filename: new.filename,
            original_filename: new.original_filename,
            file_type: new.file_type.as_str().to_string(),
            mime_type: new.mime_type,
            file_size: i64::try_from(new.file_size).unwrap_or(i64::MAX),
            status: FileStatus::Uploading.as_str().to_string(),
            progress: 0,
            content: None,
            error_message: None,
            file_metadata: None,
            processing_time: None,
            owner_id: new.owner_id,
            created_at: format_timestamp(Utc::now()),
            updated_at: None,
            processed_at: None,
        };
        file_repo::insert(&self.db, &row)?;
        record_from_row(row)
    }

    fn get_by_owner(&self, id: &str, owner_id: i64) -> Result<Option<FileRecord>, StoreError> {
        file_repo::find_for_owner(&self.db, id, owner_id)?
            .map(record_from_row)
            .transpose()
    }

    fn update_progress(
        &self,
        id: &str,
        progress: u8,
        status: Option<FileStatus>,
        processing_time: Option<i64>,
    ) -> Result<bool, StoreError> {
        Ok(file_repo::update_progress(
            &self.db,
            id,
            i64::from(progress.min(100)),
            status.as_ref().map(FileStatus::as_str),
            processing_time,
            &format_timestamp(Utc::now()),
        )?)
    }

    fn update_content(
        &self,
        id: &str,
        content: &serde_json::Value,
        metadata: Option<&FileMetadata>,
        status: FileStatus,
        processing_time: i64,
    ) -> Result<bool, StoreError> {
        let content = serde_json::to_string(content)?;
        let metadata = metadata.map(serde_json::to_string).transpose()?;
        let at = format_timestamp(Utc::now());

        // Progress is left where it was unless the record is done.
        let progress = if status == FileStatus::Ready {
            100
        } else {
            match file_repo::find_by_id(&self.db, id)? {
                Some(row) => row.progress,
                None => return Ok(false),
            }
        };

        Ok(file_repo::update_content(
            &self.db,
            id,
            &ContentUpdate {
                content: &content,
                file_metadata: metadata.as_deref(),
                status: status.as_str(),
                progress,
                processing_time,
                at: &at,
            },
        )?)
    }

    fn update_error(&self, id: &str, message: &str) -> Result<bool, StoreError> {
        Ok(file_repo::update_error(
            &self.db,
            id,
            message,
            &format_timestamp(Utc::now()),
        )?)
    }

    fn list(&self, query: &ListQuery) -> Result<FilePage, StoreError> {
        let filter = FileFilter {
            owner_id: query.owner_id,
            file_type: query.file_type.map(|t| t.as_str().to_string()),
            status: query.status.map(|s| s.as_str().to_string()),
            limit: query.limit,
            offset: query.offset,
        };
        let (rows, total) = file_repo::query(&self.db, &filter)?;
        let files = rows
            .into_iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FilePage {
            files,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    fn search(&self, owner_id: i64, term: &str) -> Result<Vec<FileRecord>, StoreError> {
        file_repo::search(&self.db, owner_id, term)?
            .into_iter()
            .map(record_from_row)
            .collect()
    }

    fn stats(&self, owner_id: i64) -> Result<OwnerStats, StoreError> {
        Ok(stats_repo::owner_stats(&self.db, owner_id)?)
    }

    fn delete(&self, id: &str, owner_id: i64) -> Result<bool, StoreError> {
        Ok(file_repo::delete(&self.db, id, owner_id)?)
    }
}
