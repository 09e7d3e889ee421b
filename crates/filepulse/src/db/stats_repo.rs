//! Per-owner aggregate statistics over the `files` table.

use std::collections::BTreeMap;

use rusqlite::params;
use serde::Serialize;

use super::{Database, DatabaseError};

/// Aggregates for one owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OwnerStats {
    pub total_files: u64,
    pub file_types: BTreeMap<String, u64>,
    pub status_counts: BTreeMap<String, u64>,
    pub total_size: u64,
    pub total_processing_time: i64,
    /// Total processing time divided by total files; 0 when there are none.
    pub average_processing_time: f64,
}

fn grouped_counts(
    conn: &rusqlite::Connection,
    column: &str,
    owner_id: i64,
) -> Result<BTreeMap<String, u64>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {col}, COUNT(*) FROM files WHERE owner_id = ?1 GROUP BY {col}",
        col = column
    ))?;
    let counts = stmt
        .query_map(params![owner_id], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<Result<BTreeMap<String, u64>, _>>()?;
    Ok(counts)
}

pub fn owner_stats(db: &Database, owner_id: i64) -> Result<OwnerStats, DatabaseError> {
    db.with_conn(|conn| {
        let (total_files, total_size, total_processing_time): (u64, i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0), COALESCE(SUM(processing_time), 0)
             FROM files WHERE owner_id = ?1",
            params![owner_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let average_processing_time = if total_files > 0 {
            total_processing_time as f64 / total_files as f64
        } else {
            0.0
        };

        Ok(OwnerStats {
            total_files,
            file_types: grouped_counts(conn, "file_type", owner_id)?,
            status_counts: grouped_counts(conn, "status", owner_id)?,
            total_size: total_size.max(0) as u64,
            total_processing_time,
            average_processing_time,
        })
    })
}
