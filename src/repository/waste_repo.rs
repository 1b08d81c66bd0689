// ==========================================
// 冷冻食品生产批次流程系统 - 损耗记录仓储
// ==========================================
// 表: waste_entry
// 红线: 损耗记录只增不改 (无 update / delete)
// ==========================================

use crate::db::format_ts;
use crate::domain::types::WasteReason;
use crate::domain::waste::{ReasonCount, WasteEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row::{enum_column, ts_column};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const WASTE_COLUMNS: &str = r#"
    SELECT waste_id, batch_id, order_id, station, material_sku, grams_wasted,
           reason_code, recorded_by, notes, recorded_at
    FROM waste_entry
"#;

pub struct WasteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WasteRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, entry: &WasteEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO waste_entry (
                waste_id, batch_id, order_id, station, material_sku, grams_wasted,
                reason_code, recorded_by, notes, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                entry.waste_id,
                entry.batch_id,
                entry.order_id,
                entry.station.to_db_str(),
                entry.material_sku,
                entry.grams_wasted,
                entry.reason_code.to_db_str(),
                entry.recorded_by,
                entry.notes,
                format_ts(&entry.recorded_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<WasteEntry>> {
        self.query_entries("WHERE batch_id = ?1", batch_id)
    }

    pub fn find_by_order(&self, order_id: &str) -> RepositoryResult<Vec<WasteEntry>> {
        self.query_entries("WHERE order_id = ?1", order_id)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<WasteEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY recorded_at, rowid", WASTE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], map_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 批次内某原料的累计损耗 (克)
    pub fn total_grams_for_material(&self, batch_id: &str, material_sku: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(grams_wasted), 0.0) FROM waste_entry
            WHERE batch_id = ?1 AND material_sku = ?2
            "#,
            params![batch_id, material_sku],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 按原因统计次数 (次数降序, 同次数按原因代码升序)
    pub fn stats_by_reason(&self) -> RepositoryResult<Vec<ReasonCount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reason_code, COUNT(*) AS total_occurrences
            FROM waste_entry
            GROUP BY reason_code
            ORDER BY total_occurrences DESC, reason_code ASC
            "#,
        )?;
        let counts = stmt
            .query_map([], |row| {
                let reason_code: WasteReason = enum_column(row, 0)?;
                let total: i64 = row.get(1)?;
                Ok(ReasonCount {
                    reason_code,
                    total_occurrences: total as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    fn query_entries(&self, where_clause: &str, key: &str) -> RepositoryResult<Vec<WasteEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} {} ORDER BY recorded_at, rowid", WASTE_COLUMNS, where_clause);
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![key], map_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn map_entry(row: &Row) -> rusqlite::Result<WasteEntry> {
    Ok(WasteEntry {
        waste_id: row.get(0)?,
        batch_id: row.get(1)?,
        order_id: row.get(2)?,
        station: enum_column(row, 3)?,
        material_sku: row.get(4)?,
        grams_wasted: row.get(5)?,
        reason_code: enum_column(row, 6)?,
        recorded_by: row.get(7)?,
        notes: row.get(8)?,
        recorded_at: ts_column(row, 9)?,
    })
}
