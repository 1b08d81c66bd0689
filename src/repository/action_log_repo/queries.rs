use super::core::ActionLogRepository;
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use crate::repository::row::ts_column;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str =
    "SELECT action_id, order_id, action_type, action_ts, actor, payload_json, detail FROM action_log";

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询订单的全部操作日志 (时间正序)
    pub fn find_by_order_id(&self, order_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE order_id = ? ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![order_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}

fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    Ok(ActionLog {
        action_id: row.get(0)?,
        order_id: row.get(1)?,
        action_type: row.get(2)?,
        action_ts: ts_column(row, 3)?,
        actor: row.get(4)?,
        payload_json: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}
