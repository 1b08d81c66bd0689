// ==========================================
// 冷冻食品生产批次流程系统 - 批次仓储
// ==========================================
// 表: production_batch
// 红线: 批次推进与订单汇总状态在同一事务内提交
// ==========================================

use crate::db::format_ts;
use crate::domain::batch::Batch;
use crate::domain::order::ProductionOrder;
use crate::domain::station::Station;
use crate::domain::types::{BatchState, OrderState};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_repo::{find_order_with, update_state_with};
use crate::repository::row::{enum_column, opt_ts_column, ts_column};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const BATCH_COLUMNS: &str = r#"
    SELECT batch_id, order_id, sequence_no, units_in_batch, weight_kg,
           current_station, state, created_at, updated_at, completed_at
    FROM production_batch
"#;

/// 批次推进提交结果
#[derive(Debug, Clone)]
pub struct BatchCommitResult {
    pub batch: Batch,
    pub order_state: OrderState, // 提交后的订单状态
}

impl BatchCommitResult {
    pub fn order_consumed(&self) -> bool {
        self.order_state == OrderState::Consumed
    }
}

pub struct BatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;
        find_batch_with(&conn, batch_id)
    }

    /// 订单的全部批次 (按序号)
    pub fn list_by_order(&self, order_id: &str) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        list_by_order_with(&conn, order_id)
    }

    /// 工位待处理/处理中的批次
    ///
    /// 仅返回所属订单为 ACTIVE 的批次, 按订单激活时间与批次序号排序
    pub fn list_by_station(&self, station: Station) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT b.batch_id, b.order_id, b.sequence_no, b.units_in_batch, b.weight_kg,
                   b.current_station, b.state, b.created_at, b.updated_at, b.completed_at
            FROM production_batch b
            JOIN production_order o ON o.order_id = b.order_id
            WHERE b.current_station = ?1
              AND b.state IN ('PENDING', 'IN_PROGRESS')
              AND o.state = 'ACTIVE'
            ORDER BY o.activated_at, b.order_id, b.sequence_no
            "#,
        )?;
        let batches = stmt
            .query_map(params![station.to_db_str()], map_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 提交开始加工 (PENDING → IN_PROGRESS)
    ///
    /// 单事务内确认订单仍为 ACTIVE, 再以乐观锁更新批次状态
    pub fn commit_start(&self, batch: &Batch, new_state: BatchState) -> RepositoryResult<Batch> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        ensure_order_active(&tx, &batch.order_id)?;

        let now = format_ts(&chrono::Local::now().naive_local());
        let updated = tx.execute(
            r#"
            UPDATE production_batch SET state = ?1, updated_at = ?2
            WHERE batch_id = ?3 AND state = ?4 AND current_station = ?5
            "#,
            params![
                new_state.to_db_str(),
                now,
                batch.batch_id,
                batch.state.to_db_str(),
                batch.current_station.to_db_str(),
            ],
        )?;
        if updated == 0 {
            return Err(batch_lock_failure(&tx, &batch.batch_id, batch.state)?);
        }

        let started = find_batch_with(&tx, &batch.batch_id)?.ok_or_else(|| not_found(&batch.batch_id))?;
        tx.commit()?;
        Ok(started)
    }

    /// 提交工位完成
    ///
    /// 单事务内:
    /// 1. 确认订单仍为 ACTIVE
    /// 2. 以乐观锁更新批次工位/状态
    /// 3. 调用 rollup 判断订单是否转为 CONSUMED
    pub fn commit_advance(
        &self,
        batch: &Batch,
        to_station: Station,
        new_state: BatchState,
        rollup: &dyn Fn(OrderState, &[Batch]) -> Option<OrderState>,
    ) -> RepositoryResult<BatchCommitResult> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let order = ensure_order_active(&tx, &batch.order_id)?;

        let now = format_ts(&chrono::Local::now().naive_local());
        let completed_at = (new_state == BatchState::Completed).then(|| now.clone());
        let updated = tx.execute(
            r#"
            UPDATE production_batch
            SET current_station = ?1, state = ?2, updated_at = ?3,
                completed_at = COALESCE(?4, completed_at)
            WHERE batch_id = ?5 AND state = ?6 AND current_station = ?7
            "#,
            params![
                to_station.to_db_str(),
                new_state.to_db_str(),
                now,
                completed_at,
                batch.batch_id,
                batch.state.to_db_str(),
                batch.current_station.to_db_str(),
            ],
        )?;
        if updated == 0 {
            return Err(batch_lock_failure(&tx, &batch.batch_id, batch.state)?);
        }

        let batches = list_by_order_with(&tx, &batch.order_id)?;
        let order_state = match rollup(order.state, &batches) {
            Some(next) => {
                update_state_with(&tx, &order.order_id, order.state, next)?;
                next
            }
            None => order.state,
        };

        let updated_batch = batches
            .into_iter()
            .find(|b| b.batch_id == batch.batch_id)
            .ok_or_else(|| not_found(&batch.batch_id))?;

        tx.commit()?;
        Ok(BatchCommitResult {
            batch: updated_batch,
            order_state,
        })
    }
}

// ==========================================
// 连接级辅助函数 (供事务复用)
// ==========================================

pub(crate) fn find_batch_with(conn: &Connection, batch_id: &str) -> RepositoryResult<Option<Batch>> {
    let sql = format!("{} WHERE batch_id = ?", BATCH_COLUMNS);
    match conn.query_row(&sql, params![batch_id], map_batch) {
        Ok(batch) => Ok(Some(batch)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn list_by_order_with(conn: &Connection, order_id: &str) -> RepositoryResult<Vec<Batch>> {
    let sql = format!("{} WHERE order_id = ? ORDER BY sequence_no", BATCH_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let batches = stmt
        .query_map(params![order_id], map_batch)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(batches)
}

pub(crate) fn insert_batch_with(conn: &Connection, batch: &Batch) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO production_batch (
            batch_id, order_id, sequence_no, units_in_batch, weight_kg,
            current_station, state, created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            batch.batch_id,
            batch.order_id,
            batch.sequence_no,
            batch.units_in_batch,
            batch.weight_kg,
            batch.current_station.to_db_str(),
            batch.state.to_db_str(),
            format_ts(&batch.created_at),
            format_ts(&batch.updated_at),
            batch.completed_at.as_ref().map(format_ts),
        ],
    )?;
    Ok(())
}

/// 事务内确认批次所属订单仍为 ACTIVE
fn ensure_order_active(conn: &Connection, order_id: &str) -> RepositoryResult<ProductionOrder> {
    let order = find_order_with(conn, order_id)?.ok_or_else(|| RepositoryError::NotFound {
        entity: "ProductionOrder".to_string(),
        id: order_id.to_string(),
    })?;
    if order.state != OrderState::Active {
        return Err(RepositoryError::OptimisticLockFailure {
            entity: "ProductionOrder".to_string(),
            id: order.order_id,
            expected: OrderState::Active.to_string(),
            actual: order.state.to_string(),
        });
    }
    Ok(order)
}

fn batch_lock_failure(conn: &Connection, batch_id: &str, expected: BatchState) -> RepositoryResult<RepositoryError> {
    let actual = find_batch_with(conn, batch_id)?.ok_or_else(|| not_found(batch_id))?;
    Ok(RepositoryError::OptimisticLockFailure {
        entity: "Batch".to_string(),
        id: batch_id.to_string(),
        expected: expected.to_string(),
        actual: format!("{}@{}", actual.state, actual.current_station),
    })
}

fn not_found(batch_id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Batch".to_string(),
        id: batch_id.to_string(),
    }
}

fn map_batch(row: &Row) -> rusqlite::Result<Batch> {
    Ok(Batch {
        batch_id: row.get(0)?,
        order_id: row.get(1)?,
        sequence_no: row.get(2)?,
        units_in_batch: row.get(3)?,
        weight_kg: row.get(4)?,
        current_station: enum_column(row, 5)?,
        state: enum_column(row, 6)?,
        created_at: ts_column(row, 7)?,
        updated_at: ts_column(row, 8)?,
        completed_at: opt_ts_column(row, 9)?,
    })
}
