// ==========================================
// 冷冻食品生产批次流程系统 - 原料库存与预留仓储
// ==========================================
// 表: material_stock / material_reservation
// 说明: 预留在订单激活事务内写入 (见 order_tx_repo_impl)
// ==========================================

use crate::db::format_ts;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row::opt_ts_column;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 原料库存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialStock {
    pub material_sku: String,
    pub available_grams: f64,
}

/// 订单原料预留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialReservation {
    pub order_id: String,
    pub material_sku: String,
    pub reserved_grams: f64,
    pub released: bool,
    pub released_at: Option<NaiveDateTime>,
}

pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 库存
    // ==========================================

    /// 设置原料可用库存 (覆盖)
    pub fn set_stock(&self, material_sku: &str, available_grams: f64) -> RepositoryResult<()> {
        if !available_grams.is_finite() || available_grams < 0.0 {
            return Err(RepositoryError::ValidationError(format!(
                "库存不能为负数: {} = {}",
                material_sku, available_grams
            )));
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO material_stock (material_sku, available_grams)
            VALUES (?1, ?2)
            ON CONFLICT(material_sku) DO UPDATE SET
                available_grams = excluded.available_grams,
                updated_at = datetime('now')
            "#,
            params![material_sku, available_grams],
        )?;
        Ok(())
    }

    /// 查询可用库存 (无记录视为 0)
    pub fn get_stock(&self, material_sku: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        available_grams_with(&conn, material_sku)
    }

    pub fn list_stock(&self) -> RepositoryResult<Vec<MaterialStock>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT material_sku, available_grams FROM material_stock ORDER BY material_sku",
        )?;
        let stock = stmt
            .query_map([], |row| {
                Ok(MaterialStock {
                    material_sku: row.get(0)?,
                    available_grams: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stock)
    }

    // ==========================================
    // 预留
    // ==========================================

    pub fn find_by_order(&self, order_id: &str) -> RepositoryResult<Vec<MaterialReservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT order_id, material_sku, reserved_grams, released, released_at
            FROM material_reservation
            WHERE order_id = ?
            ORDER BY material_sku
            "#,
        )?;
        let reservations = stmt
            .query_map(params![order_id], |row| {
                Ok(MaterialReservation {
                    order_id: row.get(0)?,
                    material_sku: row.get(1)?,
                    reserved_grams: row.get(2)?,
                    released: row.get(3)?,
                    released_at: opt_ts_column(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reservations)
    }

    /// 订单对某原料的当前预留量 (未释放)
    pub fn reserved_grams(&self, order_id: &str, material_sku: &str) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let grams = conn
            .query_row(
                r#"
                SELECT reserved_grams FROM material_reservation
                WHERE order_id = ?1 AND material_sku = ?2 AND released = 0
                "#,
                params![order_id, material_sku],
                |row| row.get(0),
            )
            .optional()?;
        Ok(grams)
    }
}

// ==========================================
// 事务内辅助函数
// ==========================================

pub(crate) fn available_grams_with(conn: &Connection, material_sku: &str) -> RepositoryResult<f64> {
    let grams: Option<f64> = conn
        .query_row(
            "SELECT available_grams FROM material_stock WHERE material_sku = ?",
            params![material_sku],
            |row| row.get(0),
        )
        .optional()?;
    Ok(grams.unwrap_or(0.0))
}

/// 扣减库存并写入预留; 库存不足返回 InsufficientStock
pub(crate) fn reserve_with(
    conn: &Connection,
    order_id: &str,
    material_sku: &str,
    required_grams: f64,
    now: &NaiveDateTime,
) -> RepositoryResult<()> {
    let available = available_grams_with(conn, material_sku)?;
    if available < required_grams {
        return Err(RepositoryError::InsufficientStock {
            material_sku: material_sku.to_string(),
            required_grams,
            available_grams: available,
        });
    }

    conn.execute(
        r#"
        UPDATE material_stock
        SET available_grams = available_grams - ?1, updated_at = datetime('now')
        WHERE material_sku = ?2
        "#,
        params![required_grams, material_sku],
    )?;
    conn.execute(
        r#"
        INSERT INTO material_reservation (order_id, material_sku, reserved_grams, released, created_at)
        VALUES (?1, ?2, ?3, 0, ?4)
        "#,
        params![order_id, material_sku, required_grams, format_ts(now)],
    )?;
    Ok(())
}

/// 按比例释放订单的预留, 返还库存
pub(crate) fn release_with(
    conn: &Connection,
    order_id: &str,
    fraction: f64,
    now: &NaiveDateTime,
) -> RepositoryResult<usize> {
    let fraction = fraction.clamp(0.0, 1.0);
    let reservations: Vec<(String, f64)> = {
        let mut stmt = conn.prepare(
            "SELECT material_sku, reserved_grams FROM material_reservation WHERE order_id = ? AND released = 0",
        )?;
        let rows = stmt
            .query_map(params![order_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    for (material_sku, reserved_grams) in &reservations {
        let returned = reserved_grams * fraction;
        if returned > 0.0 {
            conn.execute(
                r#"
                INSERT INTO material_stock (material_sku, available_grams)
                VALUES (?1, ?2)
                ON CONFLICT(material_sku) DO UPDATE SET
                    available_grams = available_grams + excluded.available_grams,
                    updated_at = datetime('now')
                "#,
                params![material_sku, returned],
            )?;
        }
        conn.execute(
            r#"
            UPDATE material_reservation
            SET released = 1, released_at = ?1
            WHERE order_id = ?2 AND material_sku = ?3
            "#,
            params![format_ts(now), order_id, material_sku],
        )?;
    }
    Ok(reservations.len())
}
