// ==========================================
// 冷冻食品生产批次流程系统 - 生产订单仓储
// ==========================================
// 表: production_order
// 红线: 状态更新必须携带期望旧状态 (乐观锁), 防止并发覆盖
// ==========================================

use crate::db::format_ts;
use crate::domain::order::{OrderFilter, ProductionOrder};
use crate::domain::types::OrderState;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row::{enum_column, opt_ts_column, ts_column};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub(crate) const ORDER_COLUMNS: &str = r#"
    SELECT order_id, sku, quantity_units, state, responsible, notes,
           batch_count, unit_weight_grams, total_weight_kg, activated_at,
           created_at, updated_at
    FROM production_order
"#;

pub struct ProductionOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionOrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入新订单
    pub fn insert(&self, order: &ProductionOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_order (
                order_id, sku, quantity_units, state, responsible, notes,
                batch_count, unit_weight_grams, total_weight_kg, activated_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                order.order_id,
                order.sku,
                order.quantity_units,
                order.state.to_db_str(),
                order.responsible,
                order.notes,
                order.batch_count,
                order.unit_weight_grams,
                order.total_weight_kg,
                order.activated_at.as_ref().map(format_ts),
                format_ts(&order.created_at),
                format_ts(&order.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按 order_id 查询
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
        let conn = self.get_conn()?;
        find_order_with(&conn, order_id)
    }

    /// 按 order_id 查询, 不存在时返回 NotFound
    pub fn get(&self, order_id: &str) -> RepositoryResult<ProductionOrder> {
        self.find_by_id(order_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "ProductionOrder".to_string(),
            id: order_id.to_string(),
        })
    }

    /// 按过滤条件列出订单 (创建时间倒序)
    pub fn list(&self, filter: &OrderFilter) -> RepositoryResult<Vec<ProductionOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE (?1 IS NULL OR state = ?1) AND (?2 IS NULL OR sku = ?2) ORDER BY created_at DESC, order_id",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(
                params![filter.state.map(|s| s.to_db_str()), filter.sku.as_deref()],
                map_order,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// 更新订单状态 (乐观锁: 仅当当前状态等于 expected 时生效)
    pub fn update_state(
        &self,
        order_id: &str,
        expected: OrderState,
        new_state: OrderState,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        update_state_with(&conn, order_id, expected, new_state)
    }
}

pub(crate) fn find_order_with(conn: &Connection, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
    let sql = format!("{} WHERE order_id = ?", ORDER_COLUMNS);
    match conn.query_row(&sql, params![order_id], map_order) {
        Ok(order) => Ok(Some(order)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn update_state_with(
    conn: &Connection,
    order_id: &str,
    expected: OrderState,
    new_state: OrderState,
) -> RepositoryResult<()> {
    let now = format_ts(&chrono::Local::now().naive_local());
    let updated = conn.execute(
        "UPDATE production_order SET state = ?1, updated_at = ?2 WHERE order_id = ?3 AND state = ?4",
        params![new_state.to_db_str(), now, order_id, expected.to_db_str()],
    )?;

    if updated == 0 {
        let actual = find_order_with(conn, order_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "ProductionOrder".to_string(),
            id: order_id.to_string(),
        })?;
        return Err(RepositoryError::OptimisticLockFailure {
            entity: "ProductionOrder".to_string(),
            id: order_id.to_string(),
            expected: expected.to_string(),
            actual: actual.state.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn map_order(row: &Row) -> rusqlite::Result<ProductionOrder> {
    Ok(ProductionOrder {
        order_id: row.get(0)?,
        sku: row.get(1)?,
        quantity_units: row.get(2)?,
        state: enum_column(row, 3)?,
        responsible: row.get(4)?,
        notes: row.get(5)?,
        batch_count: row.get(6)?,
        unit_weight_grams: row.get(7)?,
        total_weight_kg: row.get(8)?,
        activated_at: opt_ts_column(row, 9)?,
        created_at: ts_column(row, 10)?,
        updated_at: ts_column(row, 11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;
    use crate::domain::types::UnitOfMeasure;
    use crate::repository::CatalogRepository;

    fn setup() -> (Arc<Mutex<Connection>>, ProductionOrderRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let catalog = CatalogRepository::new(conn.clone());
        for sku in ["PT-ESPINACA", "PT-CHOCLO"] {
            catalog
                .upsert_product(&Product {
                    sku: sku.to_string(),
                    name: sku.to_string(),
                    unit_of_measure: UnitOfMeasure::Unit,
                    is_raw_material: false,
                })
                .unwrap();
        }
        (conn.clone(), ProductionOrderRepository::new(conn))
    }

    fn order(sku: &str, qty: i64) -> ProductionOrder {
        ProductionOrder::new_planned(sku.to_string(), qty, "jefe_turno".to_string(), None)
    }

    #[test]
    fn test_insert_and_find() {
        let (_conn, repo) = setup();
        let o = order("PT-ESPINACA", 500);
        repo.insert(&o).unwrap();

        let found = repo.find_by_id(&o.order_id).unwrap().unwrap();
        assert_eq!(found.sku, "PT-ESPINACA");
        assert_eq!(found.quantity_units, 500);
        assert_eq!(found.state, OrderState::Planned);
        assert_eq!(found.responsible, "jefe_turno");
        assert!(found.batch_count.is_none());
        assert!(found.activated_at.is_none());
        assert!(repo.find_by_id("missing").unwrap().is_none());
        assert!(matches!(repo.get("missing"), Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_insert_rejects_unknown_sku() {
        let (_conn, repo) = setup();
        let result = repo.insert(&order("PT-FANTASMA", 10));
        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    }

    #[test]
    fn test_list_with_filter() {
        let (_conn, repo) = setup();
        let a = order("PT-ESPINACA", 100);
        let b = order("PT-CHOCLO", 200);
        repo.insert(&a).unwrap();
        repo.insert(&b).unwrap();
        repo.update_state(&b.order_id, OrderState::Planned, OrderState::Cancelled)
            .unwrap();

        assert_eq!(repo.list(&OrderFilter::default()).unwrap().len(), 2);

        let planned = repo
            .list(&OrderFilter {
                state: Some(OrderState::Planned),
                sku: None,
            })
            .unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].order_id, a.order_id);

        let choclo = repo
            .list(&OrderFilter {
                state: None,
                sku: Some("PT-CHOCLO".to_string()),
            })
            .unwrap();
        assert_eq!(choclo.len(), 1);
        assert_eq!(choclo[0].state, OrderState::Cancelled);
    }

    #[test]
    fn test_update_state_optimistic_lock() {
        let (_conn, repo) = setup();
        let o = order("PT-ESPINACA", 100);
        repo.insert(&o).unwrap();

        let result = repo.update_state(&o.order_id, OrderState::Active, OrderState::Paused);
        match result {
            Err(RepositoryError::OptimisticLockFailure { expected, actual, .. }) => {
                assert_eq!(expected, "ACTIVE");
                assert_eq!(actual, "PLANNED");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let missing = repo.update_state("nope", OrderState::Planned, OrderState::Cancelled);
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }
}
