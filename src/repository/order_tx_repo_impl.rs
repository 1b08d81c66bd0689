// ==========================================
// 冷冻食品生产批次流程系统 - 订单事务网关实现
// ==========================================
// 职责: 使用 rusqlite 事务实现 OrderTransactionGateway
// 红线: 状态前置条件在事务内重新校验, 不信任事务外的读取结果
// ==========================================

use crate::db::format_ts;
use crate::domain::batch::BatchProgress;
use crate::domain::order::ProductionOrder;
use crate::domain::types::{BatchState, OrderState};
use crate::repository::action_log_repo::insert_with as insert_log_with;
use crate::repository::batch_repo::{insert_batch_with, list_by_order_with};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_repo::{find_order_with, update_state_with};
use crate::repository::order_tx_repo::{
    ActivationCommit, CancellationCommit, CancellationOutcome, OrderTransactionGateway,
};
use crate::repository::reservation_repo::{release_with, reserve_with};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct OrderTransactionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderTransactionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn activate_tx(&self, commit: &ActivationCommit) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Local::now().naive_local();

        // 1. 状态检查 (乐观锁)
        let order = find_order_with(&tx, &commit.order_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "ProductionOrder".to_string(),
            id: commit.order_id.clone(),
        })?;
        if order.state != OrderState::Planned {
            return Err(RepositoryError::OptimisticLockFailure {
                entity: "ProductionOrder".to_string(),
                id: order.order_id,
                expected: OrderState::Planned.to_string(),
                actual: order.state.to_string(),
            });
        }

        // 2. 原料预留
        for req in &commit.requirements {
            reserve_with(&tx, &commit.order_id, &req.material_sku, req.required_grams, &now)?;
        }

        // 3. 批次
        for batch in &commit.batches {
            insert_batch_with(&tx, batch)?;
        }

        // 4. 订单
        let updated = tx.execute(
            r#"
            UPDATE production_order
            SET state = ?1, batch_count = ?2, unit_weight_grams = ?3, total_weight_kg = ?4,
                activated_at = ?5, updated_at = ?5
            WHERE order_id = ?6 AND state = ?7
            "#,
            params![
                OrderState::Active.to_db_str(),
                commit.batch_count,
                commit.unit_weight_grams,
                commit.total_weight_kg,
                format_ts(&now),
                commit.order_id,
                OrderState::Planned.to_db_str(),
            ],
        )?;
        if updated != 1 {
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "激活订单更新行数异常: order_id={}, rows={}",
                commit.order_id, updated
            )));
        }

        insert_log_with(&tx, &commit.log)?;
        tx.commit()?;
        Ok(())
    }

    fn cancel_tx(&self, commit: &CancellationCommit) -> RepositoryResult<CancellationOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Local::now().naive_local();

        // 1. 状态检查: 以事务内读到的订单为准
        let order = find_order_with(&tx, &commit.order_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "ProductionOrder".to_string(),
            id: commit.order_id.clone(),
        })?;
        match order.state {
            // 并发下已被取消: 视为成功
            OrderState::Cancelled => {
                return Ok(CancellationOutcome {
                    cancelled_batches: 0,
                    release_fraction: 0.0,
                    already_cancelled: true,
                })
            }
            OrderState::Planned | OrderState::Active => {}
            other => {
                return Err(RepositoryError::OptimisticLockFailure {
                    entity: "ProductionOrder".to_string(),
                    id: order.order_id,
                    expected: format!("{}|{}", OrderState::Planned, OrderState::Active),
                    actual: other.to_string(),
                });
            }
        }

        // 2. 释放比例按事务内的批次行计算 (含规划之后才落库的批次)
        let progress = BatchProgress::from_batches(&list_by_order_with(&tx, &commit.order_id)?);
        let release_fraction = progress.release_fraction();

        // 3. 未完工批次全部取消
        let cancelled_batches = tx.execute(
            r#"
            UPDATE production_batch SET state = ?1, updated_at = ?2
            WHERE order_id = ?3 AND state IN ('PENDING', 'IN_PROGRESS')
            "#,
            params![BatchState::Cancelled.to_db_str(), format_ts(&now), commit.order_id],
        )?;

        // 4. 预留 + 订单 + 日志
        release_with(&tx, &commit.order_id, release_fraction, &now)?;
        update_state_with(&tx, &commit.order_id, order.state, OrderState::Cancelled)?;

        let mut log = commit.log.clone();
        log.payload_json = Some(serde_json::json!({
            "from": order.state,
            "cancelled_batches": cancelled_batches,
            "release_fraction": release_fraction,
        }));
        insert_log_with(&tx, &log)?;

        tx.commit()?;
        Ok(CancellationOutcome {
            cancelled_batches,
            release_fraction,
            already_cancelled: false,
        })
    }
}

#[async_trait]
impl OrderTransactionGateway for OrderTransactionRepository {
    async fn commit_activation(&self, commit: &ActivationCommit) -> RepositoryResult<()> {
        self.activate_tx(commit)
    }

    async fn commit_cancellation(&self, commit: &CancellationCommit) -> RepositoryResult<CancellationOutcome> {
        self.cancel_tx(commit)
    }

    async fn find_order(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
        let conn = self.get_conn()?;
        find_order_with(&conn, order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action_log::{ActionLog, ActionType};
    use crate::domain::catalog::{MaterialRequirement, Product};
    use crate::domain::types::UnitOfMeasure;
    use crate::engine::{build_batches, compute_batch_plan};
    use crate::repository::{
        BatchRepository, CatalogRepository, ProductionOrderRepository, ReservationRepository,
    };

    fn setup() -> (Arc<Mutex<Connection>>, ProductionOrder) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        CatalogRepository::new(conn.clone())
            .upsert_product(&Product {
                sku: "PT-ARVEJA-1KG".to_string(),
                name: "Arveja congelada 1kg".to_string(),
                unit_of_measure: UnitOfMeasure::Unit,
                is_raw_material: false,
            })
            .unwrap();
        let order = ProductionOrder::new_planned("PT-ARVEJA-1KG".to_string(), 10, "ana".to_string(), None);
        ProductionOrderRepository::new(conn.clone()).insert(&order).unwrap();
        (conn, order)
    }

    fn activation(order: &ProductionOrder, grams: f64) -> ActivationCommit {
        let plan = compute_batch_plan(order.quantity_units, 1000.0, 2).unwrap();
        ActivationCommit {
            order_id: order.order_id.clone(),
            batch_count: plan.batch_count,
            unit_weight_grams: plan.unit_weight_grams,
            total_weight_kg: plan.total_weight_kg,
            batches: build_batches(&order.order_id, &plan),
            requirements: vec![MaterialRequirement {
                material_sku: "MP-ARVEJA".to_string(),
                required_grams: grams,
            }],
            log: ActionLog::now(Some(&order.order_id), ActionType::ActivateOrder, "ana", None, "test"),
        }
    }

    fn cancellation(order: &ProductionOrder) -> CancellationCommit {
        CancellationCommit {
            order_id: order.order_id.clone(),
            log: ActionLog::now(Some(&order.order_id), ActionType::CancelOrder, "ana", None, "test"),
        }
    }

    #[tokio::test]
    async fn test_activation_commits_all_or_nothing() {
        let (conn, order) = setup();
        let gateway = OrderTransactionRepository::new(conn.clone());
        let stock = ReservationRepository::new(conn.clone());
        stock.set_stock("MP-ARVEJA", 5000.0).unwrap();

        // 库存不足 → 无任何写入
        let err = gateway
            .commit_activation(&activation(&order, 6000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InsufficientStock { .. }));
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 5000.0);
        assert!(BatchRepository::new(conn.clone())
            .list_by_order(&order.order_id)
            .unwrap()
            .is_empty());

        gateway
            .commit_activation(&activation(&order, 4000.0))
            .await
            .unwrap();
        let active = gateway.find_order(&order.order_id).await.unwrap().unwrap();
        assert_eq!(active.state, OrderState::Active);
        assert_eq!(active.batch_count, Some(2));
        assert_eq!(active.total_weight_kg, Some(10.0));
        assert!(active.activated_at.is_some());
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 1000.0);
        assert_eq!(
            BatchRepository::new(conn.clone())
                .list_by_order(&order.order_id)
                .unwrap()
                .len(),
            2
        );

        // 重复激活 → 乐观锁冲突
        let again = gateway.commit_activation(&activation(&order, 10.0)).await;
        assert!(matches!(again, Err(RepositoryError::OptimisticLockFailure { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_releases_reservation() {
        let (conn, order) = setup();
        let gateway = OrderTransactionRepository::new(conn.clone());
        let stock = ReservationRepository::new(conn.clone());
        stock.set_stock("MP-ARVEJA", 4000.0).unwrap();

        gateway.commit_activation(&activation(&order, 4000.0)).await.unwrap();
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 0.0);

        let cancel = cancellation(&order);
        let outcome = gateway.commit_cancellation(&cancel).await.unwrap();
        assert_eq!(outcome.cancelled_batches, 2);
        assert_eq!(outcome.release_fraction, 1.0);
        assert!(!outcome.already_cancelled);

        let cancelled = gateway.find_order(&order.order_id).await.unwrap().unwrap();
        assert_eq!(cancelled.state, OrderState::Cancelled);
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 4000.0);
        let batches = BatchRepository::new(conn.clone())
            .list_by_order(&order.order_id)
            .unwrap();
        assert!(batches.iter().all(|b| b.state == BatchState::Cancelled));

        // 重复取消: 幂等, 不再返还库存
        assert!(gateway.commit_cancellation(&cancel).await.unwrap().already_cancelled);
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 4000.0);
    }

    #[tokio::test]
    async fn test_cancellation_covers_batches_created_after_planning() {
        let (conn, order) = setup();
        let gateway = OrderTransactionRepository::new(conn.clone());
        let stock = ReservationRepository::new(conn.clone());
        stock.set_stock("MP-ARVEJA", 4000.0).unwrap();

        // 取消请求基于 PLANNED 快照构造, 提交前订单已被激活
        let cancel = cancellation(&order);
        gateway.commit_activation(&activation(&order, 4000.0)).await.unwrap();

        let outcome = gateway.commit_cancellation(&cancel).await.unwrap();
        assert_eq!(outcome.cancelled_batches, 2);

        let cancelled = gateway.find_order(&order.order_id).await.unwrap().unwrap();
        assert_eq!(cancelled.state, OrderState::Cancelled);
        let batches = BatchRepository::new(conn.clone())
            .list_by_order(&order.order_id)
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.state == BatchState::Cancelled));
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 4000.0);
    }

    #[tokio::test]
    async fn test_cancellation_releases_only_open_share() {
        let (conn, order) = setup();
        let gateway = OrderTransactionRepository::new(conn.clone());
        let stock = ReservationRepository::new(conn.clone());
        stock.set_stock("MP-ARVEJA", 4000.0).unwrap();

        let commit = activation(&order, 4000.0);
        let first = commit.batches[0].batch_id.clone();
        gateway.commit_activation(&commit).await.unwrap();
        conn.lock()
            .unwrap()
            .execute(
                "UPDATE production_batch SET state = 'COMPLETED', current_station = 'EMPAQUETADO' WHERE batch_id = ?",
                params![first],
            )
            .unwrap();

        let outcome = gateway.commit_cancellation(&cancellation(&order)).await.unwrap();
        assert_eq!(outcome.cancelled_batches, 1);
        assert!((outcome.release_fraction - 0.5).abs() < 1e-9);
        assert_eq!(stock.get_stock("MP-ARVEJA").unwrap(), 2000.0);

        let completed = BatchRepository::new(conn.clone())
            .find_by_id(&first)
            .unwrap()
            .unwrap();
        assert_eq!(completed.state, BatchState::Completed);
    }

    #[tokio::test]
    async fn test_cancellation_rejected_when_order_paused() {
        let (conn, order) = setup();
        let gateway = OrderTransactionRepository::new(conn.clone());
        ReservationRepository::new(conn.clone())
            .set_stock("MP-ARVEJA", 4000.0)
            .unwrap();
        gateway.commit_activation(&activation(&order, 4000.0)).await.unwrap();

        // 取消请求构造后订单被暂停
        let cancel = cancellation(&order);
        ProductionOrderRepository::new(conn.clone())
            .update_state(&order.order_id, OrderState::Active, OrderState::Paused)
            .unwrap();

        let result = gateway.commit_cancellation(&cancel).await;
        assert!(matches!(result, Err(RepositoryError::OptimisticLockFailure { .. })));

        let paused = gateway.find_order(&order.order_id).await.unwrap().unwrap();
        assert_eq!(paused.state, OrderState::Paused);
        let batches = BatchRepository::new(conn.clone())
            .list_by_order(&order.order_id)
            .unwrap();
        assert!(batches.iter().all(|b| b.state == BatchState::Pending));
    }
}
