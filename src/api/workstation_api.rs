// ==========================================
// 冷冻食品生产批次流程系统 - 工位 API
// ==========================================
// 职责: 工位列表、工位待处理批次、开始加工、完成工位
// 红线: 工位顺序只来自 StationCatalog, 不允许跳站
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::batch::Batch;
use crate::domain::station::{Station, StationInfo};
use crate::domain::types::OrderState;
use crate::engine::{OrderLifecycleEngine, StationCatalog};
use crate::repository::{ActionLogRepository, BatchRepository, ProductionOrderRepository};

/// 完成工位结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCompletion {
    pub batch: Batch,
    pub from_station: Station,
    pub order_state: OrderState,
    /// 订单全部批次完工, 已转为 CONSUMED
    pub order_consumed: bool,
}

pub struct WorkstationApi {
    order_repo: Arc<ProductionOrderRepository>,
    batch_repo: Arc<BatchRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    engine: OrderLifecycleEngine,
}

impl WorkstationApi {
    pub fn new(
        order_repo: Arc<ProductionOrderRepository>,
        batch_repo: Arc<BatchRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            order_repo,
            batch_repo,
            action_log_repo,
            engine: OrderLifecycleEngine::new(),
        }
    }

    /// 工位列表 (按生产顺序)
    pub fn list_station_info(&self) -> Vec<StationInfo> {
        StationCatalog::all_info()
    }

    /// 工位待处理/处理中的批次
    ///
    /// 未知工位代码返回 UnknownStation
    pub fn list_batches_by_station(&self, station_code: &str) -> ApiResult<Vec<Batch>> {
        let station = StationCatalog::parse(station_code)?;
        Ok(self.batch_repo.list_by_station(station)?)
    }

    /// 开始加工 (PENDING → IN_PROGRESS)
    pub fn start_batch(&self, batch_id: &str, operator: &str) -> ApiResult<Batch> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let batch = self.get_batch(batch_id)?;
        let order = self.order_repo.get(&batch.order_id)?;
        let new_state = self.engine.start_batch(&batch, order.state)?;
        let updated = self.batch_repo.commit_start(&batch, new_state)?;

        self.record_action(ActionLog::now(
            Some(&batch.order_id),
            ActionType::StartBatch,
            operator,
            Some(serde_json::json!({
                "batch_id": batch_id,
                "station": batch.current_station,
            })),
            format!("批次{}在{}开始加工", batch.sequence_no, batch.current_station),
        ));
        tracing::info!(batch_id = %batch_id, station = %batch.current_station, "批次开始加工");

        Ok(updated)
    }

    /// 完成当前工位
    ///
    /// 移至下一工位 (PENDING); 末道工位完成后批次 COMPLETED,
    /// 订单全部批次完工时订单转为 CONSUMED (同一事务)
    pub fn complete_batch(&self, batch_id: &str, operator: &str) -> ApiResult<BatchCompletion> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let batch = self.get_batch(batch_id)?;
        let order = self.order_repo.get(&batch.order_id)?;
        let advance = self.engine.advance_batch(&batch, order.state)?;

        let engine = &self.engine;
        let committed = self.batch_repo.commit_advance(
            &batch,
            advance.to_station,
            advance.new_state,
            &|state, batches| engine.rollup_order_state(state, batches),
        )?;

        self.record_action(ActionLog::now(
            Some(&batch.order_id),
            ActionType::CompleteBatch,
            operator,
            Some(serde_json::json!({
                "batch_id": batch_id,
                "from_station": advance.from_station,
                "to_station": advance.to_station,
                "new_state": advance.new_state,
            })),
            format!("批次{}完成{}", batch.sequence_no, advance.from_station),
        ));

        if advance.is_completion() {
            tracing::info!(batch_id = %batch_id, "批次已完工");
        } else {
            tracing::info!(
                batch_id = %batch_id,
                from = %advance.from_station,
                to = %advance.to_station,
                "批次进入下一工位"
            );
        }
        if committed.order_consumed() {
            tracing::info!(order_id = %batch.order_id, "订单全部批次完工，订单已消耗");
        }

        Ok(BatchCompletion {
            order_consumed: committed.order_consumed(),
            order_state: committed.order_state,
            batch: committed.batch,
            from_station: advance.from_station,
        })
    }

    fn get_batch(&self, batch_id: &str) -> ApiResult<Batch> {
        self.batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Batch(batch_id={})不存在", batch_id)))
    }

    fn record_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}
