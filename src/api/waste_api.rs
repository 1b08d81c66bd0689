// ==========================================
// 冷冻食品生产批次流程系统 - 损耗记录 API
// ==========================================
// 职责: 记录批次损耗、按原因统计、损耗汇总
// 红线: 超出预留量只提示, 不阻断记录
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::waste::{ReasonCount, ReservationExcess, WasteEntry, WasteSummary};
use crate::engine::{WasteEngine, WasteInput};
use crate::repository::{ActionLogRepository, BatchRepository, ReservationRepository, WasteRepository};

/// 损耗记录结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteRecordResult {
    pub entry: WasteEntry,
    pub reservation_excess: Option<ReservationExcess>,
    pub warning: Option<String>,
}

pub struct WasteApi {
    waste_repo: Arc<WasteRepository>,
    batch_repo: Arc<BatchRepository>,
    reservation_repo: Arc<ReservationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    engine: WasteEngine,
}

impl WasteApi {
    pub fn new(
        waste_repo: Arc<WasteRepository>,
        batch_repo: Arc<BatchRepository>,
        reservation_repo: Arc<ReservationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            waste_repo,
            batch_repo,
            reservation_repo,
            action_log_repo,
            engine: WasteEngine::new(),
        }
    }

    /// 记录批次损耗
    ///
    /// # 错误
    /// - ValidationError: grams < 0 / 原因代码不在枚举内
    /// - NotFound: 批次不存在
    /// - InvalidStateTransition: 批次已完工或已取消
    pub fn record_waste(
        &self,
        batch_id: &str,
        material_sku: &str,
        grams_wasted: f64,
        reason_code: &str,
        recorded_by: &str,
        notes: Option<&str>,
    ) -> ApiResult<WasteRecordResult> {
        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Batch(batch_id={})不存在", batch_id)))?;

        let entry = self.engine.build_entry(
            &batch,
            &WasteInput {
                material_sku,
                grams_wasted,
                reason_code,
                recorded_by,
                notes,
            },
        )?;
        self.waste_repo.insert(&entry)?;

        // 累计值已包含本次记录
        let cumulative = self
            .waste_repo
            .total_grams_for_material(&entry.batch_id, &entry.material_sku)?;
        let reserved = self
            .reservation_repo
            .reserved_grams(&entry.order_id, &entry.material_sku)?;
        let reservation_excess = self
            .engine
            .check_reservation(&entry.material_sku, cumulative, reserved);

        let warning = reservation_excess.as_ref().map(|excess| {
            crate::i18n::t_with_args(
                "waste.exceeds_reservation",
                &[
                    ("material", &excess.material_sku),
                    ("wasted", &format!("{:.1}", excess.wasted_grams)),
                    ("reserved", &format!("{:.1}", excess.reserved_grams)),
                ],
            )
        });
        if let Some(excess) = &reservation_excess {
            tracing::warn!(
                batch_id = %entry.batch_id,
                material = %excess.material_sku,
                wasted_grams = excess.wasted_grams,
                reserved_grams = excess.reserved_grams,
                "损耗超出原料预留量"
            );
        }

        if let Err(e) = self.action_log_repo.insert(&ActionLog::now(
            Some(&entry.order_id),
            ActionType::RecordWaste,
            recorded_by,
            Some(serde_json::json!({
                "waste_id": entry.waste_id,
                "batch_id": entry.batch_id,
                "material_sku": entry.material_sku,
                "grams_wasted": entry.grams_wasted,
                "reason_code": entry.reason_code,
            })),
            format!("{} 损耗 {}g", entry.material_sku, entry.grams_wasted),
        )) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
        tracing::info!(
            batch_id = %entry.batch_id,
            station = %entry.station,
            reason = %entry.reason_code,
            grams = entry.grams_wasted,
            "损耗已记录"
        );

        Ok(WasteRecordResult {
            entry,
            reservation_excess,
            warning,
        })
    }

    /// 全部损耗按原因统计 (次数降序, 同次数按原因代码升序)
    pub fn stats_by_reason(&self) -> ApiResult<Vec<ReasonCount>> {
        Ok(self.waste_repo.stats_by_reason()?)
    }

    /// 单个订单的损耗按原因统计
    pub fn aggregate_by_order(&self, order_id: &str) -> ApiResult<Vec<ReasonCount>> {
        let entries = self.waste_repo.find_by_order(order_id)?;
        Ok(self.engine.aggregate_by_reason(&entries))
    }

    /// 损耗汇总 (order_id 为 None 时汇总全部记录)
    pub fn summary(&self, order_id: Option<&str>) -> ApiResult<WasteSummary> {
        let entries = match order_id {
            Some(id) => self.waste_repo.find_by_order(id)?,
            None => self.waste_repo.list_all()?,
        };
        Ok(self.engine.summarize(&entries))
    }

    pub fn list_by_batch(&self, batch_id: &str) -> ApiResult<Vec<WasteEntry>> {
        Ok(self.waste_repo.find_by_batch(batch_id)?)
    }
}
