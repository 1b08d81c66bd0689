// ==========================================
// 冷冻食品生产批次流程系统 - 损耗记录引擎
// ==========================================
// 职责: 损耗输入校验、按原因统计、超预留提示
// 红线: 统计排序必须确定 (次数降序, 同次数按原因代码字典序)
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::types::WasteReason;
use crate::domain::waste::{ReasonCount, ReservationExcess, WasteEntry, WasteSummary};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashMap;

/// 损耗输入 (未校验)
#[derive(Debug, Clone)]
pub struct WasteInput<'a> {
    pub material_sku: &'a str,
    pub grams_wasted: f64,
    pub reason_code: &'a str,
    pub recorded_by: &'a str,
    pub notes: Option<&'a str>,
}

// ==========================================
// WasteEngine - 损耗记录引擎
// ==========================================
pub struct WasteEngine {}

impl WasteEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 校验输入并生成损耗记录
    ///
    /// # 规则
    /// - grams_wasted < 0 或非有限数 → Validation
    /// - reason_code 不在枚举集合中 → Validation
    /// - 批次已完工/已取消 → InvalidStateTransition
    pub fn build_entry(&self, batch: &Batch, input: &WasteInput<'_>) -> EngineResult<WasteEntry> {
        if !input.grams_wasted.is_finite() || input.grams_wasted < 0.0 {
            return Err(EngineError::Validation(format!(
                "grams_wasted 必须为非负数, 实际 {}",
                input.grams_wasted
            )));
        }
        let reason_code: WasteReason = input
            .reason_code
            .parse()
            .map_err(|e: crate::domain::types::ParseEnumError| EngineError::Validation(e.to_string()))?;
        if input.material_sku.trim().is_empty() {
            return Err(EngineError::Validation("material_sku 不能为空".to_string()));
        }
        if input.recorded_by.trim().is_empty() {
            return Err(EngineError::Validation("recorded_by 不能为空".to_string()));
        }
        if batch.state.is_terminal() {
            return Err(EngineError::InvalidStateTransition {
                from: batch.state.to_string(),
                to: "RECORD_WASTE".to_string(),
            });
        }

        Ok(WasteEntry {
            waste_id: uuid::Uuid::new_v4().to_string(),
            batch_id: batch.batch_id.clone(),
            order_id: batch.order_id.clone(),
            station: batch.current_station,
            material_sku: input.material_sku.trim().to_string(),
            grams_wasted: input.grams_wasted,
            reason_code,
            recorded_by: input.recorded_by.to_string(),
            notes: input.notes.map(|s| s.to_string()),
            recorded_at: chrono::Local::now().naive_local(),
        })
    }

    /// 检查损耗是否超出该原料的预留量 (仅提示)
    ///
    /// # 参数
    /// - cumulative_grams: 该批次该原料累计损耗 (含本次)
    /// - reserved_grams: 订单对该原料的预留量 (None 表示无预留记录)
    pub fn check_reservation(
        &self,
        material_sku: &str,
        cumulative_grams: f64,
        reserved_grams: Option<f64>,
    ) -> Option<ReservationExcess> {
        let reserved = reserved_grams?;
        if cumulative_grams > reserved {
            Some(ReservationExcess {
                material_sku: material_sku.to_string(),
                reserved_grams: reserved,
                wasted_grams: cumulative_grams,
            })
        } else {
            None
        }
    }

    /// 按原因统计次数
    ///
    /// 次数降序; 同次数按原因代码字典序
    pub fn aggregate_by_reason(&self, entries: &[WasteEntry]) -> Vec<ReasonCount> {
        let mut counts: HashMap<WasteReason, u64> = HashMap::new();
        for entry in entries {
            *counts.entry(entry.reason_code).or_insert(0) += 1;
        }
        sort_reason_counts(
            counts
                .into_iter()
                .map(|(reason_code, total_occurrences)| ReasonCount {
                    reason_code,
                    total_occurrences,
                })
                .collect(),
        )
    }

    /// 损耗汇总
    pub fn summarize(&self, entries: &[WasteEntry]) -> WasteSummary {
        let mut grams: HashMap<WasteReason, f64> = HashMap::new();
        for entry in entries {
            *grams.entry(entry.reason_code).or_insert(0.0) += entry.grams_wasted;
        }
        let mut grams_by_reason: Vec<(WasteReason, f64)> = grams.into_iter().collect();
        grams_by_reason.sort_by(|a, b| a.0.to_db_str().cmp(b.0.to_db_str()));

        WasteSummary {
            total_entries: entries.len(),
            total_grams: entries.iter().map(|e| e.grams_wasted).sum(),
            grams_by_reason,
            most_frequent_reason: self
                .aggregate_by_reason(entries)
                .first()
                .map(|c| c.reason_code),
        }
    }
}

impl Default for WasteEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 统计结果排序 (次数降序, 原因代码升序)
pub fn sort_reason_counts(mut counts: Vec<ReasonCount>) -> Vec<ReasonCount> {
    counts.sort_by(|a, b| {
        b.total_occurrences
            .cmp(&a.total_occurrences)
            .then_with(|| a.reason_code.to_db_str().cmp(b.reason_code.to_db_str()))
    });
    counts
}
