// ==========================================
// 冷冻食品生产批次流程系统 - 损耗(Desperdicio)领域模型
// ==========================================
// 红线: 损耗记录一经写入不可修改
// 红线: 记录损耗不改变批次自身状态
// ==========================================

use crate::domain::station::Station;
use crate::domain::types::WasteReason;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// WasteEntry - 损耗记录
// ==========================================
// 对齐: waste_entry 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteEntry {
    pub waste_id: String,
    pub batch_id: String,
    pub order_id: String,
    pub station: Station,          // 记录时批次所在工位
    pub material_sku: String,
    pub grams_wasted: f64,
    pub reason_code: WasteReason,
    pub recorded_by: String,
    pub notes: Option<String>,
    pub recorded_at: NaiveDateTime,
}

// ==========================================
// ReasonCount - 按原因统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason_code: WasteReason,
    pub total_occurrences: u64,
}

// ==========================================
// WasteSummary - 损耗汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteSummary {
    pub total_entries: usize,
    pub total_grams: f64,
    pub grams_by_reason: Vec<(WasteReason, f64)>,
    pub most_frequent_reason: Option<WasteReason>,
}

// ==========================================
// ReservationExcess - 损耗超出预留提示 (仅提示,不阻断)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationExcess {
    pub material_sku: String,
    pub reserved_grams: f64,
    pub wasted_grams: f64,
}
