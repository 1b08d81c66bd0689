// ==========================================
// 冷冻食品生产批次流程系统 - 生产订单领域模型
// ==========================================
// 红线: quantity_units 创建后不可变
// 红线: CONSUMED 只能由批次汇总(全部完工)到达
// ==========================================

use crate::domain::types::OrderState;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionOrder - 生产订单
// ==========================================
// 对齐: production_order 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    // ===== 主键 =====
    pub order_id: String,

    // ===== 订单内容 =====
    pub sku: String,            // 成品 SKU
    pub quantity_units: i64,    // 计划数量(件)
    pub state: OrderState,      // 订单状态
    pub responsible: String,    // 负责人
    pub notes: Option<String>,  // 备注

    // ===== 激活时固化的批次参数 (PLANNED 时为空) =====
    pub batch_count: Option<i64>,
    pub unit_weight_grams: Option<f64>,
    pub total_weight_kg: Option<f64>,
    pub activated_at: Option<NaiveDateTime>,

    // ===== 时间戳 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProductionOrder {
    /// 创建新的计划订单 (PLANNED)
    pub fn new_planned(
        sku: String,
        quantity_units: i64,
        responsible: String,
        notes: Option<String>,
    ) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            order_id: uuid::Uuid::new_v4().to_string(),
            sku,
            quantity_units,
            state: OrderState::Planned,
            responsible,
            notes,
            batch_count: None,
            unit_weight_grams: None,
            total_weight_kg: None,
            activated_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// OrderFilter - 订单查询条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub state: Option<OrderState>,
    pub sku: Option<String>,
}
