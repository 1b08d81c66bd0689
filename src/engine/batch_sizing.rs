// ==========================================
// 冷冻食品生产批次流程系统 - 批次拆分计算
// ==========================================
// 输入: 订单件数 + 单件重量(克) + 批次数
// 输出: 总重量 / 单批重量 / 单批件数 / 余数件
// 红线: 预览与激活必须调用同一函数,保证预览结果即落库结果
// ==========================================

use crate::config::production_config::BatchPolicy;
use crate::domain::batch::Batch;
use crate::domain::types::BatchState;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::station_catalog::StationCatalog;
use serde::{Deserialize, Serialize};

// ==========================================
// BatchPlan - 批次计划
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub quantity_units: i64,
    pub unit_weight_grams: f64,
    pub batch_count: i64,

    pub total_weight_kg: f64,
    pub weight_per_batch_kg: f64,
    pub units_per_batch: i64,
    pub remainder_units: i64,
}

/// 计算批次计划
///
/// # 规则
/// - total_weight_kg = quantity_units × unit_weight_grams / 1000
/// - weight_per_batch_kg = total_weight_kg / batch_count
/// - units_per_batch = ⌊quantity_units / batch_count⌋
/// - remainder_units = quantity_units mod batch_count
///
/// unit_weight_grams = 0 合法,得到零重量计划 (由调用方决定如何处理)
pub fn compute_batch_plan(
    quantity_units: i64,
    unit_weight_grams: f64,
    batch_count: i64,
) -> EngineResult<BatchPlan> {
    if quantity_units <= 0 {
        return Err(EngineError::Validation(format!(
            "quantity_units 必须大于 0, 实际 {}",
            quantity_units
        )));
    }
    if batch_count <= 0 {
        return Err(EngineError::Validation(format!(
            "batch_count 必须大于 0, 实际 {}",
            batch_count
        )));
    }
    if !unit_weight_grams.is_finite() || unit_weight_grams < 0.0 {
        return Err(EngineError::Validation(format!(
            "unit_weight_grams 必须为非负数, 实际 {}",
            unit_weight_grams
        )));
    }

    let total_weight_kg = quantity_units as f64 * unit_weight_grams / 1000.0;

    Ok(BatchPlan {
        quantity_units,
        unit_weight_grams,
        batch_count,
        total_weight_kg,
        weight_per_batch_kg: total_weight_kg / batch_count as f64,
        units_per_batch: quantity_units / batch_count,
        remainder_units: quantity_units % batch_count,
    })
}

// ==========================================
// BatchAdvisory - 批次提示 (不阻断执行)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchAdvisory {
    /// 批次数过多
    ExcessiveBatchCount { batch_count: i64, limit: i64 },
    /// 单批重量过小,效率低
    SmallBatchWeight {
        weight_per_batch_kg: f64,
        minimum_kg: f64,
    },
    /// 件数不能整除批次数
    RemainderUnits { remainder_units: i64 },
}

impl BatchAdvisory {
    /// i18n 键
    pub fn message_key(&self) -> &'static str {
        match self {
            BatchAdvisory::ExcessiveBatchCount { .. } => "batch.excessive_batch_count",
            BatchAdvisory::SmallBatchWeight { .. } => "batch.small_batch_weight",
            BatchAdvisory::RemainderUnits { .. } => "batch.remainder_units",
        }
    }

    /// 本地化提示文本
    pub fn message(&self) -> String {
        let key = self.message_key();
        match self {
            BatchAdvisory::ExcessiveBatchCount { batch_count, limit } => crate::i18n::t_with_args(
                key,
                &[("count", &batch_count.to_string()), ("limit", &limit.to_string())],
            ),
            BatchAdvisory::SmallBatchWeight {
                weight_per_batch_kg,
                minimum_kg,
            } => crate::i18n::t_with_args(
                key,
                &[
                    ("weight", &format!("{:.3}", weight_per_batch_kg)),
                    ("minimum", &format!("{:.3}", minimum_kg)),
                ],
            ),
            BatchAdvisory::RemainderUnits { remainder_units } => {
                crate::i18n::t_with_args(key, &[("units", &remainder_units.to_string())])
            }
        }
    }
}

/// 评估批次计划的提示项
pub fn evaluate_advisories(plan: &BatchPlan, policy: &BatchPolicy) -> Vec<BatchAdvisory> {
    let mut advisories = Vec::new();

    if plan.batch_count > policy.max_batch_count {
        advisories.push(BatchAdvisory::ExcessiveBatchCount {
            batch_count: plan.batch_count,
            limit: policy.max_batch_count,
        });
    }
    if plan.weight_per_batch_kg < policy.min_batch_weight_kg {
        advisories.push(BatchAdvisory::SmallBatchWeight {
            weight_per_batch_kg: plan.weight_per_batch_kg,
            minimum_kg: policy.min_batch_weight_kg,
        });
    }
    if plan.remainder_units > 0 {
        advisories.push(BatchAdvisory::RemainderUnits {
            remainder_units: plan.remainder_units,
        });
    }

    advisories
}

/// 重量四舍五入到克
fn round_to_grams(kg: f64) -> f64 {
    (kg * 1000.0).round() / 1000.0
}

/// 按批次计划生成批次记录
///
/// 全部批次位于第一道工位 (LAVADO),状态 PENDING
pub fn build_batches(order_id: &str, plan: &BatchPlan) -> Vec<Batch> {
    let now = chrono::Local::now().naive_local();
    let units_in_batch = plan.quantity_units as f64 / plan.batch_count as f64;
    let weight_kg = round_to_grams(plan.weight_per_batch_kg);

    (1..=plan.batch_count)
        .map(|sequence_no| Batch {
            batch_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            sequence_no,
            units_in_batch,
            weight_kg,
            current_station: StationCatalog::first(),
            state: BatchState::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
        .collect()
}
