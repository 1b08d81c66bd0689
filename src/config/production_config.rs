// ==========================================
// 冷冻食品生产批次流程系统 - 生产参数
// ==========================================
// 职责: 基础订单数量 / 固定批次数 / 批次提示阈值
// 说明: 全局单例由 ConfigManager 持久化,使用时按值传入引擎
// 红线: 余数件为警告,不是错误
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// 默认基础订单数量 (件)
pub const DEFAULT_BASE_ORDER_QUANTITY: i64 = 500;

/// 默认固定批次数
pub const DEFAULT_FIXED_BATCH_COUNT: i64 = 10;

/// 批次数超过该值时提示"批次过多"
pub const DEFAULT_MAX_BATCH_COUNT: i64 = 100;

/// 单批重量低于该值 (kg) 时提示"批次过小"
pub const DEFAULT_MIN_BATCH_WEIGHT_KG: f64 = 1.0;

// ==========================================
// ProductionConfig - 生产参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionConfig {
    pub base_order_quantity: i64, // 新订单默认数量
    pub fixed_batch_count: i64,   // 每个激活订单拆分的批次数
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            base_order_quantity: DEFAULT_BASE_ORDER_QUANTITY,
            fixed_batch_count: DEFAULT_FIXED_BATCH_COUNT,
        }
    }
}

impl ProductionConfig {
    /// 校验参数组合
    ///
    /// # 返回
    /// - Err(Validation): 任一参数 ≤ 0
    /// - Ok(ConfigValidation::RemainderWarning): 不能整除,需调用方确认
    /// - Ok(ConfigValidation::Ok): 可直接使用
    pub fn validate(&self) -> EngineResult<ConfigValidation> {
        validate(self.base_order_quantity, self.fixed_batch_count)
    }
}

/// 校验基础订单数量与固定批次数
pub fn validate(base_order_quantity: i64, fixed_batch_count: i64) -> EngineResult<ConfigValidation> {
    if base_order_quantity <= 0 {
        return Err(EngineError::Validation(format!(
            "base_order_quantity 必须大于 0, 实际 {}",
            base_order_quantity
        )));
    }
    if fixed_batch_count <= 0 {
        return Err(EngineError::Validation(format!(
            "fixed_batch_count 必须大于 0, 实际 {}",
            fixed_batch_count
        )));
    }

    let remainder = base_order_quantity % fixed_batch_count;
    if remainder == 0 {
        Ok(ConfigValidation::Ok)
    } else {
        Ok(ConfigValidation::RemainderWarning {
            remainder_units: remainder,
        })
    }
}

// ==========================================
// ConfigValidation - 参数校验结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigValidation {
    Ok,
    RemainderWarning { remainder_units: i64 },
}

impl ConfigValidation {
    pub fn is_ok(&self) -> bool {
        matches!(self, ConfigValidation::Ok)
    }

    /// 警告文本 ("remainder units: N")
    pub fn warning(&self) -> Option<String> {
        match self {
            ConfigValidation::Ok => None,
            ConfigValidation::RemainderWarning { remainder_units } => {
                Some(format!("remainder units: {}", remainder_units))
            }
        }
    }
}

// ==========================================
// BatchPolicy - 批次提示阈值 (仅提示,不阻断)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchPolicy {
    pub max_batch_count: i64,
    pub min_batch_weight_kg: f64,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_batch_count: DEFAULT_MAX_BATCH_COUNT,
            min_batch_weight_kg: DEFAULT_MIN_BATCH_WEIGHT_KG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_exact_division() {
        assert_eq!(validate(500, 10).unwrap(), ConfigValidation::Ok);
        assert!(ProductionConfig::default().validate().unwrap().is_ok());
    }

    #[test]
    fn test_validate_remainder_is_warning() {
        let result = validate(503, 10).unwrap();
        assert_eq!(result, ConfigValidation::RemainderWarning { remainder_units: 3 });
        assert_eq!(result.warning().as_deref(), Some("remainder units: 3"));
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        assert!(matches!(validate(0, 10), Err(EngineError::Validation(_))));
        assert!(matches!(validate(500, 0), Err(EngineError::Validation(_))));
        assert!(matches!(validate(-5, 10), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_validation_serialization() {
        let json = serde_json::to_value(ConfigValidation::RemainderWarning { remainder_units: 3 })
            .unwrap();
        assert_eq!(json["status"], "REMAINDER_WARNING");
        assert_eq!(json["remainder_units"], 3);
    }
}
