// ==========================================
// 冷冻食品生产批次流程系统 - 配置管理 API
// ==========================================
// 职责: 生产参数查询/校验/更新、批次提示阈值、配置快照
// 红线: 余数件只作为警告返回, 由调用方确认
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{validate, BatchPolicy, ConfigManager, ConfigValidation, ProductionConfig};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::ActionLogRepository;

/// 生产参数更新结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigUpdateResult {
    pub config: ProductionConfig,
    pub validation: ConfigValidation,
    pub warning: Option<String>,
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 生产参数读取与校验
/// 2. 生产参数/提示阈值原子更新
/// 3. ActionLog记录
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            config_manager,
            action_log_repo,
        }
    }

    pub fn get_production_config(&self) -> ApiResult<ProductionConfig> {
        Ok(self.config_manager.load_production_config()?)
    }

    pub fn get_batch_policy(&self) -> ApiResult<BatchPolicy> {
        Ok(self.config_manager.load_batch_policy()?)
    }

    /// 校验参数组合 (不落库)
    ///
    /// # 返回
    /// - Ok(ConfigValidation::Ok)
    /// - Ok(ConfigValidation::RemainderWarning): 可继续, 需确认
    /// - Err(ValidationError): 参数 ≤ 0
    pub fn validate_production_config(
        &self,
        base_order_quantity: i64,
        fixed_batch_count: i64,
    ) -> ApiResult<ConfigValidation> {
        Ok(validate(base_order_quantity, fixed_batch_count)?)
    }

    /// 更新生产参数 (两个键同一事务)
    ///
    /// 余数件不阻断更新, 警告随结果返回
    pub fn set_production_config(
        &self,
        base_order_quantity: i64,
        fixed_batch_count: i64,
        operator: &str,
    ) -> ApiResult<ConfigUpdateResult> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let validation = validate(base_order_quantity, fixed_batch_count)?;
        let config = ProductionConfig {
            base_order_quantity,
            fixed_batch_count,
        };
        let previous = self.config_manager.load_production_config()?;
        self.config_manager.set_production_config(&config)?;

        let warning = validation.warning();
        if let Some(w) = &warning {
            tracing::warn!(base_order_quantity, fixed_batch_count, "{}", w);
        }

        self.record_action(ActionLog::now(
            None,
            ActionType::UpdateConfig,
            operator,
            Some(serde_json::json!({
                "previous": previous,
                "current": config,
                "validation": validation,
            })),
            crate::i18n::t("config.updated"),
        ));

        Ok(ConfigUpdateResult {
            config,
            validation,
            warning,
        })
    }

    /// 更新批次提示阈值
    pub fn set_batch_policy(&self, policy: BatchPolicy, operator: &str) -> ApiResult<BatchPolicy> {
        if policy.max_batch_count <= 0 {
            return Err(ApiError::ValidationError(format!(
                "max_batch_count 必须大于 0, 实际 {}",
                policy.max_batch_count
            )));
        }
        if !policy.min_batch_weight_kg.is_finite() || policy.min_batch_weight_kg < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "min_batch_weight_kg 必须为非负数, 实际 {}",
                policy.min_batch_weight_kg
            )));
        }

        self.config_manager.set_batch_policy(&policy)?;
        self.record_action(ActionLog::now(
            None,
            ActionType::UpdateConfig,
            operator,
            Some(serde_json::json!({ "batch_policy": policy })),
            crate::i18n::t("config.updated"),
        ));
        Ok(policy)
    }

    /// 配置快照 (JSON)
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    fn record_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}
