// ==========================================
// 冷冻食品生产批次流程系统 - 生产订单 API
// ==========================================
// 职责: 订单创建、批次预览、激活、暂停/恢复、取消、查询
// 红线: 每个命令提交后重新查询并返回最新状态, 不缓存订单/批次
// 红线: 激活超时必须重新查询确认结果, 不能盲目重试
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::production_config::{self, ProductionConfig};
use crate::config::ProductionConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::batch::{Batch, BatchProgress};
use crate::domain::catalog::{explode_bom, UnitWeight};
use crate::domain::order::{OrderFilter, ProductionOrder};
use crate::domain::types::OrderState;
use crate::engine::{
    compute_batch_plan, evaluate_advisories, BatchAdvisory, BatchPlan, CancellationPlan,
    OrderLifecycleEngine,
};
use crate::repository::{
    ActionLogRepository, ActivationCommit, BatchRepository, CancellationCommit, CancellationOutcome,
    CatalogRepository, MaterialReservation, OrderTransactionGateway, ProductionOrderRepository, RepositoryError,
    ReservationRepository,
};

// ==========================================
// 响应结构
// ==========================================

/// 批次计划预览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlanPreview {
    pub plan: BatchPlan,
    pub unit_weight: UnitWeight,
    pub advisories: Vec<BatchAdvisory>,
    pub advisory_messages: Vec<String>,
    /// 生产参数不能整除时的提示 ("remainder units: N")
    pub config_warning: Option<String>,
}

/// 激活结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationResult {
    pub order: ProductionOrder,
    pub batches: Vec<Batch>,
    pub preview: BatchPlanPreview,
    /// 存储超时后经重新查询确认成功
    pub recovered: bool,
}

/// 取消结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationResult {
    pub order: ProductionOrder,
    pub cancelled_batches: usize,
    pub already_cancelled: bool,
}

/// 订单详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: ProductionOrder,
    pub batches: Vec<Batch>,
    pub progress: BatchProgress,
    pub reservations: Vec<MaterialReservation>,
}

// ==========================================
// ProductionApi - 生产订单 API
// ==========================================
pub struct ProductionApi {
    order_repo: Arc<ProductionOrderRepository>,
    batch_repo: Arc<BatchRepository>,
    catalog_repo: Arc<CatalogRepository>,
    reservation_repo: Arc<ReservationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    gateway: Arc<dyn OrderTransactionGateway>,
    config_reader: Arc<dyn ProductionConfigReader>,
    engine: OrderLifecycleEngine,
}

impl ProductionApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_repo: Arc<ProductionOrderRepository>,
        batch_repo: Arc<BatchRepository>,
        catalog_repo: Arc<CatalogRepository>,
        reservation_repo: Arc<ReservationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        gateway: Arc<dyn OrderTransactionGateway>,
        config_reader: Arc<dyn ProductionConfigReader>,
    ) -> Self {
        Self {
            order_repo,
            batch_repo,
            catalog_repo,
            reservation_repo,
            action_log_repo,
            gateway,
            config_reader,
            engine: OrderLifecycleEngine::new(),
        }
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建生产订单 (PLANNED)
    pub fn create_order(
        &self,
        sku: &str,
        quantity_units: i64,
        responsible: &str,
        notes: Option<&str>,
    ) -> ApiResult<ProductionOrder> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(ApiError::InvalidInput("SKU不能为空".to_string()));
        }

        let product = self.catalog_repo.find_product(sku)?;
        self.engine
            .validate_new_order(product.as_ref(), sku, quantity_units, responsible)?;

        let order = ProductionOrder::new_planned(
            sku.to_string(),
            quantity_units,
            responsible.trim().to_string(),
            notes.map(|n| n.to_string()).filter(|n| !n.trim().is_empty()),
        );
        self.order_repo.insert(&order)?;

        self.record_action(ActionLog::now(
            Some(&order.order_id),
            ActionType::CreateOrder,
            responsible,
            Some(serde_json::json!({
                "sku": order.sku,
                "quantity_units": order.quantity_units,
            })),
            format!("创建订单 {} x {}", order.sku, order.quantity_units),
        ));
        tracing::info!(order_id = %order.order_id, sku = %order.sku, quantity = order.quantity_units, "订单已创建");

        Ok(self.order_repo.get(&order.order_id)?)
    }

    /// 新订单的建议数量 (基础订单数量)
    pub async fn suggested_quantity(&self) -> ApiResult<i64> {
        Ok(self.config_reader.get_base_order_quantity().await?)
    }

    // ==========================================
    // 预览
    // ==========================================

    /// 按当前生产参数预览批次计划 (不落库)
    pub async fn preview_batch_plan(&self, sku: &str, quantity_units: i64) -> ApiResult<BatchPlanPreview> {
        let config = self.config_reader.get_production_config().await?;
        let unit_weight = self.unit_weight_for(sku)?;
        let plan = compute_batch_plan(quantity_units, unit_weight.grams, config.fixed_batch_count)?;
        self.build_preview(plan, unit_weight, &config).await
    }

    async fn build_preview(
        &self,
        plan: BatchPlan,
        unit_weight: UnitWeight,
        config: &ProductionConfig,
    ) -> ApiResult<BatchPlanPreview> {
        let policy = self.config_reader.get_batch_policy().await?;
        let advisories = evaluate_advisories(&plan, &policy);
        let config_warning = production_config::validate(plan.quantity_units, config.fixed_batch_count)?
            .warning();

        Ok(BatchPlanPreview {
            advisory_messages: advisories.iter().map(|a| a.message()).collect(),
            plan,
            unit_weight,
            advisories,
            config_warning,
        })
    }

    fn unit_weight_for(&self, sku: &str) -> ApiResult<UnitWeight> {
        let unit_weight = self.catalog_repo.unit_weight(sku)?;
        if unit_weight.is_fallback() {
            tracing::warn!(sku = %sku, grams = unit_weight.grams, "BOM为空，使用默认单件重量");
        }
        Ok(unit_weight)
    }

    // ==========================================
    // 激活
    // ==========================================

    /// 激活订单: 生成批次、预留原料、订单 ACTIVE (原子)
    ///
    /// # 错误
    /// - ActivationError: 订单非 PLANNED / 原料不足 (订单保持 PLANNED)
    /// - AmbiguousOutcome: 存储超时且重新查询后订单不是 ACTIVE
    pub async fn activate_order(&self, order_id: &str, operator: &str) -> ApiResult<ActivationResult> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let order = self.order_repo.get(order_id)?;
        if order.state != OrderState::Planned {
            return Err(ApiError::ActivationError(format!(
                "订单{}当前状态为{}，只有PLANNED订单可以激活",
                order_id, order.state
            )));
        }

        // 读取当前参数后按值传入引擎
        let config = self.config_reader.get_production_config().await?;
        let bom = self.catalog_repo.find_bom(&order.sku)?;
        let unit_weight = UnitWeight::from_bom(&bom);
        if unit_weight.is_fallback() {
            tracing::warn!(order_id = %order_id, sku = %order.sku, "BOM为空，使用默认单件重量");
        }

        let draft = self
            .engine
            .prepare_activation(&order, &config, unit_weight)
            .map_err(|e| ApiError::ActivationError(e.to_string()))?;
        let preview = self.build_preview(draft.plan.clone(), unit_weight, &config).await?;
        for advisory in &preview.advisories {
            tracing::warn!(order_id = %order_id, advisory = ?advisory, "批次计划提示");
        }

        let commit = ActivationCommit {
            order_id: order.order_id.clone(),
            batch_count: draft.plan.batch_count,
            unit_weight_grams: draft.plan.unit_weight_grams,
            total_weight_kg: draft.plan.total_weight_kg,
            batches: draft.batches,
            requirements: explode_bom(&bom, order.quantity_units),
            log: ActionLog::now(
                Some(&order.order_id),
                ActionType::ActivateOrder,
                operator,
                Some(serde_json::json!({
                    "batch_count": draft.plan.batch_count,
                    "unit_weight_grams": draft.plan.unit_weight_grams,
                    "total_weight_kg": draft.plan.total_weight_kg,
                    "remainder_units": draft.plan.remainder_units,
                })),
                format!("激活订单，拆分{}批", draft.plan.batch_count),
            ),
        };

        let recovered = match self.gateway.commit_activation(&commit).await {
            Ok(()) => false,
            Err(e) if e.is_timeout() => self.confirm_after_timeout(order_id, &e).await?,
            Err(RepositoryError::OptimisticLockFailure { actual, .. }) => {
                return Err(ApiError::ActivationError(format!(
                    "订单{}已被其他操作修改，当前状态{}",
                    order_id, actual
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let order = self.order_repo.get(order_id)?;
        let batches = self.batch_repo.list_by_order(order_id)?;
        tracing::info!(
            order_id = %order_id,
            batch_count = batches.len(),
            total_weight_kg = order.total_weight_kg.unwrap_or_default(),
            recovered,
            "订单已激活"
        );

        Ok(ActivationResult {
            order,
            batches,
            preview,
            recovered,
        })
    }

    /// 超时后重新查询订单: ACTIVE 视为成功, 否则结果未知
    async fn confirm_after_timeout(&self, order_id: &str, cause: &RepositoryError) -> ApiResult<bool> {
        tracing::warn!(order_id = %order_id, error = %cause, "激活提交超时，重新查询订单状态");

        let observed = self.gateway.find_order(order_id).await?;
        match observed {
            Some(order) if order.state == OrderState::Active => {
                tracing::info!(
                    order_id = %order_id,
                    "{}",
                    crate::i18n::t("common.recovered")
                );
                Ok(true)
            }
            other => {
                let observed_state = other
                    .map(|o| o.state.to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                tracing::error!(order_id = %order_id, observed_state = %observed_state, "激活结果无法确认");
                Err(ApiError::AmbiguousOutcome {
                    order_id: order_id.to_string(),
                    observed_state,
                })
            }
        }
    }

    // ==========================================
    // 暂停 / 恢复
    // ==========================================

    /// 暂停订单 (ACTIVE → PAUSED), 暂停期间批次不能推进
    pub fn pause_order(&self, order_id: &str, operator: &str, reason: &str) -> ApiResult<ProductionOrder> {
        self.transition(
            order_id,
            OrderState::Active,
            OrderState::Paused,
            ActionType::PauseOrder,
            operator,
            reason,
        )
    }

    /// 恢复订单 (PAUSED → ACTIVE)
    pub fn resume_order(&self, order_id: &str, operator: &str, reason: &str) -> ApiResult<ProductionOrder> {
        self.transition(
            order_id,
            OrderState::Paused,
            OrderState::Active,
            ActionType::ResumeOrder,
            operator,
            reason,
        )
    }

    fn transition(
        &self,
        order_id: &str,
        required: OrderState,
        target: OrderState,
        action: ActionType,
        operator: &str,
        reason: &str,
    ) -> ApiResult<ProductionOrder> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let order = self.order_repo.get(order_id)?;
        // PLANNED → ACTIVE 只能走激活流程
        if order.state != required {
            return Err(ApiError::InvalidStateTransition {
                from: order.state.to_string(),
                to: target.to_string(),
            });
        }
        self.engine.check_transition(order.state, target)?;
        self.order_repo.update_state(order_id, order.state, target)?;

        self.record_action(ActionLog::now(
            Some(order_id),
            action,
            operator,
            Some(serde_json::json!({ "from": order.state, "to": target })),
            reason,
        ));
        tracing::info!(order_id = %order_id, from = %order.state, to = %target, "订单状态已变更");

        Ok(self.order_repo.get(order_id)?)
    }

    // ==========================================
    // 取消
    // ==========================================

    /// 取消订单: 未完工批次 CANCELLED, 释放预留
    ///
    /// 已取消订单再次取消为无操作成功。
    /// 事务外的判定只用于快速失败, 取消范围与释放比例以事务内重新读取的结果为准
    pub async fn cancel_order(&self, order_id: &str, operator: &str, reason: &str) -> ApiResult<CancellationResult> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let order = self.order_repo.get(order_id)?;
        let batches = self.batch_repo.list_by_order(order_id)?;
        if let CancellationPlan::AlreadyCancelled = self.engine.plan_cancellation(&order, &batches)? {
            tracing::debug!(order_id = %order_id, "订单已取消，忽略重复取消");
            return Ok(CancellationResult {
                order,
                cancelled_batches: 0,
                already_cancelled: true,
            });
        }

        let commit = CancellationCommit {
            order_id: order_id.to_string(),
            log: ActionLog::now(Some(order_id), ActionType::CancelOrder, operator, None, reason),
        };

        let outcome = match self.gateway.commit_cancellation(&commit).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_timeout() => {
                tracing::warn!(order_id = %order_id, error = %e, "取消提交超时，重新查询订单状态");
                let observed = self.gateway.find_order(order_id).await?;
                if !matches!(observed, Some(ref o) if o.state == OrderState::Cancelled) {
                    return Err(e.into());
                }
                let progress = BatchProgress::from_batches(&self.batch_repo.list_by_order(order_id)?);
                CancellationOutcome {
                    cancelled_batches: progress.cancelled,
                    release_fraction: progress.release_fraction(),
                    already_cancelled: false,
                }
            }
            Err(RepositoryError::OptimisticLockFailure { actual, .. }) => {
                return Err(ApiError::InvalidStateTransition {
                    from: actual,
                    to: OrderState::Cancelled.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            order_id = %order_id,
            cancelled_batches = outcome.cancelled_batches,
            release_fraction = outcome.release_fraction,
            already_cancelled = outcome.already_cancelled,
            "订单已取消"
        );
        Ok(CancellationResult {
            order: self.order_repo.get(order_id)?,
            cancelled_batches: outcome.cancelled_batches,
            already_cancelled: outcome.already_cancelled,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<ProductionOrder>> {
        Ok(self.order_repo.list(filter)?)
    }

    pub fn get_order_detail(&self, order_id: &str) -> ApiResult<OrderDetail> {
        let order = self.order_repo.get(order_id)?;
        let batches = self.batch_repo.list_by_order(order_id)?;
        let reservations = self.reservation_repo.find_by_order(order_id)?;
        Ok(OrderDetail {
            progress: BatchProgress::from_batches(&batches),
            order,
            batches,
            reservations,
        })
    }

    pub fn get_order_history(&self, order_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_order_id(order_id)?)
    }

    /// 最近的操作记录 (全部订单与配置变更, 新的在前)
    pub fn recent_activity(&self, limit: usize) -> ApiResult<Vec<ActionLog>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit必须大于0".to_string()));
        }
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    /// 记录操作日志 (失败只告警, 不影响已提交的业务操作)
    fn record_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}
