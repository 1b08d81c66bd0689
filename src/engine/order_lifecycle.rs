// ==========================================
// 冷冻食品生产批次流程系统 - 订单生命周期引擎
// ==========================================
// 状态机:
//   PLANNED ──activate──▶ ACTIVE ──(全部批次完工)──▶ CONSUMED
//      │                  │  ▲
//      │             pause│  │resume
//      │                  ▼  │
//      │                 PAUSED
//      └──cancel──▶ CANCELLED ◀──cancel── ACTIVE
// ==========================================
// 职责: 判定状态转换、生成激活/取消/推进结果
// 红线: 引擎不落库,持久化由调用方在同一事务中完成
// ==========================================

use crate::config::production_config::ProductionConfig;
use crate::domain::batch::{Batch, BatchProgress};
use crate::domain::catalog::{Product, UnitWeight};
use crate::domain::order::ProductionOrder;
use crate::domain::station::Station;
use crate::domain::types::{BatchState, OrderState};
use crate::engine::batch_sizing::{build_batches, compute_batch_plan, BatchPlan};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::station_catalog::StationCatalog;
use serde::{Deserialize, Serialize};

// ==========================================
// 引擎输出
// ==========================================

/// 激活草案: 批次计划 + 待写入的批次
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationDraft {
    pub plan: BatchPlan,
    pub unit_weight: UnitWeight,
    pub batches: Vec<Batch>,
}

/// 取消计划
#[derive(Debug, Clone, PartialEq)]
pub enum CancellationPlan {
    /// 订单已取消,无需任何操作
    AlreadyCancelled,
    /// 取消订单及列出的批次
    ///
    /// release_fraction: 原料预留释放比例 (未完工批次数 / 总批次数, 无批次时为 1.0)
    Cancel {
        batch_ids: Vec<String>,
        release_fraction: f64,
    },
}

/// 批次推进结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAdvance {
    pub from_station: Station,
    pub to_station: Station,   // 完工时保持在末道工位
    pub new_state: BatchState, // PENDING (进入下一工位) 或 COMPLETED
}

impl BatchAdvance {
    pub fn is_completion(&self) -> bool {
        self.new_state == BatchState::Completed
    }
}

// ==========================================
// OrderLifecycleEngine - 订单生命周期引擎
// ==========================================
pub struct OrderLifecycleEngine {
    // 无状态引擎
}

impl OrderLifecycleEngine {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 状态转换表
    // ==========================================

    /// 判断订单状态转换是否合法
    pub fn can_transition(&self, from: OrderState, to: OrderState) -> bool {
        use OrderState::*;
        matches!(
            (from, to),
            (Planned, Active)
                | (Planned, Cancelled)
                | (Active, Paused)
                | (Active, Consumed)
                | (Active, Cancelled)
                | (Paused, Active)
        )
    }

    /// 校验订单状态转换
    pub fn check_transition(&self, from: OrderState, to: OrderState) -> EngineResult<()> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 校验新订单
    ///
    /// # 规则
    /// - quantity_units ≤ 0 → InvalidOrder
    /// - SKU 不在目录中 → InvalidOrder
    /// - SKU 为原料 → InvalidOrder
    /// - 负责人为空 → Validation
    pub fn validate_new_order(
        &self,
        product: Option<&Product>,
        sku: &str,
        quantity_units: i64,
        responsible: &str,
    ) -> EngineResult<()> {
        if quantity_units <= 0 {
            return Err(EngineError::InvalidOrder(format!(
                "订单数量必须大于 0, 实际 {}",
                quantity_units
            )));
        }
        let product = product
            .ok_or_else(|| EngineError::InvalidOrder(format!("SKU 不存在: {}", sku)))?;
        if product.is_raw_material {
            return Err(EngineError::InvalidOrder(format!(
                "SKU {} 为原料,不能下生产订单",
                sku
            )));
        }
        if responsible.trim().is_empty() {
            return Err(EngineError::Validation("负责人不能为空".to_string()));
        }
        Ok(())
    }

    // ==========================================
    // 激活
    // ==========================================

    /// 生成激活草案
    ///
    /// # 参数
    /// - order: 待激活订单 (必须为 PLANNED)
    /// - config: 当前生产参数 (调用方读取后传入)
    /// - unit_weight: 订单成品的单件重量
    pub fn prepare_activation(
        &self,
        order: &ProductionOrder,
        config: &ProductionConfig,
        unit_weight: UnitWeight,
    ) -> EngineResult<ActivationDraft> {
        if order.state != OrderState::Planned {
            // Paused → Active 属于恢复,不是激活
            return Err(EngineError::InvalidStateTransition {
                from: order.state.to_string(),
                to: OrderState::Active.to_string(),
            });
        }

        let plan = compute_batch_plan(
            order.quantity_units,
            unit_weight.grams,
            config.fixed_batch_count,
        )?;
        let batches = build_batches(&order.order_id, &plan);

        Ok(ActivationDraft {
            plan,
            unit_weight,
            batches,
        })
    }

    // ==========================================
    // 取消
    // ==========================================

    /// 生成取消计划
    ///
    /// # 规则
    /// - CANCELLED → AlreadyCancelled (幂等)
    /// - PLANNED / ACTIVE → 取消全部未完工批次
    /// - 其他 → InvalidStateTransition
    pub fn plan_cancellation(
        &self,
        order: &ProductionOrder,
        batches: &[Batch],
    ) -> EngineResult<CancellationPlan> {
        if order.state == OrderState::Cancelled {
            return Ok(CancellationPlan::AlreadyCancelled);
        }
        self.check_transition(order.state, OrderState::Cancelled)?;

        let order_batches: Vec<Batch> = batches
            .iter()
            .filter(|b| b.order_id == order.order_id)
            .cloned()
            .collect();
        let batch_ids: Vec<String> = order_batches
            .iter()
            .filter(|b| b.is_open())
            .map(|b| b.batch_id.clone())
            .collect();
        let release_fraction = BatchProgress::from_batches(&order_batches).release_fraction();

        Ok(CancellationPlan::Cancel {
            batch_ids,
            release_fraction,
        })
    }

    // ==========================================
    // 批次推进
    // ==========================================

    /// 开始加工: PENDING → IN_PROGRESS
    pub fn start_batch(&self, batch: &Batch, order_state: OrderState) -> EngineResult<BatchState> {
        self.ensure_order_running(order_state)?;
        if batch.state != BatchState::Pending {
            return Err(EngineError::InvalidStateTransition {
                from: batch.state.to_string(),
                to: BatchState::InProgress.to_string(),
            });
        }
        Ok(BatchState::InProgress)
    }

    /// 完成当前工位
    ///
    /// # 规则
    /// - 批次必须为 PENDING / IN_PROGRESS,订单必须为 ACTIVE
    /// - 有下一工位: 移至下一工位, 状态 PENDING
    /// - 末道工位 (EMPAQUETADO): 状态 COMPLETED
    pub fn advance_batch(&self, batch: &Batch, order_state: OrderState) -> EngineResult<BatchAdvance> {
        self.ensure_order_running(order_state)?;
        if batch.state.is_terminal() {
            return Err(EngineError::InvalidStateTransition {
                from: batch.state.to_string(),
                to: BatchState::Completed.to_string(),
            });
        }

        let advance = match StationCatalog::successor_of(batch.current_station) {
            Some(next) => BatchAdvance {
                from_station: batch.current_station,
                to_station: next,
                new_state: BatchState::Pending,
            },
            None => BatchAdvance {
                from_station: batch.current_station,
                to_station: batch.current_station,
                new_state: BatchState::Completed,
            },
        };
        Ok(advance)
    }

    fn ensure_order_running(&self, order_state: OrderState) -> EngineResult<()> {
        if order_state != OrderState::Active {
            return Err(EngineError::InvalidStateTransition {
                from: format!("order:{}", order_state),
                to: "batch progress".to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 汇总
    // ==========================================

    /// 批次汇总后的订单状态
    ///
    /// 仅当订单 ACTIVE 且全部批次 COMPLETED 时返回 Some(CONSUMED)
    pub fn rollup_order_state(&self, order_state: OrderState, batches: &[Batch]) -> Option<OrderState> {
        if order_state != OrderState::Active {
            return None;
        }
        if BatchProgress::from_batches(batches).all_completed() {
            Some(OrderState::Consumed)
        } else {
            None
        }
    }
}

impl Default for OrderLifecycleEngine {
    fn default() -> Self {
        Self::new()
    }
}
