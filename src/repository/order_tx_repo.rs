// ==========================================
// 冷冻食品生产批次流程系统 - 订单事务网关 Trait
// ==========================================
// 职责: 激活/取消的多表原子写入 (订单 + 批次 + 预留 + 日志)
// 实现者: OrderTransactionRepository (rusqlite)
// 红线: 任一步失败整体回滚, 不留半激活状态
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::batch::Batch;
use crate::domain::catalog::MaterialRequirement;
use crate::domain::order::ProductionOrder;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// 激活提交内容
#[derive(Debug, Clone)]
pub struct ActivationCommit {
    pub order_id: String,
    pub batch_count: i64,
    pub unit_weight_grams: f64,
    pub total_weight_kg: f64,
    pub batches: Vec<Batch>,
    pub requirements: Vec<MaterialRequirement>,
    pub log: ActionLog,
}

/// 取消提交内容
///
/// 取消哪些批次、释放多少预留都在事务内按当时的批次行重新判定,
/// 调用方只提供订单与日志
#[derive(Debug, Clone)]
pub struct CancellationCommit {
    pub order_id: String,
    pub log: ActionLog,
}

/// 取消事务的实际结果
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationOutcome {
    pub cancelled_batches: usize,
    pub release_fraction: f64,
    /// 事务开始时订单已是 CANCELLED (无任何写入)
    pub already_cancelled: bool,
}

#[async_trait]
pub trait OrderTransactionGateway: Send + Sync {
    /// 原子激活: 校验 PLANNED → 预留原料 → 写入批次 → 订单 ACTIVE
    ///
    /// # 返回
    /// - Err(InsufficientStock): 库存不足, 无任何写入
    /// - Err(OptimisticLockFailure): 订单已不是 PLANNED
    /// - Err(Timeout): 结果未知, 调用方需重新查询订单
    async fn commit_activation(&self, commit: &ActivationCommit) -> RepositoryResult<()>;

    /// 原子取消: 校验 PLANNED/ACTIVE → 取消未完工批次 → 按比例释放预留 → 订单 CANCELLED
    ///
    /// # 返回
    /// - Ok(already_cancelled = true): 订单已取消, 无操作
    /// - Err(OptimisticLockFailure): 订单已不是 PLANNED/ACTIVE (如已暂停或已消耗)
    /// - Err(Timeout): 结果未知, 调用方需重新查询订单
    async fn commit_cancellation(&self, commit: &CancellationCommit) -> RepositoryResult<CancellationOutcome>;

    /// 重新读取订单 (用于超时后的结果确认)
    async fn find_order(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>>;
}
