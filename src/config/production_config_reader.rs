// ==========================================
// 冷冻食品生产批次流程系统 - 生产参数读取 Trait
// ==========================================
// 职责: 定义生产流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::production_config::{BatchPolicy, ProductionConfig};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ProductionConfigReader Trait
// ==========================================
// 用途: 激活订单时读取"当前"生产参数
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ProductionConfigReader: Send + Sync {
    /// 获取基础订单数量
    ///
    /// # 默认值
    /// - 500
    async fn get_base_order_quantity(&self) -> RepositoryResult<i64>;

    /// 获取固定批次数
    ///
    /// # 默认值
    /// - 10
    async fn get_fixed_batch_count(&self) -> RepositoryResult<i64>;

    /// 获取批次提示阈值
    ///
    /// # 默认值
    /// - max_batch_count = 100, min_batch_weight_kg = 1.0
    async fn get_batch_policy(&self) -> RepositoryResult<BatchPolicy>;

    /// 一次读取完整生产参数 (两个键在同一语句中读取)
    async fn get_production_config(&self) -> RepositoryResult<ProductionConfig>;
}
