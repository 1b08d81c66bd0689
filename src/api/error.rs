// ==========================================
// 冷冻食品生产批次流程系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换 Repository / Engine 错误为用户可读的错误消息
// 红线: 所有错误信息必须包含显式原因; 无原因时使用本地化兜底文案
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与业务规则错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("未知工位: {0}")]
    UnknownStation(String),

    #[error("无效订单: {0}")]
    InvalidOrder(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 激活错误
    // ==========================================
    /// 订单不是 PLANNED 或原料预留失败; 订单保持 PLANNED
    #[error("订单激活失败: {0}")]
    ActivationError(String),

    /// 存储超时且重新查询后仍无法确认结果
    #[error("激活结果未知: order_id={order_id}, observed_state={observed_state}")]
    AmbiguousOutcome {
        order_id: String,
        observed_state: String,
    },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向操作员的提示
    ///
    /// 有显式原因时原样返回, 否则返回本地化兜底文案
    pub fn user_message(&self) -> String {
        let reason = match self {
            ApiError::ValidationError(msg)
            | ApiError::InvalidInput(msg)
            | ApiError::UnknownStation(msg)
            | ApiError::InvalidOrder(msg)
            | ApiError::NotFound(msg)
            | ApiError::BusinessRuleViolation(msg)
            | ApiError::ActivationError(msg)
            | ApiError::OptimisticLockFailure(msg)
            | ApiError::ImportError(msg) => msg.trim().to_string(),
            ApiError::InvalidStateTransition { from, to } => format!("{} → {}", from, to),
            ApiError::AmbiguousOutcome {
                order_id,
                observed_state,
            } => crate::i18n::t_with_args(
                "error.ambiguous_outcome",
                &[("order_id", order_id), ("state", observed_state)],
            ),
            // 技术性错误不直接暴露给操作员
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => String::new(),
        };

        if reason.is_empty() {
            crate::i18n::t("error.generic_fallback")
        } else {
            reason
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "{}(id={})状态已变化（期望{}，实际{}）",
                entity, id, expected, actual
            )),
            RepositoryError::Timeout(msg) => {
                ApiError::DatabaseError(format!("数据库操作超时: {}", msg))
            }

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 库存错误
            RepositoryError::InsufficientStock {
                material_sku,
                required_grams,
                available_grams,
            } => ApiError::ActivationError(format!(
                "原料{}库存不足: 需要{}g, 可用{}g",
                material_sku, required_grams, available_grams
            )),

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::UnknownStation(code) => ApiError::UnknownStation(code),
            EngineError::InvalidOrder(msg) => ApiError::InvalidOrder(msg),
            EngineError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
