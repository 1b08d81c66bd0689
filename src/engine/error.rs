// ==========================================
// 冷冻食品生产批次流程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 纯函数前置条件失败,立即返回,不重试
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 输入形状/范围错误
    #[error("数据验证失败: {0}")]
    Validation(String),

    /// 未知工位代码
    #[error("未知工位: {0}")]
    UnknownStation(String),

    /// 订单数据错误
    #[error("无效订单: {0}")]
    InvalidOrder(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
