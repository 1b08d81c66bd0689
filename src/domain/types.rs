// ==========================================
// 冷冻食品生产批次流程系统 - 领域类型定义
// ==========================================
// 订单状态 / 批次状态 / 损耗原因 / 计量单位
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 枚举解析失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的{}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

// ==========================================
// 生产订单状态 (Order State)
// ==========================================
// PLANNED → ACTIVE → CONSUMED
//             ↕
//           PAUSED
// CANCELLED 只能从 PLANNED / ACTIVE 进入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Planned,   // 已计划
    Active,    // 生产中
    Consumed,  // 已完成(全部批次完工)
    Paused,    // 暂停
    Cancelled, // 已取消
}

impl OrderState {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderState::Planned => "PLANNED",
            OrderState::Active => "ACTIVE",
            OrderState::Consumed => "CONSUMED",
            OrderState::Paused => "PAUSED",
            OrderState::Cancelled => "CANCELLED",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Consumed | OrderState::Cancelled)
    }

    /// 是否允许取消
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderState::Planned | OrderState::Active)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for OrderState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLANNED" => Ok(OrderState::Planned),
            "ACTIVE" => Ok(OrderState::Active),
            "CONSUMED" => Ok(OrderState::Consumed),
            "PAUSED" => Ok(OrderState::Paused),
            "CANCELLED" => Ok(OrderState::Cancelled),
            _ => Err(ParseEnumError {
                kind: "订单状态",
                value: s.to_string(),
            }),
        }
    }
}

// ==========================================
// 批次状态 (Batch State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    Pending,    // 在工位等待
    InProgress, // 工位加工中
    Completed,  // 已完工(包装完成)
    Cancelled,  // 已取消
}

impl BatchState {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchState::Pending => "PENDING",
            BatchState::InProgress => "IN_PROGRESS",
            BatchState::Completed => "COMPLETED",
            BatchState::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Cancelled)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for BatchState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(BatchState::Pending),
            "IN_PROGRESS" => Ok(BatchState::InProgress),
            "COMPLETED" => Ok(BatchState::Completed),
            "CANCELLED" => Ok(BatchState::Cancelled),
            _ => Err(ParseEnumError {
                kind: "批次状态",
                value: s.to_string(),
            }),
        }
    }
}

// ==========================================
// 损耗原因 (Waste Reason)
// ==========================================
// 枚举集合固定,未知代码必须拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteReason {
    Defective,     // 次品
    Contamination, // 污染
    ProcessError,  // 工艺失误
    Expired,       // 过期
    Accident,      // 意外
    Other,         // 其他
}

impl WasteReason {
    pub const ALL: [WasteReason; 6] = [
        WasteReason::Defective,
        WasteReason::Contamination,
        WasteReason::ProcessError,
        WasteReason::Expired,
        WasteReason::Accident,
        WasteReason::Other,
    ];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            WasteReason::Defective => "DEFECTIVE",
            WasteReason::Contamination => "CONTAMINATION",
            WasteReason::ProcessError => "PROCESS_ERROR",
            WasteReason::Expired => "EXPIRED",
            WasteReason::Accident => "ACCIDENT",
            WasteReason::Other => "OTHER",
        }
    }
}

impl fmt::Display for WasteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for WasteReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEFECTIVE" => Ok(WasteReason::Defective),
            "CONTAMINATION" => Ok(WasteReason::Contamination),
            "PROCESS_ERROR" => Ok(WasteReason::ProcessError),
            "EXPIRED" => Ok(WasteReason::Expired),
            "ACCIDENT" => Ok(WasteReason::Accident),
            "OTHER" => Ok(WasteReason::Other),
            _ => Err(ParseEnumError {
                kind: "损耗原因",
                value: s.to_string(),
            }),
        }
    }
}

// ==========================================
// 计量单位 (Unit of Measure)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOfMeasure {
    Unit,     // 件
    Kilogram, // 千克
    Gram,     // 克
}

impl UnitOfMeasure {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            UnitOfMeasure::Unit => "UNIT",
            UnitOfMeasure::Kilogram => "KG",
            UnitOfMeasure::Gram => "G",
        }
    }

    /// 从字符串解析单位(未知值按件处理)
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "KG" | "KILOGRAM" => UnitOfMeasure::Kilogram,
            "G" | "GR" | "GRAM" => UnitOfMeasure::Gram,
            _ => UnitOfMeasure::Unit,
        }
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
