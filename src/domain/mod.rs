// ==========================================
// 冷冻食品生产批次流程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod batch;
pub mod catalog;
pub mod order;
pub mod station;
pub mod types;
pub mod waste;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use batch::{Batch, BatchProgress};
pub use catalog::{
    explode_bom, BomEntry, MaterialRequirement, Product, UnitWeight, UnitWeightSource,
    DEFAULT_UNIT_WEIGHT_GRAMS,
};
pub use order::{OrderFilter, ProductionOrder};
pub use station::{Station, StationInfo};
pub use types::{BatchState, OrderState, ParseEnumError, UnitOfMeasure, WasteReason};
pub use waste::{ReasonCount, ReservationExcess, WasteEntry, WasteSummary};
