// ==========================================
// 冷冻食品生产批次流程系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供应用层/外部界面调用
// ==========================================

pub mod catalog_api;
pub mod config_api;
pub mod error;
pub mod production_api;
pub mod waste_api;
pub mod workstation_api;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use config_api::{ConfigApi, ConfigUpdateResult};
pub use error::{ApiError, ApiResult};
pub use production_api::{
    ActivationResult, BatchPlanPreview, CancellationResult, OrderDetail, ProductionApi,
};
pub use waste_api::{WasteApi, WasteRecordResult};
pub use workstation_api::{BatchCompletion, WorkstationApi};
