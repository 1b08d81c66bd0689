// ==========================================
// 冷冻食品生产批次流程系统 - 核心库
// ==========================================
// 流程: 订单 → 批次拆分 → 工位流转 → 损耗记录
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 生产参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 依赖组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchState, OrderState, UnitOfMeasure, WasteReason};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Batch, BomEntry, Product, ProductionOrder, Station, WasteEntry,
};

// 引擎
pub use engine::{compute_batch_plan, BatchPlan, OrderLifecycleEngine, StationCatalog, WasteEngine};

// 配置
pub use config::{ConfigManager, ProductionConfig};

// API
pub use api::{CatalogApi, ConfigApi, ProductionApi, WasteApi, WorkstationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "冷冻食品生产批次流程系统";
