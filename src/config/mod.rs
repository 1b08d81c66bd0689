// ==========================================
// 冷冻食品生产批次流程系统 - 配置层
// ==========================================
// 职责: 生产参数定义、校验与持久化
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod production_config;
pub mod production_config_reader;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use production_config::{validate, BatchPolicy, ConfigValidation, ProductionConfig};
pub use production_config_reader::ProductionConfigReader;
