// ==========================================
// 冷冻食品生产批次流程系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有 Repository 共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, ConfigApi, ProductionApi, WasteApi, WorkstationApi};
use crate::config::{ConfigManager, ProductionConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    ActionLogRepository, BatchRepository, CatalogRepository, OrderTransactionGateway,
    OrderTransactionRepository, ProductionOrderRepository, RepositoryError, RepositoryResult,
    ReservationRepository, WasteRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生产订单API
    pub production_api: Arc<ProductionApi>,

    /// 工位API
    pub workstation_api: Arc<WorkstationApi>,

    /// 损耗记录API
    pub waste_api: Arc<WasteApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 产品目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let order_repo = Arc::new(ProductionOrderRepository::new(conn.clone()));
        let batch_repo = Arc::new(BatchRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let reservation_repo = Arc::new(ReservationRepository::new(conn.clone()));
        let waste_repo = Arc::new(WasteRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let gateway: Arc<dyn OrderTransactionGateway> =
            Arc::new(OrderTransactionRepository::new(conn.clone()));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let config_reader: Arc<dyn ProductionConfigReader> = config_manager.clone();

        // ==========================================
        // 初始化API层
        // ==========================================
        let production_api = Arc::new(ProductionApi::new(
            order_repo.clone(),
            batch_repo.clone(),
            catalog_repo.clone(),
            reservation_repo.clone(),
            action_log_repo.clone(),
            gateway,
            config_reader,
        ));
        let workstation_api = Arc::new(WorkstationApi::new(
            order_repo,
            batch_repo.clone(),
            action_log_repo.clone(),
        ));
        let waste_api = Arc::new(WasteApi::new(
            waste_repo,
            batch_repo,
            reservation_repo.clone(),
            action_log_repo.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager, action_log_repo.clone()));
        let catalog_api = Arc::new(CatalogApi::new(
            catalog_repo,
            reservation_repo,
            action_log_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            production_api,
            workstation_api,
            waste_api,
            config_api,
            catalog_api,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 FROZEN_PRODUCTION_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("FROZEN_PRODUCTION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./frozen_production.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("frozen-production-dev");
        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("frozen-production");

        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("frozen_production.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
