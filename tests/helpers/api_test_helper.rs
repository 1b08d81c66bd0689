// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#![allow(dead_code)]

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use frozen_production::api::{CatalogApi, ConfigApi, ProductionApi, WasteApi, WorkstationApi};
use frozen_production::config::{ConfigManager, ProductionConfigReader};
use frozen_production::domain::batch::Batch;
use frozen_production::domain::order::ProductionOrder;
use frozen_production::repository::{
    ActionLogRepository, BatchRepository, CatalogRepository, OrderTransactionGateway,
    OrderTransactionRepository, ProductionOrderRepository, ReservationRepository, WasteRepository,
};

pub use test_helpers::{bom_entry, count_rows, finished_product, raw_material, read_stock};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,

    pub production_api: Arc<ProductionApi>,
    pub workstation_api: Arc<WorkstationApi>,
    pub waste_api: Arc<WasteApi>,
    pub config_api: Arc<ConfigApi>,
    pub catalog_api: Arc<CatalogApi>,

    // Repository层（用于测试数据准备）
    pub order_repo: Arc<ProductionOrderRepository>,
    pub batch_repo: Arc<BatchRepository>,
    pub catalog_repo: Arc<CatalogRepository>,
    pub reservation_repo: Arc<ReservationRepository>,
    pub waste_repo: Arc<WasteRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub config_manager: Arc<ConfigManager>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的测试环境（真实事务网关）
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_gateway(|inner| inner)
    }

    /// 创建测试环境并包装事务网关（用于模拟超时等存储异常）
    pub fn with_gateway<F>(wrap: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: FnOnce(Arc<dyn OrderTransactionGateway>) -> Arc<dyn OrderTransactionGateway>,
    {
        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let conn = Arc::new(Mutex::new(test_helpers::open_test_connection(&db_path)?));

        let order_repo = Arc::new(ProductionOrderRepository::new(conn.clone()));
        let batch_repo = Arc::new(BatchRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let reservation_repo = Arc::new(ReservationRepository::new(conn.clone()));
        let waste_repo = Arc::new(WasteRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);

        let real_gateway: Arc<dyn OrderTransactionGateway> =
            Arc::new(OrderTransactionRepository::new(conn.clone()));
        let gateway = wrap(real_gateway);
        let config_reader: Arc<dyn ProductionConfigReader> = config_manager.clone();

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
            order_repo.clone(),
            batch_repo.clone(),
            action_log_repo.clone(),
        ));
        let waste_api = Arc::new(WasteApi::new(
            waste_repo.clone(),
            batch_repo.clone(),
            reservation_repo.clone(),
            action_log_repo.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone(), action_log_repo.clone()));
        let catalog_api = Arc::new(CatalogApi::new(
            catalog_repo.clone(),
            reservation_repo.clone(),
            action_log_repo.clone(),
        ));

        Ok(Self {
            db_path,
            conn,
            production_api,
            workstation_api,
            waste_api,
            config_api,
            catalog_api,
            order_repo,
            batch_repo,
            catalog_repo,
            reservation_repo,
            waste_repo,
            action_log_repo,
            config_manager,
            _temp_file: temp_file,
        })
    }

    /// 写入成品、原料、BOM 与库存 (每种原料库存均为 stock_grams)
    pub fn seed_product(&self, finished_sku: &str, bom: &[(&str, f64)], stock_grams: f64) {
        self.catalog_repo
            .upsert_product(&finished_product(finished_sku))
            .expect("写入成品失败");
        for (material_sku, grams) in bom {
            self.catalog_repo
                .upsert_product(&raw_material(material_sku))
                .expect("写入原料失败");
            self.catalog_repo
                .upsert_bom_entry(&bom_entry(finished_sku, material_sku, *grams))
                .expect("写入BOM失败");
            self.reservation_repo
                .set_stock(material_sku, stock_grams)
                .expect("写入库存失败");
        }
    }

    /// 标准测试产品: 500 g/件 (480 g 西兰花 + 20 g 包装袋), 库存充足
    pub fn seed_standard_product(&self) -> &'static str {
        self.seed_product(
            "PT-BROCOLI-500",
            &[("MP-BROCOLI", 480.0), ("MP-BOLSA", 20.0)],
            1_000_000.0,
        );
        "PT-BROCOLI-500"
    }

    /// 创建并激活订单
    pub async fn create_active_order(&self, sku: &str, quantity: i64) -> (ProductionOrder, Vec<Batch>) {
        let order = self
            .production_api
            .create_order(sku, quantity, "supervisor", None)
            .expect("创建订单失败");
        let result = self
            .production_api
            .activate_order(&order.order_id, "supervisor")
            .await
            .expect("激活订单失败");
        (result.order, result.batches)
    }

    /// 把批次推进到全部工位完成
    pub fn run_batch_to_completion(&self, batch_id: &str) {
        for _ in 0..6 {
            self.workstation_api
                .start_batch(batch_id, "operario")
                .expect("开始加工失败");
            self.workstation_api
                .complete_batch(batch_id, "operario")
                .expect("完成工位失败");
        }
    }

    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    pub fn count_actions(&self, action_type: &str) -> i64 {
        self.with_conn(|conn| test_helpers::count_actions(conn, action_type))
    }
}
