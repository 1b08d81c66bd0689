// ==========================================
// 冷冻食品生产批次流程系统 - 产品目录 API
// ==========================================
// 职责: 产品/BOM 维护、单件重量、原料库存、BOM 文件导入
// ==========================================

use std::path::Path;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::catalog::{BomEntry, Product, UnitWeight};
use crate::importer::{CatalogImportSummary, CatalogImporter};
use crate::repository::{ActionLogRepository, CatalogRepository, MaterialStock, ReservationRepository};

pub struct CatalogApi {
    catalog_repo: Arc<CatalogRepository>,
    reservation_repo: Arc<ReservationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    importer: CatalogImporter,
}

impl CatalogApi {
    pub fn new(
        catalog_repo: Arc<CatalogRepository>,
        reservation_repo: Arc<ReservationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            importer: CatalogImporter::new(catalog_repo.clone()),
            catalog_repo,
            reservation_repo,
            action_log_repo,
        }
    }

    // ==========================================
    // 产品
    // ==========================================

    pub fn upsert_product(&self, product: &Product, operator: &str) -> ApiResult<()> {
        if product.sku.trim().is_empty() {
            return Err(ApiError::InvalidInput("SKU不能为空".to_string()));
        }
        if product.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品名称不能为空".to_string()));
        }
        self.catalog_repo.upsert_product(product)?;
        self.record_action(ActionLog::now(
            None,
            ActionType::UpdateCatalog,
            operator,
            Some(serde_json::json!({ "product": product })),
            format!("更新产品 {}", product.sku),
        ));
        Ok(())
    }

    pub fn get_product(&self, sku: &str) -> ApiResult<Product> {
        self.catalog_repo
            .find_product(sku)?
            .ok_or_else(|| ApiError::NotFound(format!("Product(sku={})不存在", sku)))
    }

    /// 产品列表 (raw_material_only=None 返回全部)
    pub fn list_products(&self, raw_material_only: Option<bool>) -> ApiResult<Vec<Product>> {
        Ok(self.catalog_repo.list_products(raw_material_only)?)
    }

    // ==========================================
    // BOM
    // ==========================================

    pub fn get_bom(&self, finished_sku: &str) -> ApiResult<Vec<BomEntry>> {
        Ok(self.catalog_repo.find_bom(finished_sku)?)
    }

    /// 整体替换成品 BOM
    pub fn replace_bom(&self, finished_sku: &str, entries: &[BomEntry], operator: &str) -> ApiResult<usize> {
        if let Some(bad) = entries
            .iter()
            .find(|e| !e.quantity_per_unit.is_finite() || e.quantity_per_unit < 0.0)
        {
            return Err(ApiError::ValidationError(format!(
                "BOM 用量不能为负数: {} = {}",
                bad.material_sku, bad.quantity_per_unit
            )));
        }

        let count = self.catalog_repo.replace_bom(finished_sku, entries)?;
        self.record_action(ActionLog::now(
            None,
            ActionType::UpdateCatalog,
            operator,
            Some(serde_json::json!({ "finished_sku": finished_sku, "entries": entries })),
            format!("替换 {} 的 BOM ({}行)", finished_sku, count),
        ));
        Ok(count)
    }

    /// 单件重量 (克); 空 BOM 时返回默认值并标记来源
    pub fn get_unit_weight(&self, finished_sku: &str) -> ApiResult<UnitWeight> {
        let weight = self.catalog_repo.unit_weight(finished_sku)?;
        if weight.is_fallback() {
            tracing::warn!(sku = %finished_sku, grams = weight.grams, "BOM为空，使用默认单件重量");
        }
        Ok(weight)
    }

    /// 从 CSV / Excel 导入产品与 BOM
    pub fn import_catalog_file(&self, file_path: &str, operator: &str) -> ApiResult<CatalogImportSummary> {
        let path = Path::new(file_path);
        let summary = self
            .importer
            .import_file(path)
            .map_err(|e| ApiError::ImportError(e.to_string()))?;

        self.record_action(ActionLog::now(
            None,
            ActionType::ImportBom,
            operator,
            Some(serde_json::json!({ "file": file_path, "summary": summary })),
            format!(
                "导入产品{}个, BOM{}行",
                summary.products_upserted, summary.bom_entries_upserted
            ),
        ));
        Ok(summary)
    }

    // ==========================================
    // 库存
    // ==========================================

    pub fn set_stock(&self, material_sku: &str, available_grams: f64, operator: &str) -> ApiResult<()> {
        self.reservation_repo.set_stock(material_sku, available_grams)?;
        self.record_action(ActionLog::now(
            None,
            ActionType::SetStock,
            operator,
            Some(serde_json::json!({
                "material_sku": material_sku,
                "available_grams": available_grams,
            })),
            format!("设置库存 {} = {}g", material_sku, available_grams),
        ));
        Ok(())
    }

    pub fn get_stock(&self, material_sku: &str) -> ApiResult<f64> {
        Ok(self.reservation_repo.get_stock(material_sku)?)
    }

    pub fn list_stock(&self) -> ApiResult<Vec<MaterialStock>> {
        Ok(self.reservation_repo.list_stock()?)
    }

    fn record_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}
