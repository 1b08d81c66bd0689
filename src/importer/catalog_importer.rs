// ==========================================
// 冷冻食品生产批次流程系统 - 产品/BOM 导入器
// ==========================================
// 输入: 每行一条 BOM 明细
//   finished_sku, finished_name, material_sku, material_name, grams_per_unit
// 输出: 成品/原料产品 + BOM 行, 单事务写入
// 红线: 任一行校验失败则整体不落库
// ==========================================

use crate::domain::catalog::{BomEntry, Product};
use crate::domain::types::UnitOfMeasure;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use crate::repository::catalog_repo::CatalogRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// 导入结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogImportSummary {
    pub rows_read: usize,
    pub products_upserted: usize,
    pub bom_entries_upserted: usize,
    pub elapsed_ms: i64,
}

/// 解析后的目录数据
#[derive(Debug, Clone, Default)]
pub struct ParsedCatalog {
    pub products: Vec<Product>,
    pub bom_entries: Vec<BomEntry>,
}

pub struct CatalogImporter {
    catalog_repo: Arc<CatalogRepository>,
}

impl CatalogImporter {
    pub fn new(catalog_repo: Arc<CatalogRepository>) -> Self {
        Self { catalog_repo }
    }

    /// 从文件导入 (CSV / Excel)
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<CatalogImportSummary> {
        let start = std::time::Instant::now();
        let path = file_path.as_ref();
        tracing::info!(file = %path.display(), "开始导入产品/BOM");

        let records = UniversalFileParser.parse(path)?;
        let parsed = parse_records(&records)?;
        let (products, bom_entries) = self
            .catalog_repo
            .import_catalog(&parsed.products, &parsed.bom_entries)?;

        let summary = CatalogImportSummary {
            rows_read: records.len(),
            products_upserted: products,
            bom_entries_upserted: bom_entries,
            elapsed_ms: start.elapsed().as_millis() as i64,
        };
        tracing::info!(
            rows = summary.rows_read,
            products = summary.products_upserted,
            bom_entries = summary.bom_entries_upserted,
            elapsed_ms = summary.elapsed_ms,
            "产品/BOM 导入完成"
        );
        Ok(summary)
    }
}

// ==========================================
// 行解析
// ==========================================

/// 列名别名 (表头已转小写)
fn aliases(field: &str) -> &'static [&'static str] {
    match field {
        "finished_sku" => &["finished_sku", "sku_producto", "producto", "成品sku"],
        "finished_name" => &["finished_name", "nombre_producto", "成品名称"],
        "material_sku" => &["material_sku", "sku_materia_prima", "materia_prima", "原料sku"],
        "material_name" => &["material_name", "nombre_materia_prima", "原料名称"],
        "grams_per_unit" => &["grams_per_unit", "gramos_por_unidad", "cantidad", "单件用量(g)"],
        _ => &[],
    }
}

fn get_field<'a>(row: &'a RawRecord, field: &str) -> Option<&'a str> {
    aliases(field)
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn required<'a>(row: &'a RawRecord, field: &str, row_number: usize) -> ImportResult<&'a str> {
    get_field(row, field).ok_or_else(|| ImportError::MissingField {
        row: row_number,
        field: field.to_string(),
    })
}

/// 把原始行转换为产品与 BOM
///
/// 行号从 2 开始 (第 1 行为表头)
pub fn parse_records(records: &[RawRecord]) -> ImportResult<ParsedCatalog> {
    let mut products: BTreeMap<String, Product> = BTreeMap::new();
    let mut bom: BTreeMap<(String, String), BomEntry> = BTreeMap::new();

    for (idx, row) in records.iter().enumerate() {
        let row_number = idx + 2;

        let finished_sku = required(row, "finished_sku", row_number)?.to_uppercase();
        let material_sku = required(row, "material_sku", row_number)?.to_uppercase();
        let grams_raw = required(row, "grams_per_unit", row_number)?;
        let grams: f64 = grams_raw
            .replace(',', ".")
            .parse()
            .map_err(|e: std::num::ParseFloatError| ImportError::TypeConversionError {
                row: row_number,
                field: "grams_per_unit".to_string(),
                message: format!("{} ({})", e, grams_raw),
            })?;
        if !grams.is_finite() || grams < 0.0 {
            return Err(ImportError::NegativeValue {
                row: row_number,
                field: "grams_per_unit".to_string(),
                value: grams,
            });
        }

        register_product(
            &mut products,
            &finished_sku,
            get_field(row, "finished_name"),
            false,
            row_number,
        )?;
        register_product(
            &mut products,
            &material_sku,
            get_field(row, "material_name"),
            true,
            row_number,
        )?;

        // 同一成品/原料重复出现时以最后一行为准
        bom.insert(
            (finished_sku.clone(), material_sku.clone()),
            BomEntry {
                finished_sku,
                material_sku,
                quantity_per_unit: grams,
            },
        );
    }

    Ok(ParsedCatalog {
        products: products.into_values().collect(),
        bom_entries: bom.into_values().collect(),
    })
}

fn register_product(
    products: &mut BTreeMap<String, Product>,
    sku: &str,
    name: Option<&str>,
    is_raw_material: bool,
    row_number: usize,
) -> ImportResult<()> {
    if let Some(existing) = products.get_mut(sku) {
        if existing.is_raw_material != is_raw_material {
            return Err(ImportError::SkuRoleConflict {
                row: row_number,
                sku: sku.to_string(),
            });
        }
        if let Some(name) = name {
            existing.name = name.to_string();
        }
        return Ok(());
    }

    products.insert(
        sku.to_string(),
        Product {
            sku: sku.to_string(),
            name: name.unwrap_or(sku).to_string(),
            unit_of_measure: if is_raw_material {
                UnitOfMeasure::Gram
            } else {
                UnitOfMeasure::Unit
            },
            is_raw_material,
        },
    );
    Ok(())
}
