// ==========================================
// 冷冻食品生产批次流程系统 - 产品目录与物料清单(BOM)
// ==========================================
// 单件重量 = 该成品全部 BOM 行 quantity_per_unit 之和 (克)
// BOM 为空时使用默认 500 克,且必须标记为回退值
// ==========================================

use crate::domain::types::UnitOfMeasure;
use serde::{Deserialize, Serialize};

/// BOM 为空时的默认单件重量 (克)
pub const DEFAULT_UNIT_WEIGHT_GRAMS: f64 = 500.0;

// ==========================================
// Product - 目录产品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub unit_of_measure: UnitOfMeasure,
    pub is_raw_material: bool, // 原料(可被预留/损耗)还是成品
}

// ==========================================
// BomEntry - 物料清单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    pub finished_sku: String,
    pub material_sku: String,
    pub quantity_per_unit: f64, // 每件成品耗用原料 (克)
}

// ==========================================
// UnitWeight - 单件重量(带来源)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitWeightSource {
    Bom,     // 由 BOM 汇总
    Default, // BOM 为空,使用默认值
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitWeight {
    pub grams: f64,
    pub source: UnitWeightSource,
}

impl UnitWeight {
    /// 从 BOM 行计算单件重量
    pub fn from_bom(entries: &[BomEntry]) -> Self {
        if entries.is_empty() {
            return Self {
                grams: DEFAULT_UNIT_WEIGHT_GRAMS,
                source: UnitWeightSource::Default,
            };
        }
        Self {
            grams: entries.iter().map(|e| e.quantity_per_unit).sum(),
            source: UnitWeightSource::Bom,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == UnitWeightSource::Default
    }
}

// ==========================================
// MaterialRequirement - 原料需求 (激活时预留)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_sku: String,
    pub required_grams: f64,
}

/// 按订单数量展开 BOM,得到每种原料的需求克数
///
/// 同一原料出现多行时合并,输出按原料 SKU 排序
pub fn explode_bom(entries: &[BomEntry], quantity_units: i64) -> Vec<MaterialRequirement> {
    let mut merged: std::collections::BTreeMap<&str, f64> = std::collections::BTreeMap::new();
    for entry in entries {
        *merged.entry(entry.material_sku.as_str()).or_insert(0.0) +=
            entry.quantity_per_unit * quantity_units as f64;
    }
    merged
        .into_iter()
        .map(|(material_sku, required_grams)| MaterialRequirement {
            material_sku: material_sku.to_string(),
            required_grams,
        })
        .collect()
}
