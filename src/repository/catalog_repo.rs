// ==========================================
// 冷冻食品生产批次流程系统 - 产品目录仓储
// ==========================================
// 表: product / bom_entry
// 红线: Repository 不含业务逻辑 (单件重量由 UnitWeight::from_bom 计算)
// ==========================================

use crate::domain::catalog::{BomEntry, Product, UnitWeight};
use crate::domain::types::UnitOfMeasure;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 产品
    // ==========================================

    /// 插入或更新产品 (按 sku)
    pub fn upsert_product(&self, product: &Product) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        upsert_product_with(&conn, product)
    }

    /// 按 sku 查询产品
    pub fn find_product(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT sku, name, unit_of_measure, is_raw_material FROM product WHERE sku = ?",
            params![sku],
            map_product,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出产品 (按 sku 排序)
    pub fn list_products(&self, raw_material_only: Option<bool>) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sku, name, unit_of_measure, is_raw_material
            FROM product
            WHERE (?1 IS NULL OR is_raw_material = ?1)
            ORDER BY sku
            "#,
        )?;
        let products = stmt
            .query_map(params![raw_material_only], map_product)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    // ==========================================
    // BOM
    // ==========================================

    /// 查询成品的 BOM 行
    pub fn find_bom(&self, finished_sku: &str) -> RepositoryResult<Vec<BomEntry>> {
        let conn = self.get_conn()?;
        find_bom_with(&conn, finished_sku)
    }

    /// 整体替换成品的 BOM (事务)
    pub fn replace_bom(&self, finished_sku: &str, entries: &[BomEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM bom_entry WHERE finished_sku = ?", params![finished_sku])?;
        for entry in entries {
            if entry.finished_sku != finished_sku {
                return Err(RepositoryError::ValidationError(format!(
                    "BOM 行成品不一致: expected={}, got={}",
                    finished_sku, entry.finished_sku
                )));
            }
            upsert_bom_entry_with(&tx, entry)?;
        }

        tx.commit()?;
        Ok(entries.len())
    }

    /// 插入或更新单条 BOM 行
    pub fn upsert_bom_entry(&self, entry: &BomEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        upsert_bom_entry_with(&conn, entry)
    }

    /// 批量导入产品与 BOM (单事务, 任一失败整体回滚)
    pub fn import_catalog(&self, products: &[Product], entries: &[BomEntry]) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for product in products {
            upsert_product_with(&tx, product)?;
        }
        for entry in entries {
            upsert_bom_entry_with(&tx, entry)?;
        }

        tx.commit()?;
        Ok((products.len(), entries.len()))
    }

    /// 单件重量 (BOM 汇总, 空 BOM 回退默认值)
    pub fn unit_weight(&self, finished_sku: &str) -> RepositoryResult<UnitWeight> {
        let entries = self.find_bom(finished_sku)?;
        Ok(UnitWeight::from_bom(&entries))
    }
}

pub(crate) fn find_bom_with(conn: &Connection, finished_sku: &str) -> RepositoryResult<Vec<BomEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT finished_sku, material_sku, quantity_per_unit
        FROM bom_entry
        WHERE finished_sku = ?
        ORDER BY material_sku
        "#,
    )?;
    let entries = stmt
        .query_map(params![finished_sku], |row| {
            Ok(BomEntry {
                finished_sku: row.get(0)?,
                material_sku: row.get(1)?,
                quantity_per_unit: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn upsert_product_with(conn: &Connection, product: &Product) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO product (sku, name, unit_of_measure, is_raw_material)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(sku) DO UPDATE SET
            name = excluded.name,
            unit_of_measure = excluded.unit_of_measure,
            is_raw_material = excluded.is_raw_material,
            updated_at = datetime('now')
        "#,
        params![
            product.sku,
            product.name,
            product.unit_of_measure.to_db_str(),
            product.is_raw_material,
        ],
    )?;
    Ok(())
}

fn upsert_bom_entry_with(conn: &Connection, entry: &BomEntry) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO bom_entry (finished_sku, material_sku, quantity_per_unit)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(finished_sku, material_sku) DO UPDATE SET
            quantity_per_unit = excluded.quantity_per_unit
        "#,
        params![entry.finished_sku, entry.material_sku, entry.quantity_per_unit],
    )?;
    Ok(())
}

fn map_product(row: &Row) -> rusqlite::Result<Product> {
    let uom: String = row.get(2)?;
    Ok(Product {
        sku: row.get(0)?,
        name: row.get(1)?,
        unit_of_measure: UnitOfMeasure::from_db_str(&uom),
        is_raw_material: row.get(3)?,
    })
}
