// ==========================================
// 冷冻食品生产批次流程系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 当前仅 global)
// 红线: 生产参数两个键必须在同一事务内写入, 不允许半更新
// ==========================================

use crate::config::production_config::{
    BatchPolicy, ProductionConfig, DEFAULT_BASE_ORDER_QUANTITY, DEFAULT_FIXED_BATCH_COUNT,
    DEFAULT_MAX_BATCH_COUNT, DEFAULT_MIN_BATCH_WEIGHT_KG,
};
use crate::config::production_config_reader::ProductionConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入单个 global 配置
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        upsert_value(&conn, key, value)
    }

    /// 读取多个键 (单条语句), 返回 key → value
    fn get_values(&self, keys: &[&str]) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT key, value FROM config_kv WHERE scope_id = '{}' AND key IN ({})",
            GLOBAL_SCOPE, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(keys.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(rows)
    }

    /// 原子写入生产参数 (两个键同一事务)
    ///
    /// 说明: 参数校验由调用方 (ConfigApi) 通过 production_config::validate 完成
    pub fn set_production_config(&self, config: &ProductionConfig) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        upsert_value(&tx, config_keys::BASE_ORDER_QUANTITY, &config.base_order_quantity.to_string())?;
        upsert_value(&tx, config_keys::FIXED_BATCH_COUNT, &config.fixed_batch_count.to_string())?;
        tx.commit()?;

        tracing::info!(
            base_order_quantity = config.base_order_quantity,
            fixed_batch_count = config.fixed_batch_count,
            "生产参数已更新"
        );
        Ok(())
    }

    /// 原子写入批次提示阈值
    pub fn set_batch_policy(&self, policy: &BatchPolicy) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        upsert_value(&tx, config_keys::MAX_BATCH_COUNT, &policy.max_batch_count.to_string())?;
        upsert_value(&tx, config_keys::MIN_BATCH_WEIGHT_KG, &policy.min_batch_weight_kg.to_string())?;
        tx.commit()?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 记录到操作日志 payload, 便于追溯激活时使用的参数
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let config_map = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<String, String>, _>>()?;

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 同步读取生产参数 (供启动打印与同步 API 使用)
    pub fn load_production_config(&self) -> RepositoryResult<ProductionConfig> {
        let values = self.get_values(&[config_keys::BASE_ORDER_QUANTITY, config_keys::FIXED_BATCH_COUNT])?;
        Ok(ProductionConfig {
            base_order_quantity: parse_or_default(
                &values,
                config_keys::BASE_ORDER_QUANTITY,
                DEFAULT_BASE_ORDER_QUANTITY,
            ),
            fixed_batch_count: parse_or_default(&values, config_keys::FIXED_BATCH_COUNT, DEFAULT_FIXED_BATCH_COUNT),
        })
    }

    /// 同步读取批次提示阈值
    pub fn load_batch_policy(&self) -> RepositoryResult<BatchPolicy> {
        let values = self.get_values(&[config_keys::MAX_BATCH_COUNT, config_keys::MIN_BATCH_WEIGHT_KG])?;
        Ok(BatchPolicy {
            max_batch_count: parse_or_default(&values, config_keys::MAX_BATCH_COUNT, DEFAULT_MAX_BATCH_COUNT),
            min_batch_weight_kg: parse_or_default(
                &values,
                config_keys::MIN_BATCH_WEIGHT_KG,
                DEFAULT_MIN_BATCH_WEIGHT_KG,
            ),
        })
    }
}

fn upsert_value(conn: &Connection, key: &str, value: &str) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
        ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
        "#,
        params![GLOBAL_SCOPE, key, value],
    )?;
    Ok(())
}

/// 缺失时静默使用默认值; 格式错误时告警后使用默认值
fn parse_or_default<T>(values: &BTreeMap<String, String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match values.get(key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = key,
                raw_value = %raw,
                default = %default,
                "配置格式错误，使用默认值"
            );
            default
        }),
    }
}

// ==========================================
// ProductionConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ProductionConfigReader for ConfigManager {
    async fn get_base_order_quantity(&self) -> RepositoryResult<i64> {
        Ok(self.load_production_config()?.base_order_quantity)
    }

    async fn get_fixed_batch_count(&self) -> RepositoryResult<i64> {
        Ok(self.load_production_config()?.fixed_batch_count)
    }

    async fn get_batch_policy(&self) -> RepositoryResult<BatchPolicy> {
        self.load_batch_policy()
    }

    async fn get_production_config(&self) -> RepositoryResult<ProductionConfig> {
        self.load_production_config()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 生产参数
    pub const BASE_ORDER_QUANTITY: &str = "base_order_quantity";
    pub const FIXED_BATCH_COUNT: &str = "fixed_batch_count";

    // 批次提示阈值
    pub const MAX_BATCH_COUNT: &str = "max_batch_count";
    pub const MIN_BATCH_WEIGHT_KG: &str = "min_batch_weight_kg";
}
