// ==========================================
// 冷冻食品生产批次流程系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表 (init_schema)，测试与正式环境共用一份 DDL
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表 (幂等)
///
/// 所有表使用 IF NOT EXISTS，可在每次启动时调用
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS product (
            sku TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            unit_of_measure TEXT NOT NULL DEFAULT 'UNIT',
            is_raw_material INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bom_entry (
            finished_sku TEXT NOT NULL REFERENCES product(sku) ON DELETE CASCADE,
            material_sku TEXT NOT NULL,
            quantity_per_unit REAL NOT NULL CHECK (quantity_per_unit >= 0),
            PRIMARY KEY (finished_sku, material_sku)
        );

        CREATE TABLE IF NOT EXISTS material_stock (
            material_sku TEXT PRIMARY KEY,
            available_grams REAL NOT NULL CHECK (available_grams >= 0),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS production_order (
            order_id TEXT PRIMARY KEY,
            sku TEXT NOT NULL REFERENCES product(sku),
            quantity_units INTEGER NOT NULL CHECK (quantity_units > 0),
            state TEXT NOT NULL,
            responsible TEXT NOT NULL,
            notes TEXT,
            batch_count INTEGER,
            unit_weight_grams REAL,
            total_weight_kg REAL,
            activated_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_batch (
            batch_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES production_order(order_id),
            sequence_no INTEGER NOT NULL,
            units_in_batch REAL NOT NULL,
            weight_kg REAL NOT NULL,
            current_station TEXT NOT NULL,
            state TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT,
            UNIQUE (order_id, sequence_no)
        );

        CREATE INDEX IF NOT EXISTS idx_batch_station_state
            ON production_batch (current_station, state);

        CREATE TABLE IF NOT EXISTS material_reservation (
            order_id TEXT NOT NULL REFERENCES production_order(order_id),
            material_sku TEXT NOT NULL,
            reserved_grams REAL NOT NULL,
            released INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            released_at TEXT,
            PRIMARY KEY (order_id, material_sku)
        );

        CREATE TABLE IF NOT EXISTS waste_entry (
            waste_id TEXT PRIMARY KEY,
            batch_id TEXT NOT NULL REFERENCES production_batch(batch_id),
            order_id TEXT NOT NULL,
            station TEXT NOT NULL,
            material_sku TEXT NOT NULL,
            grams_wasted REAL NOT NULL CHECK (grams_wasted >= 0),
            reason_code TEXT NOT NULL,
            recorded_by TEXT NOT NULL,
            notes TEXT,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_waste_batch ON waste_entry (batch_id);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            order_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_order ON action_log (order_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 解析存储的时间戳
pub fn parse_ts(raw: &str) -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(raw, TS_FORMAT).ok()
}

/// 格式化时间戳
pub fn format_ts(ts: &chrono::NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}
