// ==========================================
// 行映射辅助函数
// ==========================================
// 说明: 枚举/时间戳列解析失败统一转为 FromSqlConversionFailure,
//       以便在 query_map 闭包内直接使用 `?`
// ==========================================

use crate::db::parse_ts;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;

/// 读取并解析枚举列 (TEXT → T: FromStr)
pub(crate) fn enum_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 读取必填时间戳列
pub(crate) fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_ts(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {}", raw).into(),
        )
    })
}

/// 读取可空时间戳列
pub(crate) fn opt_ts_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_ts(&raw).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("invalid timestamp: {}", raw).into(),
            )
        }),
    }
}
