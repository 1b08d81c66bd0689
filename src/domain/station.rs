// ==========================================
// 冷冻食品生产批次流程系统 - 工位领域模型
// ==========================================
// 工位为固定的线性链路,不存在环
// PELADO_TROZADO 是 PELADO 的别名,不是独立节点
// ==========================================

use crate::domain::types::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Station - 工位
// ==========================================
// 声明顺序即流转顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    Lavado,        // 清洗
    Clasificacion, // 分拣
    Pelado,        // 去皮/切块
    Escurrido,     // 沥水
    Congelacion,   // 速冻
    Empaquetado,   // 包装(末道工位)
}

impl Station {
    /// 全部工位(按流转顺序)
    pub const ALL: [Station; 6] = [
        Station::Lavado,
        Station::Clasificacion,
        Station::Pelado,
        Station::Escurrido,
        Station::Congelacion,
        Station::Empaquetado,
    ];

    /// 转换为数据库存储的字符串(别名统一落为 PELADO)
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Station::Lavado => "LAVADO",
            Station::Clasificacion => "CLASIFICACION",
            Station::Pelado => "PELADO",
            Station::Escurrido => "ESCURRIDO",
            Station::Congelacion => "CONGELACION",
            Station::Empaquetado => "EMPAQUETADO",
        }
    }

    /// 链路中的位置(从 0 开始)
    pub fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for Station {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "LAVADO" => Ok(Station::Lavado),
            "CLASIFICACION" => Ok(Station::Clasificacion),
            "PELADO" | "PELADO_TROZADO" => Ok(Station::Pelado),
            "ESCURRIDO" => Ok(Station::Escurrido),
            "CONGELACION" => Ok(Station::Congelacion),
            "EMPAQUETADO" => Ok(Station::Empaquetado),
            _ => Err(ParseEnumError {
                kind: "工位",
                value: s.to_string(),
            }),
        }
    }
}

// ==========================================
// StationInfo - 工位展示信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationInfo {
    pub station: Station,
    pub code: &'static str,           // 工位代码
    pub display_name: &'static str,   // 现场显示名称
    pub description: &'static str,    // 工位说明
    pub successor: Option<Station>,   // 下一工位 (None = 末道)
}
