// ==========================================
// 冷冻食品生产批次流程系统 - 工位目录
// ==========================================
// 链路: LAVADO → CLASIFICACION → PELADO → ESCURRIDO
//       → CONGELACION → EMPAQUETADO → (末道)
// 无状态,无副作用
// ==========================================

use crate::domain::station::{Station, StationInfo};
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// StationCatalog - 工位目录
// ==========================================
pub struct StationCatalog;

impl StationCatalog {
    /// 第一道工位 (新批次的初始位置)
    pub fn first() -> Station {
        Station::Lavado
    }

    /// 末道工位
    pub fn last() -> Station {
        Station::Empaquetado
    }

    /// 查询下一工位
    ///
    /// # 返回
    /// - Some(Station): 下一工位
    /// - None: 已是末道工位 (EMPAQUETADO)
    pub fn successor_of(station: Station) -> Option<Station> {
        match station {
            Station::Lavado => Some(Station::Clasificacion),
            Station::Clasificacion => Some(Station::Pelado),
            Station::Pelado => Some(Station::Escurrido),
            Station::Escurrido => Some(Station::Congelacion),
            Station::Congelacion => Some(Station::Empaquetado),
            Station::Empaquetado => None,
        }
    }

    /// 解析工位代码 (PELADO_TROZADO 归一为 PELADO)
    pub fn parse(code: &str) -> EngineResult<Station> {
        code.parse::<Station>()
            .map_err(|_| EngineError::UnknownStation(code.to_string()))
    }

    /// 按代码查询下一工位
    pub fn successor_of_code(code: &str) -> EngineResult<Option<Station>> {
        Ok(Self::successor_of(Self::parse(code)?))
    }

    /// 全部工位 (按流转顺序)
    pub fn chain() -> impl Iterator<Item = Station> {
        std::iter::successors(Some(Self::first()), |s| Self::successor_of(*s))
    }

    /// 工位展示信息
    pub fn info(station: Station) -> StationInfo {
        let (display_name, description) = match station {
            Station::Lavado => ("Lavado", "Lavado y desinfección de materia prima"),
            Station::Clasificacion => ("Clasificación", "Selección y descarte por calibre"),
            Station::Pelado => ("Pelado / Trozado", "Pelado y corte en trozos"),
            Station::Escurrido => ("Escurrido", "Escurrido antes de congelar"),
            Station::Congelacion => ("Congelación", "Congelación rápida IQF"),
            Station::Empaquetado => ("Empaquetado", "Embolsado y etiquetado final"),
        };
        StationInfo {
            station,
            code: station.to_db_str(),
            display_name,
            description,
            successor: Self::successor_of(station),
        }
    }

    /// 全部工位展示信息
    pub fn all_info() -> Vec<StationInfo> {
        Self::chain().map(Self::info).collect()
    }
}
