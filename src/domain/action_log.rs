// ==========================================
// 冷冻食品生产批次流程系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub order_id: Option<String>, // 关联订单 (配置更新等系统操作为None)
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,
    pub actor: String,

    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

impl ActionLog {
    /// 构造一条当前时间的操作日志
    pub fn now(
        order_id: Option<&str>,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.map(|s| s.to_string()),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail: Some(detail.into()),
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateOrder,
    ActivateOrder,
    PauseOrder,
    ResumeOrder,
    CancelOrder,
    StartBatch,
    CompleteBatch,
    RecordWaste,
    UpdateConfig,
    UpdateCatalog,
    ImportBom,
    SetStock,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateOrder => "CREATE_ORDER",
            ActionType::ActivateOrder => "ACTIVATE_ORDER",
            ActionType::PauseOrder => "PAUSE_ORDER",
            ActionType::ResumeOrder => "RESUME_ORDER",
            ActionType::CancelOrder => "CANCEL_ORDER",
            ActionType::StartBatch => "START_BATCH",
            ActionType::CompleteBatch => "COMPLETE_BATCH",
            ActionType::RecordWaste => "RECORD_WASTE",
            ActionType::UpdateConfig => "UPDATE_CONFIG",
            ActionType::UpdateCatalog => "UPDATE_CATALOG",
            ActionType::ImportBom => "IMPORT_BOM",
            ActionType::SetStock => "SET_STOCK",
        }
    }
}
