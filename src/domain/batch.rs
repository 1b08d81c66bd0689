// ==========================================
// 冷冻食品生产批次流程系统 - 批次(Lote)领域模型
// ==========================================
// 红线: 批次创建后不拆分、不合并
// 红线: 批次只在订单激活时创建
// ==========================================

use crate::domain::station::Station;
use crate::domain::types::BatchState;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Batch - 生产批次
// ==========================================
// 对齐: production_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub order_id: String,
    pub sequence_no: i64,         // 订单内序号 (1..=N)
    pub units_in_batch: f64,      // 批次件数 (可为小数)
    pub weight_kg: f64,           // 批次重量 (kg, 精确到克)
    pub current_station: Station, // 当前工位
    pub state: BatchState,        // 批次状态
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Batch {
    /// 是否仍在产线上(未完工、未取消)
    pub fn is_open(&self) -> bool {
        !self.state.is_terminal()
    }
}

// ==========================================
// BatchProgress - 订单批次进度汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl BatchProgress {
    pub fn from_batches(batches: &[Batch]) -> Self {
        let mut progress = BatchProgress {
            total: batches.len(),
            ..Default::default()
        };
        for batch in batches {
            match batch.state {
                BatchState::Pending => progress.pending += 1,
                BatchState::InProgress => progress.in_progress += 1,
                BatchState::Completed => progress.completed += 1,
                BatchState::Cancelled => progress.cancelled += 1,
            }
        }
        progress
    }

    /// 全部批次完工 (空集合不算完工)
    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    /// 仍在产线上的批次数 (PENDING + IN_PROGRESS)
    pub fn open(&self) -> usize {
        self.pending + self.in_progress
    }

    /// 取消订单时应释放的原料预留比例
    ///
    /// 未完工批次数 / 总批次数; 尚无批次时全额释放
    pub fn release_fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.open() as f64 / self.total as f64
        }
    }
}
