// ==========================================
// 冷冻食品生产批次流程系统 - 引擎层
// ==========================================
// 职责: 实现业务规则,不拼 SQL
// 红线: Engine 不拼 SQL, 不落库
// ==========================================

pub mod batch_sizing;
pub mod error;
pub mod order_lifecycle;
pub mod station_catalog;
pub mod waste;

// 重导出核心引擎
pub use batch_sizing::{build_batches, compute_batch_plan, evaluate_advisories, BatchAdvisory, BatchPlan};
pub use error::{EngineError, EngineResult};
pub use order_lifecycle::{ActivationDraft, BatchAdvance, CancellationPlan, OrderLifecycleEngine};
pub use station_catalog::StationCatalog;
pub use waste::{WasteEngine, WasteInput};
