// ==========================================
// 冷冻食品生产批次流程系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod batch_repo;
pub mod catalog_repo;
pub mod error;
pub mod order_repo;
pub mod order_tx_repo;
pub mod order_tx_repo_impl;
pub mod reservation_repo;
pub mod waste_repo;

mod row;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use batch_repo::{BatchCommitResult, BatchRepository};
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::ProductionOrderRepository;
pub use order_tx_repo::{
    ActivationCommit, CancellationCommit, CancellationOutcome, OrderTransactionGateway,
};
pub use order_tx_repo_impl::OrderTransactionRepository;
pub use reservation_repo::{MaterialReservation, MaterialStock, ReservationRepository};
pub use waste_repo::WasteRepository;
