// ==========================================
// 事务网关测试替身
// ==========================================
// 职责: 包装真实网关, 模拟"提交后超时"与"未提交即超时",
//       以及取消提交前插入一次并发写入
// ==========================================

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use frozen_production::domain::order::ProductionOrder;
use frozen_production::repository::{
    ActivationCommit, CancellationCommit, CancellationOutcome, OrderTransactionGateway,
    RepositoryError, RepositoryResult,
};

/// 超时模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutMode {
    /// 提交已落库, 但调用方收到超时
    AfterCommit,
    /// 未落库即超时
    BeforeCommit,
}

pub struct TimeoutGateway {
    inner: Arc<dyn OrderTransactionGateway>,
    mode: TimeoutMode,
}

impl TimeoutGateway {
    pub fn wrap(inner: Arc<dyn OrderTransactionGateway>, mode: TimeoutMode) -> Arc<dyn OrderTransactionGateway> {
        Arc::new(Self { inner, mode })
    }

    fn timeout() -> RepositoryError {
        RepositoryError::Timeout("database is locked".to_string())
    }
}

#[async_trait]
impl OrderTransactionGateway for TimeoutGateway {
    async fn commit_activation(&self, commit: &ActivationCommit) -> RepositoryResult<()> {
        if self.mode == TimeoutMode::AfterCommit {
            self.inner.commit_activation(commit).await?;
        }
        Err(Self::timeout())
    }

    async fn commit_cancellation(&self, commit: &CancellationCommit) -> RepositoryResult<CancellationOutcome> {
        if self.mode == TimeoutMode::AfterCommit {
            self.inner.commit_cancellation(commit).await?;
        }
        Err(Self::timeout())
    }

    async fn find_order(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
        self.inner.find_order(order_id).await
    }
}

// ==========================================
// 交错写入: 取消请求已通过预检, 事务开始前另一请求先提交
// ==========================================

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Hook = Box<dyn FnOnce() -> HookFuture + Send>;

/// 取消提交前执行一次的写入 (执行后自动清空)
#[derive(Clone, Default)]
pub struct BeforeCancelHook(Arc<Mutex<Option<Hook>>>);

impl BeforeCancelHook {
    pub fn set<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self.0.lock().unwrap() = Some(Box::new(move || Box::pin(f()) as HookFuture));
    }

    fn take(&self) -> Option<Hook> {
        self.0.lock().unwrap().take()
    }
}

pub struct InterleavedGateway {
    inner: Arc<dyn OrderTransactionGateway>,
    hook: BeforeCancelHook,
}

impl InterleavedGateway {
    pub fn wrap(inner: Arc<dyn OrderTransactionGateway>, hook: BeforeCancelHook) -> Arc<dyn OrderTransactionGateway> {
        Arc::new(Self { inner, hook })
    }
}

#[async_trait]
impl OrderTransactionGateway for InterleavedGateway {
    async fn commit_activation(&self, commit: &ActivationCommit) -> RepositoryResult<()> {
        self.inner.commit_activation(commit).await
    }

    async fn commit_cancellation(&self, commit: &CancellationCommit) -> RepositoryResult<CancellationOutcome> {
        let hook = self.hook.take();
        if let Some(hook) = hook {
            hook().await;
        }
        self.inner.commit_cancellation(commit).await
    }

    async fn find_order(&self, order_id: &str) -> RepositoryResult<Option<ProductionOrder>> {
        self.inner.find_order(order_id).await
    }
}
