//! Deadline - 외부 호출에 붙이는 취소 가능한 마감 시간
//!
//! Completion 서비스와 원격 도구 호출은 모두 이 래퍼를 통과합니다.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 취소 가능한 데드라인
#[derive(Debug, Clone)]
pub struct Deadline {
    timeout: Duration,
    cancel: CancellationToken,
}

impl Deadline {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// 독립된 취소 토큰으로 생성
    pub fn after(timeout: Duration) -> Self {
        Self::new(timeout, CancellationToken::new())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 같은 토큰을 공유하되 다른 시간 제한을 가진 데드라인
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self::new(timeout, self.cancel.clone())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// future를 데드라인 안에서 실행
    ///
    /// `what` only labels the timeout message.
    pub async fn run<F>(&self, what: &str, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.timeout, fut) => {
                result.map_err(|_| Error::Timeout(format!(
                    "{} exceeded {}s",
                    what,
                    self.timeout.as_secs_f32()
                )))
            }
        }
    }
}
