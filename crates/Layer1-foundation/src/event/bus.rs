//! Event Bus - 인스턴스별 이벤트 브로드캐스트
//!
//! 실행 인스턴스마다 하나씩 생성됩니다. 전역 버스는 두지 않습니다:
//! 동시에 실행되는 인스턴스끼리 activity id가 겹쳐도 이벤트가 섞이지 않아야 합니다.

use super::types::{InstanceId, SkillEvent, SkillEventKind};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

/// 이벤트 버스 설정
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 브로드캐스트 채널 용량
    pub channel_capacity: usize,

    /// 이벤트 히스토리 보관 개수
    pub history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_size: 100,
        }
    }
}

/// 이벤트 버스
///
/// Publishing never blocks; subscribers that fall behind lose the oldest
/// events (broadcast semantics) but can always read the bounded history.
pub struct EventBus {
    instance_id: InstanceId,
    config: EventBusConfig,
    sender: broadcast::Sender<SkillEvent>,
    history: Mutex<VecDeque<SkillEvent>>,
    event_count: AtomicU64,
}

impl EventBus {
    /// 기본 설정으로 이벤트 버스 생성
    pub fn new(instance_id: InstanceId) -> Self {
        Self::with_config(instance_id, EventBusConfig::default())
    }

    /// 커스텀 설정으로 이벤트 버스 생성
    pub fn with_config(instance_id: InstanceId, config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));

        Self {
            instance_id,
            config,
            sender,
            history: Mutex::new(VecDeque::new()),
            event_count: AtomicU64::new(0),
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// 이벤트 발행
    pub fn publish(&self, kind: SkillEventKind) {
        let event = SkillEvent::new(self.instance_id, kind);
        let count = self.event_count.fetch_add(1, Ordering::SeqCst);

        trace!(
            instance = %self.instance_id,
            event_id = %event.id,
            "Publishing event #{}", count + 1
        );

        {
            let mut history = self.history.lock();
            history.push_back(event.clone());
            while history.len() > self.config.history_size {
                history.pop_front();
            }
        }

        // 수신자가 없으면 send가 실패하지만 히스토리에는 남아 있음
        let _ = self.sender.send(event);
    }

    /// 진행 로그 발행 (편의 함수)
    pub fn log(&self, text: impl Into<String>) {
        self.publish(SkillEventKind::Log { text: text.into() });
    }

    /// 브로드캐스트 수신자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<SkillEvent> {
        self.sender.subscribe()
    }

    /// 최근 이벤트 히스토리 (오래된 순)
    pub fn history(&self) -> Vec<SkillEvent> {
        self.history.lock().iter().cloned().collect()
    }

    /// 총 발행된 이벤트 수
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }
}
