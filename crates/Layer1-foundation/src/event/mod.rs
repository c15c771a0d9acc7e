//! Event System - 인스턴스 이벤트 (로그 라인, 사용자 태스크 요청, 종료)

mod bus;
mod types;

pub use bus::{EventBus, EventBusConfig};
pub use types::{EventId, HumanTaskRequest, InstanceId, SkillEvent, SkillEventKind};
