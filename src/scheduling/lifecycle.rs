//! 排班生命周期状态机
//!
//! Drafted → Populated → Dispatched → Published，单向推进。
//! 唯一的回退边是 Dispatched → Populated：算法调度失败
//! (DispatchFailure / ContractViolation) 时整体回到收集态，
//! 绝不带着部分结果前进。

use crate::errors::{Result, SchedulerError};
use crate::models::schedules::entities::{Schedule, ScheduleState};

/// 状态迁移是否合法
pub fn can_transition(from: ScheduleState, to: ScheduleState) -> bool {
    matches!(
        (from, to),
        (ScheduleState::Drafted, ScheduleState::Populated)
            | (ScheduleState::Populated, ScheduleState::Dispatched)
            | (ScheduleState::Dispatched, ScheduleState::Published)
            | (ScheduleState::Dispatched, ScheduleState::Populated)
    )
}

/// 推进排班状态，非法迁移返回 IllegalTransition
pub fn transition(schedule: &mut Schedule, next: ScheduleState) -> Result<()> {
    if !can_transition(schedule.state, next) {
        return Err(SchedulerError::illegal_transition(format!(
            "Cannot move schedule {} from {} to {}",
            schedule.schedule_id, schedule.state, next
        )));
    }
    schedule.state = next;
    schedule.updated_at = chrono::Utc::now();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shifts::entities::StaffingCapacity;
    use crate::models::tas::entities::RoleLevel;
    use crate::scheduling::catalog;
    use crate::scheduling::time_grid::WorkInterval;

    fn schedule() -> Schedule {
        let interval = WorkInterval::parse("09:00", "12:00", 90).unwrap();
        catalog::generate(1, &interval, StaffingCapacity::new(RoleLevel::OhOnly, 1))
    }

    #[test]
    fn test_forward_chain() {
        let mut schedule = schedule();
        assert_eq!(schedule.state, ScheduleState::Drafted);

        transition(&mut schedule, ScheduleState::Populated).unwrap();
        transition(&mut schedule, ScheduleState::Dispatched).unwrap();
        transition(&mut schedule, ScheduleState::Published).unwrap();
        assert_eq!(schedule.state, ScheduleState::Published);
    }

    #[test]
    fn test_rollback_from_dispatched() {
        let mut schedule = schedule();
        transition(&mut schedule, ScheduleState::Populated).unwrap();
        transition(&mut schedule, ScheduleState::Dispatched).unwrap();

        // 调度失败回到收集态
        transition(&mut schedule, ScheduleState::Populated).unwrap();
        assert_eq!(schedule.state, ScheduleState::Populated);

        // 回到收集态后可以重新调度
        transition(&mut schedule, ScheduleState::Dispatched).unwrap();
    }

    #[test]
    fn test_illegal_transitions() {
        let mut schedule = schedule();

        // 不能跳级
        assert!(matches!(
            transition(&mut schedule, ScheduleState::Dispatched),
            Err(SchedulerError::IllegalTransition(_))
        ));
        assert!(matches!(
            transition(&mut schedule, ScheduleState::Published),
            Err(SchedulerError::IllegalTransition(_))
        ));
        // 失败的迁移不改变状态
        assert_eq!(schedule.state, ScheduleState::Drafted);

        // Published 是终态
        transition(&mut schedule, ScheduleState::Populated).unwrap();
        transition(&mut schedule, ScheduleState::Dispatched).unwrap();
        transition(&mut schedule, ScheduleState::Published).unwrap();
        for next in [
            ScheduleState::Drafted,
            ScheduleState::Populated,
            ScheduleState::Dispatched,
        ] {
            assert!(matches!(
                transition(&mut schedule, next),
                Err(SchedulerError::IllegalTransition(_))
            ));
        }
    }
}
