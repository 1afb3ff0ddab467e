//! 班次目录
//!
//! 从工作区间批量生成空班次、按模板落角色需求、执行占用约束。
//! 排班文档的更新只允许字段级合并，整文档覆盖会丢掉并发提交的
//! 其他字段。

use std::collections::HashMap;

use crate::errors::{Result, SchedulerError};
use crate::models::schedules::entities::{Schedule, ScheduleState};
use crate::models::schedules::requests::UpdateScheduleRequest;
use crate::models::shifts::entities::{Shift, ShiftId, ShiftRole, StaffingCapacity, Weekday};
use crate::models::tas::entities::{RoleLevel, Ta};
use crate::scheduling::time_grid::{self, TimeOfDay, WorkInterval};

/// 为每个工作日的每个时段生成一个空班次
///
/// 班次 ID 确定性生成（工作日码 + 当日序号），角色需求留空
/// (is_empty = true)，待模板应用后才参与分配
pub fn generate(schedule_id: i64, interval: &WorkInterval, staffing: StaffingCapacity) -> Schedule {
    let now = chrono::Utc::now();
    let slots = interval.enumerate_slots();

    let day_shifts = |weekday: Weekday| -> Vec<Shift> {
        slots
            .iter()
            .enumerate()
            .map(|(i, (start, end))| Shift {
                shift_id: ShiftId::new(weekday, (i + 1) as u32),
                schedule_id,
                start_time: start.to_string(),
                end_time: end.to_string(),
                is_lab: false,
                is_empty: true,
                tas_scheduled: Default::default(),
                staffing_capacity: staffing,
            })
            .collect()
    };

    Schedule {
        schedule_id,
        start_interval_time: interval.start.to_string(),
        end_interval_time: interval.end.to_string(),
        shift_duration: interval.slot_duration as u32,
        state: ScheduleState::Drafted,
        monday: day_shifts(Weekday::Monday),
        tuesday: day_shifts(Weekday::Tuesday),
        wednesday: day_shifts(Weekday::Wednesday),
        thursday: day_shifts(Weekday::Thursday),
        friday: day_shifts(Weekday::Friday),
        saturday: day_shifts(Weekday::Saturday),
        sunday: day_shifts(Weekday::Sunday),
        created_at: now,
        updated_at: now,
    }
}

/// 按模板落角色需求
///
/// 映射键为时段键 ("<day-code>-<HH:MM>")。Lab 班次把 min_role
/// 至少抬到助教级；OH 班次 min_role 归零；未映射的班次清空
/// 角色需求与已有占用
pub fn apply_template(
    schedule: &mut Schedule,
    slot_role_map: &HashMap<String, ShiftRole>,
) -> Result<()> {
    for weekday in Weekday::ALL {
        for shift in schedule.day_mut(weekday) {
            let start = TimeOfDay::parse_slot_time(&shift.start_time).map_err(|e| {
                SchedulerError::validation(format!("Corrupt shift start time: {e}"))
            })?;
            match slot_role_map.get(&time_grid::slot_key(weekday, start)) {
                Some(ShiftRole::Lab) => {
                    shift.is_lab = true;
                    shift.is_empty = false;
                    shift.staffing_capacity.min_role = shift
                        .staffing_capacity
                        .min_role
                        .max(RoleLevel::LabAssistant);
                }
                Some(ShiftRole::OfficeHours) => {
                    shift.is_lab = false;
                    shift.is_empty = false;
                    shift.staffing_capacity.min_role = RoleLevel::OhOnly;
                }
                None => {
                    shift.is_lab = false;
                    shift.is_empty = true;
                    shift.tas_scheduled.clear();
                }
            }
        }
    }
    Ok(())
}

/// 把一名 TA 放入班次
///
/// 集合语义：重复放入同一 TA 是无操作。角色不足返回
/// RoleIneligible，容量已满返回 CapacityExceeded
pub fn assign_occupant(shift: &mut Shift, ta: &Ta) -> Result<()> {
    if shift.tas_scheduled.contains(&ta.ta_id) {
        return Ok(());
    }
    if ta.lab_perm < shift.staffing_capacity.min_role {
        return Err(SchedulerError::role_ineligible(format!(
            "TA '{}' has lab_perm {} but shift {} requires at least {}",
            ta.ta_id, ta.lab_perm, shift.shift_id, shift.staffing_capacity.min_role
        )));
    }
    if shift.is_full() {
        return Err(SchedulerError::capacity_exceeded(format!(
            "Shift {} already has {}/{} TAs",
            shift.shift_id,
            shift.occupant_count(),
            shift.staffing_capacity.count
        )));
    }
    shift.tas_scheduled.insert(ta.ta_id.clone());
    Ok(())
}

/// 字段级合并更新（$set 语义）
///
/// 只覆盖请求中出现的字段，其余保持原值。存储层的更新路径
/// 必须经过这里，不允许整文档替换
pub fn apply_merge_update(schedule: &mut Schedule, update: UpdateScheduleRequest) {
    if let Some(state) = update.state {
        schedule.state = state;
    }
    if let Some(shifts) = update.monday {
        schedule.monday = shifts;
    }
    if let Some(shifts) = update.tuesday {
        schedule.tuesday = shifts;
    }
    if let Some(shifts) = update.wednesday {
        schedule.wednesday = shifts;
    }
    if let Some(shifts) = update.thursday {
        schedule.thursday = shifts;
    }
    if let Some(shifts) = update.friday {
        schedule.friday = shifts;
    }
    if let Some(shifts) = update.saturday {
        schedule.saturday = shifts;
    }
    if let Some(shifts) = update.sunday {
        schedule.sunday = shifts;
    }
    schedule.updated_at = chrono::Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval() -> WorkInterval {
        WorkInterval::parse("09:00", "00:00", 90).unwrap()
    }

    fn ta(ta_id: &str, lab_perm: RoleLevel) -> Ta {
        let now = chrono::Utc::now();
        Ta {
            ta_id: ta_id.to_string(),
            first_name: "Test".to_string(),
            last_name: "Ta".to_string(),
            is_tf: false,
            lab_perm,
            preferences: vec![],
            confirmed_shifts: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_generate_full_week() {
        let schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 2));

        assert_eq!(schedule.state, ScheduleState::Drafted);
        assert_eq!(schedule.total_shifts(), 7 * 10);
        assert_eq!(schedule.monday.len(), 10);

        let first = &schedule.monday[0];
        assert_eq!(first.shift_id.to_string(), "m1");
        assert_eq!(first.start_time, "09:00");
        assert_eq!(first.end_time, "10:30");
        assert!(first.is_empty);
        assert!(!first.is_lab);
        assert!(first.tas_scheduled.is_empty());

        let last = &schedule.sunday[9];
        assert_eq!(last.shift_id.to_string(), "su10");
        assert_eq!(last.start_time, "22:30");
        assert_eq!(last.end_time, "24:00");
    }

    #[test]
    fn test_generate_single_slot_scenario() {
        let interval = WorkInterval::parse("09:00", "10:30", 90).unwrap();
        let schedule = generate(1, &interval, StaffingCapacity::new(RoleLevel::OhOnly, 1));
        // 每天 1 班，整周 7 班
        assert_eq!(schedule.total_shifts(), 7);
        for weekday in Weekday::ALL {
            assert_eq!(schedule.day(weekday).len(), 1);
        }
    }

    #[test]
    fn test_apply_template_roles() {
        let mut schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 2));

        let mut slots = HashMap::new();
        slots.insert("m-09:00".to_string(), ShiftRole::Lab);
        slots.insert("m-10:30".to_string(), ShiftRole::OfficeHours);
        apply_template(&mut schedule, &slots).unwrap();

        let lab = &schedule.monday[0];
        assert!(lab.is_lab);
        assert!(!lab.is_empty);
        assert_eq!(lab.role(), Some(ShiftRole::Lab));
        assert_eq!(lab.staffing_capacity.min_role, RoleLevel::LabAssistant);

        let oh = &schedule.monday[1];
        assert!(!oh.is_lab);
        assert!(!oh.is_empty);
        assert_eq!(oh.role(), Some(ShiftRole::OfficeHours));
        assert_eq!(oh.staffing_capacity.min_role, RoleLevel::OhOnly);

        // 未映射的时段保持空置
        let unmapped = &schedule.monday[2];
        assert!(unmapped.is_empty);
        assert_eq!(unmapped.role(), None);
    }

    #[test]
    fn test_apply_template_preserves_stricter_min_role() {
        let mut schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::LabLead, 1));

        let mut slots = HashMap::new();
        slots.insert("m-09:00".to_string(), ShiftRole::Lab);
        apply_template(&mut schedule, &slots).unwrap();

        // 已配置为 lead 级的容量不被放宽
        assert_eq!(
            schedule.monday[0].staffing_capacity.min_role,
            RoleLevel::LabLead
        );
    }

    #[test]
    fn test_apply_template_clears_unmapped_occupants() {
        let mut schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 2));
        let mut slots = HashMap::new();
        slots.insert("m-09:00".to_string(), ShiftRole::OfficeHours);
        apply_template(&mut schedule, &slots).unwrap();

        assign_occupant(&mut schedule.monday[0], &ta("alee03", RoleLevel::OhOnly)).unwrap();

        // 重新应用一个不含该时段的模板，占用被清掉
        apply_template(&mut schedule, &HashMap::new()).unwrap();
        assert!(schedule.monday[0].is_empty);
        assert!(schedule.monday[0].tas_scheduled.is_empty());
    }

    #[test]
    fn test_assign_occupant_capacity_and_role() {
        let mut schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 1));
        let mut slots = HashMap::new();
        slots.insert("m-09:00".to_string(), ShiftRole::Lab);
        apply_template(&mut schedule, &slots).unwrap();

        let shift = &mut schedule.monday[0];
        // capacity = {min_role: 1, count: 1}
        assert_eq!(shift.staffing_capacity.min_role, RoleLevel::LabAssistant);

        assign_occupant(shift, &ta("kbrown13", RoleLevel::LabAssistant)).unwrap();
        assert_eq!(shift.occupant_count(), 1);

        // 已满：第二名合格 TA 被容量拒绝
        assert!(matches!(
            assign_occupant(shift, &ta("ldavis14", RoleLevel::LabLead)),
            Err(SchedulerError::CapacityExceeded(_))
        ));

        // 角色不足优先于容量报告
        assert!(matches!(
            assign_occupant(shift, &ta("ewrigh33", RoleLevel::OhOnly)),
            Err(SchedulerError::RoleIneligible(_))
        ));

        // 重复放入已有成员是无操作
        assign_occupant(shift, &ta("kbrown13", RoleLevel::LabAssistant)).unwrap();
        assert_eq!(shift.occupant_count(), 1);
    }

    #[test]
    fn test_assign_occupant_arbitrary_order_never_overfills() {
        let mut schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 2));
        let mut slots = HashMap::new();
        slots.insert("m-09:00".to_string(), ShiftRole::OfficeHours);
        apply_template(&mut schedule, &slots).unwrap();

        let candidates = ["a1", "b2", "c3", "d4", "e5"];
        // 不同的放入次序都不能超出容量
        for rotation in 0..candidates.len() {
            let mut shift = schedule.monday[0].clone();
            for i in 0..candidates.len() {
                let id = candidates[(rotation + i) % candidates.len()];
                let _ = assign_occupant(&mut shift, &ta(id, RoleLevel::OhOnly));
            }
            assert_eq!(shift.occupant_count(), 2);
        }
    }

    #[test]
    fn test_merge_update_preserves_untouched_fields() {
        let mut schedule = generate(7, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 2));
        let original_tuesday = schedule.tuesday.clone();

        let mut monday = schedule.monday.clone();
        monday.truncate(3);

        apply_merge_update(
            &mut schedule,
            UpdateScheduleRequest {
                monday: Some(monday),
                ..Default::default()
            },
        );

        assert_eq!(schedule.monday.len(), 3);
        // 未提供的字段保持不变
        assert_eq!(schedule.tuesday, original_tuesday);
        assert_eq!(schedule.shift_duration, 90);
        assert_eq!(schedule.start_interval_time, "09:00");
        assert_eq!(schedule.state, ScheduleState::Drafted);
        assert_eq!(schedule.schedule_id, 7);
    }

    #[test]
    fn test_merge_update_state_only() {
        let mut schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 2));
        let monday = schedule.monday.clone();

        apply_merge_update(
            &mut schedule,
            UpdateScheduleRequest {
                state: Some(ScheduleState::Populated),
                ..Default::default()
            },
        );

        assert_eq!(schedule.state, ScheduleState::Populated);
        assert_eq!(schedule.monday, monday);
    }

    #[test]
    fn test_generated_slots_match_seeded_grid() {
        // 与既有前端/种子数据一致的 09:00 起 90 分钟网格
        let schedule = generate(1, &interval(), StaffingCapacity::new(RoleLevel::OhOnly, 1));
        let starts: Vec<&str> = schedule.monday.iter().map(|s| s.start_time.as_str()).collect();
        assert_eq!(
            starts,
            vec![
                "09:00", "10:30", "12:00", "13:30", "15:00", "16:30", "18:00", "19:30", "21:00",
                "22:30"
            ]
        );
    }
}
