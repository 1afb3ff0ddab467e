//! 分配契约
//!
//! 与外部分配算法交换的数据形状及其两侧校验。算法作为独立进程
//! 从共享存储读取 TA 与活动排班、把结果合并写回同一存储
//! （文档化的旁路接口），因此结果在被采纳前必须整体通过这里的
//! 校验；任何违例都使本次调度作废，不做自动修正。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::errors::{Result, SchedulerError};
use crate::models::schedules::entities::Schedule;
use crate::models::shifts::entities::{ShiftId, StaffingCapacity, Weekday};
use crate::models::tas::entities::{PreferenceLevel, RoleLevel, Ta};
use crate::scheduling::catalog;
use crate::scheduling::preference;
use crate::scheduling::time_grid::{self, TimeOfDay};

/// 单个 TA 对单个班次的意向
#[derive(Debug, Clone, Serialize)]
pub struct ShiftPreference {
    pub shift_id: ShiftId,
    pub preference: PreferenceLevel,
}

/// 发给算法的 TA 侧条目
#[derive(Debug, Clone, Serialize)]
pub struct TaOffer {
    pub ta_id: String,
    pub lab_perm: RoleLevel,
    pub preferences: Vec<ShiftPreference>,
}

/// 发给算法的班次侧条目
#[derive(Debug, Clone, Serialize)]
pub struct ShiftDemand {
    pub shift_id: ShiftId,
    pub is_lab: bool,
    pub staffing_capacity: StaffingCapacity,
}

/// 完整的分配请求
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRequest {
    pub schedule_id: i64,
    pub tas: Vec<TaOffer>,
    pub shifts: Vec<ShiftDemand>,
}

/// 把每个 TA 偏好的 time_slots 绑定到共享同一时段键的班次
///
/// 返回成功绑定的条目数。无法对齐到任何班次的条目保持空
/// shift_id（它们不会进入分配请求）
pub fn resolve_shift_ids(schedule: &Schedule, tas: &mut [Ta]) -> Result<usize> {
    // 时段键 → (班次 ID, 终点)，终点也要吻合才算绑定成功
    let mut by_slot: HashMap<String, (ShiftId, TimeOfDay)> = HashMap::new();
    for weekday in Weekday::ALL {
        for shift in schedule.day(weekday) {
            let start = TimeOfDay::parse_slot_time(&shift.start_time).map_err(|e| {
                SchedulerError::validation(format!("Corrupt shift start time: {e}"))
            })?;
            let end = TimeOfDay::parse_slot_time(&shift.end_time).map_err(|e| {
                SchedulerError::validation(format!("Corrupt shift end time: {e}"))
            })?;
            by_slot.insert(time_grid::slot_key(weekday, start), (shift.shift_id, end));
        }
    }

    let mut resolved = 0;
    for ta in tas {
        for entry in &mut ta.preferences {
            entry.shift_id.clear();
            let Ok((weekday, start, end)) = preference::split_time_slots(&entry.time_slots)
            else {
                continue;
            };
            if let Some((shift_id, shift_end)) = by_slot.get(&time_grid::slot_key(weekday, start))
                && *shift_end == end
            {
                entry.shift_id = shift_id.to_string();
                resolved += 1;
            }
        }
    }
    Ok(resolved)
}

/// 打包分配请求
///
/// 只收录配置了角色需求的班次 (is_empty = false) 与已绑定
/// shift_id 的偏好条目
pub fn build_request(schedule: &Schedule, tas: &[Ta]) -> AssignmentRequest {
    let shifts: Vec<ShiftDemand> = schedule
        .all_shifts()
        .filter(|shift| !shift.is_empty)
        .map(|shift| ShiftDemand {
            shift_id: shift.shift_id,
            is_lab: shift.is_lab,
            staffing_capacity: shift.staffing_capacity,
        })
        .collect();

    let demanded: BTreeSet<ShiftId> = shifts.iter().map(|demand| demand.shift_id).collect();

    let tas = tas
        .iter()
        .map(|ta| TaOffer {
            ta_id: ta.ta_id.clone(),
            lab_perm: ta.lab_perm,
            preferences: ta
                .preferences
                .iter()
                .filter_map(|entry| {
                    let shift_id: ShiftId = entry.shift_id.parse().ok()?;
                    // 指向无角色需求班次的偏好不进请求
                    demanded.contains(&shift_id).then_some(ShiftPreference {
                        shift_id,
                        preference: entry.preference,
                    })
                })
                .collect(),
        })
        .collect();

    AssignmentRequest {
        schedule_id: schedule.schedule_id,
        tas,
        shifts,
    }
}

/// 算法产出的原始分配：班次 → 占用 TA 集合
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentResult {
    pub assignments: BTreeMap<ShiftId, BTreeSet<String>>,
}

impl AssignmentResult {
    /// 从算法写回后的排班文档提取分配
    pub fn from_schedule_document(schedule: &Schedule) -> Self {
        let assignments = schedule
            .all_shifts()
            .filter(|shift| !shift.tas_scheduled.is_empty())
            .map(|shift| (shift.shift_id, shift.tas_scheduled.clone()))
            .collect();
        Self { assignments }
    }

    pub fn assigned_pairs(&self) -> usize {
        self.assignments.values().map(|set| set.len()).sum()
    }
}

/// 通过全部校验的分配，只能由 validate 构造
#[derive(Debug, Clone)]
pub struct ValidatedAssignment {
    assignments: BTreeMap<ShiftId, BTreeSet<String>>,
}

impl ValidatedAssignment {
    pub fn assignments(&self) -> &BTreeMap<ShiftId, BTreeSet<String>> {
        &self.assignments
    }
}

/// 校验算法返回的分配
///
/// 逐对执行目录层的角色/容量检查，并确认没有 TA 在同一工作日
/// 被放进两个时间重叠的班次。任何违例返回 ContractViolation，
/// 本次调度整体作废
pub fn validate(
    result: &AssignmentResult,
    schedule: &Schedule,
    tas: &[Ta],
) -> Result<ValidatedAssignment> {
    let ta_index: HashMap<&str, &Ta> = tas.iter().map(|ta| (ta.ta_id.as_str(), ta)).collect();

    // 每个 TA 已接受的时间区间，用于重叠检查
    let mut occupied: HashMap<&str, Vec<(Weekday, TimeOfDay, TimeOfDay)>> = HashMap::new();

    for (shift_id, assignees) in &result.assignments {
        let Some(shift) = schedule.find_shift(shift_id) else {
            return Err(SchedulerError::contract_violation(format!(
                "Assignment references unknown shift '{shift_id}'"
            )));
        };
        if shift.is_empty {
            return Err(SchedulerError::contract_violation(format!(
                "Assignment targets shift '{shift_id}' which carries no role demand"
            )));
        }

        let start = TimeOfDay::parse_slot_time(&shift.start_time).map_err(|e| {
            SchedulerError::validation(format!("Corrupt shift start time: {e}"))
        })?;
        let end = TimeOfDay::parse_slot_time(&shift.end_time)
            .map_err(|e| SchedulerError::validation(format!("Corrupt shift end time: {e}")))?;

        // 在占用清空的副本上重放目录层约束
        let mut probe = shift.clone();
        probe.tas_scheduled.clear();

        for ta_id in assignees {
            let Some(ta) = ta_index.get(ta_id.as_str()).copied() else {
                return Err(SchedulerError::contract_violation(format!(
                    "Assignment references unknown TA '{ta_id}'"
                )));
            };
            catalog::assign_occupant(&mut probe, ta)
                .map_err(|e| SchedulerError::contract_violation(e.format_simple()))?;

            let slots = occupied.entry(ta.ta_id.as_str()).or_default();
            for (day, other_start, other_end) in slots.iter() {
                if *day == shift_id.weekday && start < *other_end && *other_start < end {
                    return Err(SchedulerError::contract_violation(format!(
                        "TA '{ta_id}' assigned to overlapping shifts on {day}"
                    )));
                }
            }
            slots.push((shift_id.weekday, start, end));
        }
    }

    Ok(ValidatedAssignment {
        assignments: result.assignments.clone(),
    })
}

/// 把校验过的分配写回排班与 TA
///
/// 集合语义，幂等：重复写回同一结果不改变任何占用集合。
/// 返回受影响的班次数
pub fn write_back(
    schedule: &mut Schedule,
    validated: &ValidatedAssignment,
    tas: &mut [Ta],
) -> usize {
    let mut affected = 0;
    for weekday in Weekday::ALL {
        for shift in schedule.day_mut(weekday) {
            if let Some(assignees) = validated.assignments().get(&shift.shift_id) {
                shift.tas_scheduled = assignees.clone();
                affected += 1;
            }
        }
    }

    // confirmed_shifts 整体重建（替换而非追加）
    for ta in tas.iter_mut() {
        let confirmed: BTreeSet<String> = validated
            .assignments()
            .iter()
            .filter(|(_, assignees)| assignees.contains(&ta.ta_id))
            .map(|(shift_id, _)| shift_id.to_string())
            .collect();
        ta.confirmed_shifts = confirmed;
        ta.updated_at = chrono::Utc::now();
    }

    schedule.updated_at = chrono::Utc::now();
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedules::entities::Schedule;
    use crate::models::shifts::entities::ShiftRole;
    use crate::scheduling::time_grid::WorkInterval;

    fn ta(ta_id: &str, lab_perm: RoleLevel, raw_prefs: &[&str]) -> Ta {
        let now = chrono::Utc::now();
        Ta {
            ta_id: ta_id.to_string(),
            first_name: "Test".to_string(),
            last_name: "Ta".to_string(),
            is_tf: false,
            lab_perm,
            preferences: raw_prefs
                .iter()
                .map(|raw| preference::decode(raw).unwrap())
                .collect(),
            confirmed_shifts: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn templated_schedule() -> Schedule {
        let interval = WorkInterval::parse("09:00", "12:00", 90).unwrap();
        let mut schedule = catalog::generate(
            1,
            &interval,
            StaffingCapacity::new(RoleLevel::OhOnly, 2),
        );
        let mut slots = HashMap::new();
        slots.insert("m-09:00".to_string(), ShiftRole::Lab);
        slots.insert("m-10:30".to_string(), ShiftRole::OfficeHours);
        slots.insert("tu-09:00".to_string(), ShiftRole::OfficeHours);
        catalog::apply_template(&mut schedule, &slots).unwrap();
        schedule
    }

    fn result_of(pairs: &[(&str, &[&str])]) -> AssignmentResult {
        let assignments = pairs
            .iter()
            .map(|(shift_id, ta_ids)| {
                (
                    shift_id.parse().unwrap(),
                    ta_ids.iter().map(|id| id.to_string()).collect(),
                )
            })
            .collect();
        AssignmentResult { assignments }
    }

    #[test]
    fn test_resolve_shift_ids_binds_aligned_entries() {
        let schedule = templated_schedule();
        let mut tas = vec![ta(
            "alee03",
            RoleLevel::LabLead,
            &["m:09:00-10:30:2", "tu:9:00-10:30:1", "w:13:00-14:30:1"],
        )];

        let resolved = resolve_shift_ids(&schedule, &mut tas).unwrap();
        assert_eq!(resolved, 2);
        assert_eq!(tas[0].preferences[0].shift_id, "m1");
        // 起点以规范形式比较，"9:00" 与 "09:00" 同键
        assert_eq!(tas[0].preferences[1].shift_id, "tu1");
        // 网格之外的时段保持未绑定
        assert_eq!(tas[0].preferences[2].shift_id, "");
    }

    #[test]
    fn test_resolve_requires_matching_end() {
        let schedule = templated_schedule();
        // 起点对齐但终点跨到了下一班
        let mut tas = vec![ta("alee03", RoleLevel::LabLead, &["m:09:00-12:00:2"])];
        let resolved = resolve_shift_ids(&schedule, &mut tas).unwrap();
        assert_eq!(resolved, 0);
        assert_eq!(tas[0].preferences[0].shift_id, "");
    }

    #[test]
    fn test_build_request_shape() {
        let schedule = templated_schedule();
        let mut tas = vec![
            ta("alee03", RoleLevel::LabLead, &["m:09:00-10:30:2"]),
            ta("ewrigh33", RoleLevel::OhOnly, &["w:09:00-10:30:1"]),
        ];
        resolve_shift_ids(&schedule, &mut tas).unwrap();

        let request = build_request(&schedule, &tas);
        assert_eq!(request.schedule_id, 1);
        // 模板只配置了 3 个班次，空置班次不进请求
        assert_eq!(request.shifts.len(), 3);
        assert_eq!(request.tas.len(), 2);
        assert_eq!(request.tas[0].preferences.len(), 1);
        // w-09:00 虽能绑定到 w1，但该班次无角色需求，偏好被过滤
        assert_eq!(request.tas[1].preferences.len(), 0);
    }

    #[test]
    fn test_validate_accepts_conflict_free_result() {
        let schedule = templated_schedule();
        let tas = vec![
            ta("alee03", RoleLevel::LabLead, &[]),
            ta("kbrown13", RoleLevel::LabAssistant, &[]),
            ta("ewrigh33", RoleLevel::OhOnly, &[]),
        ];

        let result = result_of(&[
            ("m1", &["alee03", "kbrown13"]),
            ("m2", &["ewrigh33"]),
            ("tu1", &["alee03"]),
        ]);

        let validated = validate(&result, &schedule, &tas).unwrap();
        assert_eq!(validated.assignments().len(), 3);
    }

    #[test]
    fn test_validate_rejects_unknown_ids() {
        let schedule = templated_schedule();
        let tas = vec![ta("alee03", RoleLevel::LabLead, &[])];

        let result = result_of(&[("f9", &["alee03"])]);
        assert!(matches!(
            validate(&result, &schedule, &tas),
            Err(SchedulerError::ContractViolation(_))
        ));

        let result = result_of(&[("m1", &["ghost99"])]);
        assert!(matches!(
            validate(&result, &schedule, &tas),
            Err(SchedulerError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_role_and_capacity_violations() {
        let schedule = templated_schedule();
        let tas = vec![
            ta("alee03", RoleLevel::LabLead, &[]),
            ta("kbrown13", RoleLevel::LabAssistant, &[]),
            ta("ewrigh33", RoleLevel::OhOnly, &[]),
        ];

        // m1 是 Lab 班，OH-only TA 不合格
        let result = result_of(&[("m1", &["ewrigh33"])]);
        assert!(matches!(
            validate(&result, &schedule, &tas),
            Err(SchedulerError::ContractViolation(_))
        ));

        // m1 容量为 2，塞进 3 人
        let result = result_of(&[("m1", &["alee03", "kbrown13", "ewrigh33"])]);
        assert!(matches!(
            validate(&result, &schedule, &tas),
            Err(SchedulerError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_assignment_to_empty_shift() {
        let schedule = templated_schedule();
        let tas = vec![ta("alee03", RoleLevel::LabLead, &[])];

        // w1 没有配置角色需求
        let result = result_of(&[("w1", &["alee03"])]);
        assert!(matches!(
            validate(&result, &schedule, &tas),
            Err(SchedulerError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_same_day_overlap() {
        let mut schedule = templated_schedule();
        // 人为制造同日重叠：把 m2 的区间改为与 m1 相交
        schedule.monday[1].start_time = "09:30".to_string();
        schedule.monday[1].end_time = "11:00".to_string();

        let tas = vec![ta("alee03", RoleLevel::LabLead, &[])];
        let result = result_of(&[("m1", &["alee03"]), ("m2", &["alee03"])]);
        assert!(matches!(
            validate(&result, &schedule, &tas),
            Err(SchedulerError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_validate_allows_same_ta_on_different_days() {
        let schedule = templated_schedule();
        let tas = vec![ta("alee03", RoleLevel::LabLead, &[])];

        let result = result_of(&[("m1", &["alee03"]), ("tu1", &["alee03"])]);
        assert!(validate(&result, &schedule, &tas).is_ok());
    }

    #[test]
    fn test_write_back_is_idempotent() {
        let mut schedule = templated_schedule();
        let mut tas = vec![
            ta("alee03", RoleLevel::LabLead, &[]),
            ta("ewrigh33", RoleLevel::OhOnly, &[]),
        ];

        let result = result_of(&[("m1", &["alee03"]), ("m2", &["ewrigh33"])]);
        let validated = validate(&result, &schedule, &tas).unwrap();

        let affected = write_back(&mut schedule, &validated, &mut tas);
        assert_eq!(affected, 2);
        let occupants_once: Vec<_> = schedule
            .all_shifts()
            .map(|shift| shift.tas_scheduled.clone())
            .collect();
        let confirmed_once = tas[0].confirmed_shifts.clone();

        // 重复写回同一结果不改变任何集合
        write_back(&mut schedule, &validated, &mut tas);
        let occupants_twice: Vec<_> = schedule
            .all_shifts()
            .map(|shift| shift.tas_scheduled.clone())
            .collect();
        assert_eq!(occupants_once, occupants_twice);
        assert_eq!(tas[0].confirmed_shifts, confirmed_once);

        assert!(schedule.monday[0].tas_scheduled.contains("alee03"));
        assert_eq!(tas[0].confirmed_shifts.len(), 1);
        assert!(tas[0].confirmed_shifts.contains("m1"));
        assert!(tas[1].confirmed_shifts.contains("m2"));
    }

    #[test]
    fn test_write_back_replaces_stale_confirmations() {
        let mut schedule = templated_schedule();
        let mut tas = vec![ta("alee03", RoleLevel::LabLead, &[])];
        tas[0].confirmed_shifts.insert("tu1".to_string());

        let result = result_of(&[("m1", &["alee03"])]);
        let validated = validate(&result, &schedule, &tas).unwrap();
        write_back(&mut schedule, &validated, &mut tas);

        // 旧的确认记录被整体替换
        assert!(!tas[0].confirmed_shifts.contains("tu1"));
        assert!(tas[0].confirmed_shifts.contains("m1"));
    }

    #[test]
    fn test_assignment_result_from_document() {
        let mut schedule = templated_schedule();
        schedule.monday[0].tas_scheduled.insert("alee03".to_string());
        schedule.monday[0].tas_scheduled.insert("kbrown13".to_string());
        schedule.tuesday[0].tas_scheduled.insert("alee03".to_string());

        let result = AssignmentResult::from_schedule_document(&schedule);
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.assigned_pairs(), 3);
    }
}
