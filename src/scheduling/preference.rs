//! 偏好编解码
//!
//! 线上格式 "<day-code>:<HH:MM>-<HH:MM>:<level>"，如 "m:7:00-8:30:2"。
//! 解码规则与历史实现保持一致：级别取最后一个冒号之后，
//! 工作日取第一个冒号之前（大小写不敏感）。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Result, SchedulerError};
use crate::models::shifts::entities::Weekday;
use crate::models::tas::entities::{PreferenceEntry, PreferenceLevel};
use crate::scheduling::time_grid::{self, TimeOfDay, WorkInterval};

static TIME_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}-\d{1,2}:\d{2}$").expect("Invalid time range regex"));

/// 编码单条偏好
pub fn encode(
    weekday: Weekday,
    start: TimeOfDay,
    end: TimeOfDay,
    level: PreferenceLevel,
) -> String {
    format!("{}:{}-{}:{}", weekday.code(), start, end, level)
}

/// 解码单条偏好串
///
/// shift_id 保持空占位，待网格存在后由 contract 绑定
pub fn decode(raw: &str) -> Result<PreferenceEntry> {
    let last_colon = raw
        .rfind(':')
        .ok_or_else(|| SchedulerError::malformed_preference(format!("Invalid format: {raw}")))?;

    let level: i64 = raw[last_colon + 1..].parse().map_err(|_| {
        SchedulerError::malformed_preference(format!("Preference must be 0,1,2: {raw}"))
    })?;
    let level = PreferenceLevel::from_int(level).map_err(|_| {
        SchedulerError::malformed_preference(format!("Preference must be 0,1,2: {raw}"))
    })?;

    let time_slots = &raw[..last_colon];
    let first_colon = time_slots
        .find(':')
        .ok_or_else(|| SchedulerError::malformed_preference(format!("Invalid format: {raw}")))?;

    let day = &time_slots[..first_colon];
    let time_range = &time_slots[first_colon + 1..];

    let weekday = Weekday::from_code(day)
        .ok_or_else(|| SchedulerError::malformed_preference(format!("Invalid day: {day}")))?;

    if !TIME_RANGE_RE.is_match(time_range) {
        return Err(SchedulerError::malformed_preference(format!(
            "Invalid time format: {time_range}"
        )));
    }

    Ok(PreferenceEntry {
        shift_id: String::new(),
        time_slots: format!("{}:{}", weekday.code(), time_range),
        preference: level,
    })
}

/// 拆解 time_slots 串为 (工作日, 起, 止)
///
/// 终点的 "00:00"/"24:00" 统一按日终处理
pub fn split_time_slots(time_slots: &str) -> Result<(Weekday, TimeOfDay, TimeOfDay)> {
    let err = || SchedulerError::malformed_preference(format!("Invalid time slot: {time_slots}"));

    let (day, range) = time_slots.split_once(':').ok_or_else(err)?;
    let weekday = Weekday::from_code(day).ok_or_else(err)?;
    let (start, end) = range.split_once('-').ok_or_else(err)?;

    let start = TimeOfDay::parse(start).map_err(|_| err())?;
    let end = TimeOfDay::parse_slot_time(end).map_err(|_| err())?;

    Ok((weekday, start, time_grid::normalized_end(end)))
}

/// 网格对齐校验：时间范围必须与当前区间产生的某个时段完全重合
///
/// 解码成功但不对齐的偏好永远无法绑定到班次，提交时即以
/// UnalignedSlot 拒绝，而不是留到分配阶段静默丢弃
pub fn validate_alignment(entry: &PreferenceEntry, interval: &WorkInterval) -> Result<()> {
    let (_, start, end) = split_time_slots(&entry.time_slots)?;

    let aligned = interval
        .enumerate_slots()
        .into_iter()
        .any(|slot| slot == (start, end));

    if aligned {
        Ok(())
    } else {
        Err(SchedulerError::unaligned_slot(format!(
            "Time range {}-{} does not match any generated slot",
            start, end
        )))
    }
}

/// 构造稠密周偏好向量
///
/// 覆盖每个工作日的每个时段（固定周内次序），未在映射中出现的
/// 时段默认不可用。分配算法假定每个 TA 的向量是稠密的
pub fn build_weekly_vector(
    availability: &HashMap<String, PreferenceLevel>,
    interval: &WorkInterval,
) -> Vec<PreferenceEntry> {
    let slots = interval.enumerate_slots();
    let mut vector = Vec::with_capacity(7 * slots.len());

    for weekday in Weekday::ALL {
        for (start, end) in &slots {
            let level = availability
                .get(&time_grid::slot_key(weekday, *start))
                .copied()
                .unwrap_or(PreferenceLevel::Unavailable);
            vector.push(PreferenceEntry {
                shift_id: String::new(),
                time_slots: format!("{}:{}-{}", weekday.code(), start, end),
                preference: level,
            });
        }
    }

    vector
}

/// 把稀疏的偏好列表补全为稠密周向量
///
/// 已有条目的等级保留（同一时段重复时取后者），其余时段补
/// 不可用。时段键对不上当前网格的条目被丢弃——提交校验已经
/// 挡住这种条目，这里只是兜底
pub fn densify(entries: &[PreferenceEntry], interval: &WorkInterval) -> Vec<PreferenceEntry> {
    let mut availability = HashMap::new();
    for entry in entries {
        if let Ok((weekday, start, _)) = split_time_slots(&entry.time_slots) {
            availability.insert(time_grid::slot_key(weekday, start), entry.preference);
        }
    }
    build_weekly_vector(&availability, interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid() {
        let entry = decode("m:7:00-8:30:2").unwrap();
        assert_eq!(entry.shift_id, "");
        assert_eq!(entry.time_slots, "m:7:00-8:30");
        assert_eq!(entry.preference, PreferenceLevel::Preferred);
    }

    #[test]
    fn test_decode_case_insensitive_day() {
        let entry = decode("TU:09:00-10:30:1").unwrap();
        assert_eq!(entry.time_slots, "tu:09:00-10:30");
        assert_eq!(entry.preference, PreferenceLevel::Available);
    }

    #[test]
    fn test_decode_rejects_bad_level() {
        assert!(matches!(
            decode("m:7:00-8:30:5"),
            Err(SchedulerError::MalformedPreference(_))
        ));
        assert!(matches!(
            decode("m:7:00-8:30:x"),
            Err(SchedulerError::MalformedPreference(_))
        ));
        // 缺失级别时最后一个冒号落在分钟上，"30" 不是合法级别
        assert!(matches!(
            decode("m:7:00-8:30"),
            Err(SchedulerError::MalformedPreference(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_day() {
        assert!(matches!(
            decode("xx:7:00-8:30:1"),
            Err(SchedulerError::MalformedPreference(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_time_range() {
        assert!(matches!(
            decode("m:700-830:1"),
            Err(SchedulerError::MalformedPreference(_))
        ));
        assert!(matches!(
            decode("m:7:00/8:30:1"),
            Err(SchedulerError::MalformedPreference(_))
        ));
        assert!(matches!(
            decode("nonsense"),
            Err(SchedulerError::MalformedPreference(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let start = TimeOfDay::parse("09:00").unwrap();
        let end = TimeOfDay::parse("10:30").unwrap();
        let raw = encode(Weekday::Thursday, start, end, PreferenceLevel::Preferred);
        assert_eq!(raw, "th:09:00-10:30:2");

        let entry = decode(&raw).unwrap();
        assert_eq!(entry.time_slots, "th:09:00-10:30");
        assert_eq!(entry.preference, PreferenceLevel::Preferred);

        let (weekday, decoded_start, decoded_end) = split_time_slots(&entry.time_slots).unwrap();
        assert_eq!(weekday, Weekday::Thursday);
        assert_eq!(decoded_start, start);
        assert_eq!(decoded_end, end);
    }

    #[test]
    fn test_split_normalizes_midnight_end() {
        let (_, _, end) = split_time_slots("m:22:30-00:00").unwrap();
        assert_eq!(end, TimeOfDay::END_OF_DAY);
        let (_, _, end) = split_time_slots("m:22:30-24:00").unwrap();
        assert_eq!(end, TimeOfDay::END_OF_DAY);
    }

    #[test]
    fn test_weekly_vector_is_dense() {
        let interval = WorkInterval::parse("09:00", "12:00", 90).unwrap();
        assert_eq!(interval.count_slots(), 2);

        let mut availability = HashMap::new();
        availability.insert("m-09:00".to_string(), PreferenceLevel::Preferred);
        availability.insert("su-10:30".to_string(), PreferenceLevel::Available);

        let vector = build_weekly_vector(&availability, &interval);
        assert_eq!(vector.len(), 7 * 2);

        // 固定周内次序：周一的两个时段排最前
        assert_eq!(vector[0].time_slots, "m:09:00-10:30");
        assert_eq!(vector[0].preference, PreferenceLevel::Preferred);
        assert_eq!(vector[1].time_slots, "m:10:30-12:00");
        assert_eq!(vector[1].preference, PreferenceLevel::Unavailable);

        // 周日最后一个时段
        assert_eq!(vector[13].time_slots, "su:10:30-12:00");
        assert_eq!(vector[13].preference, PreferenceLevel::Available);

        // 未覆盖的时段全部默认不可用
        let unavailable = vector
            .iter()
            .filter(|entry| entry.preference == PreferenceLevel::Unavailable)
            .count();
        assert_eq!(unavailable, 12);
    }

    #[test]
    fn test_densify_preserves_levels_and_fills_gaps() {
        let interval = WorkInterval::parse("09:00", "12:00", 90).unwrap();
        let sparse = vec![
            decode("m:09:00-10:30:2").unwrap(),
            decode("f:10:30-12:00:1").unwrap(),
        ];

        let dense = densify(&sparse, &interval);
        assert_eq!(dense.len(), 14);
        assert_eq!(dense[0].time_slots, "m:09:00-10:30");
        assert_eq!(dense[0].preference, PreferenceLevel::Preferred);

        let friday_late = dense
            .iter()
            .find(|entry| entry.time_slots == "f:10:30-12:00")
            .unwrap();
        assert_eq!(friday_late.preference, PreferenceLevel::Available);

        let filled = dense
            .iter()
            .filter(|entry| entry.preference == PreferenceLevel::Unavailable)
            .count();
        assert_eq!(filled, 12);
    }

    #[test]
    fn test_alignment_accepts_exact_slot() {
        let interval = WorkInterval::parse("09:00", "00:00", 90).unwrap();
        let entry = decode("m:09:00-10:30:1").unwrap();
        assert!(validate_alignment(&entry, &interval).is_ok());

        // 最后一班 22:30-24:00
        let entry = decode("f:22:30-24:00:2").unwrap();
        assert!(validate_alignment(&entry, &interval).is_ok());
    }

    #[test]
    fn test_alignment_rejects_misaligned_range() {
        let interval = WorkInterval::parse("09:00", "00:00", 90).unwrap();

        // 起点不在时段边界上
        let entry = decode("m:09:15-10:45:1").unwrap();
        assert!(matches!(
            validate_alignment(&entry, &interval),
            Err(SchedulerError::UnalignedSlot(_))
        ));

        // 起点对齐但跨越两个时段
        let entry = decode("m:09:00-12:00:1").unwrap();
        assert!(matches!(
            validate_alignment(&entry, &interval),
            Err(SchedulerError::UnalignedSlot(_))
        ));
    }
}
