use once_cell::sync::Lazy;
use regex::Regex;

static TA_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]{2,15}$").expect("Invalid ta_id regex"));

pub fn validate_ta_id(ta_id: &str) -> Result<(), &'static str> {
    // 校内登录名：小写字母开头，字母数字，3-16 位（如 "mgarci01"）
    if !TA_ID_RE.is_match(ta_id) {
        return Err(
            "TA id must start with a lowercase letter and contain only lowercase letters and digits (3-16 characters)",
        );
    }
    Ok(())
}

pub fn validate_person_name(name: &str) -> Result<(), &'static str> {
    // 姓名非空且不超过 64 字符
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > 64 {
        return Err("Name must not exceed 64 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ta_ids() {
        assert!(validate_ta_id("mgarci01").is_ok());
        assert!(validate_ta_id("alee03").is_ok());
        assert!(validate_ta_id("xstewa52").is_ok());
    }

    #[test]
    fn test_invalid_ta_ids() {
        assert!(validate_ta_id("").is_err());
        assert!(validate_ta_id("ab").is_err());
        assert!(validate_ta_id("Mgarci01").is_err());
        assert!(validate_ta_id("01garcia").is_err());
        assert!(validate_ta_id("m garci").is_err());
        assert!(validate_ta_id("averyverylongloginname").is_err());
    }

    #[test]
    fn test_person_names() {
        assert!(validate_person_name("Maria").is_ok());
        assert!(validate_person_name("  ").is_err());
        assert!(validate_person_name(&"x".repeat(65)).is_err());
    }
}
