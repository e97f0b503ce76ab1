//! Form field validators and text probes

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PageKitError;

// Mainland mobile numbers
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1[0-9]{10}$").unwrap());

// Not anchored: accepts any text that contains an address
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\w)+([-+.](?-u:\w)+)*@(?-u:\w)+([-.](?-u:\w)+)*\.(?-u:\w)+([-.](?-u:\w)+)*")
        .unwrap()
});

static NUM_EN_CN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z\x{4e00}-\x{9fa5}]+$").unwrap());

static NO_SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^`~!@$%&*?<>/\\|=+\^{}\[\]'"【】‘’￥——、，。；：？《》！]*$"#).unwrap()
});

static SQL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(and|or|delete|update|insert|exec|execute|like|select|set|create|table|declare|master|backup|mid|count|add|alter|drop|from|truncate|union|join|script|alert|link)\b",
    )
    .unwrap()
});

static CJK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fa5}]").unwrap());

/// Field formats understood by [`validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationKind {
    /// 11 digits starting with 1
    Phone,
    Email,
    /// Digits, ASCII letters and CJK ideographs only
    NumEnCn,
}

impl FromStr for ValidationKind {
    type Err = PageKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(ValidationKind::Phone),
            "email" => Ok(ValidationKind::Email),
            "numEnCn" | "num_en_cn" => Ok(ValidationKind::NumEnCn),
            other => Err(PageKitError::UnknownValidationKind(other.to_string())),
        }
    }
}

/// Check a field value against a format.
///
/// A required field that is missing or empty fails. A missing value is
/// otherwise checked as the empty string.
pub fn validate(kind: ValidationKind, value: Option<&str>, required: bool) -> bool {
    let value = value.unwrap_or("");
    if required && value.is_empty() {
        return false;
    }

    match kind {
        ValidationKind::Phone => PHONE.is_match(value),
        ValidationKind::Email => EMAIL.is_match(value),
        ValidationKind::NumEnCn => NUM_EN_CN.is_match(value),
    }
}

/// True if the text contains punctuation outside the allowed set
pub fn has_special_char(text: &str) -> bool {
    !NO_SPECIAL.is_match(text)
}

/// True if the text contains an SQL keyword as a whole word
pub fn has_sql_keyword(text: &str) -> bool {
    SQL_KEYWORD.is_match(text)
}

pub fn has_cjk_char(text: &str) -> bool {
    CJK.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone() {
        assert!(validate(ValidationKind::Phone, Some("13800138000"), true));
        assert!(!validate(ValidationKind::Phone, Some("23800138000"), true));
        assert!(!validate(ValidationKind::Phone, Some("1380013800"), false));
        assert!(!validate(ValidationKind::Phone, None, false));
    }

    #[test]
    fn test_email_is_unanchored() {
        assert!(validate(ValidationKind::Email, Some("dev.team+ci@example.co.uk"), true));
        assert!(validate(ValidationKind::Email, Some("contact: a@b.io"), true));
        assert!(!validate(ValidationKind::Email, Some("not-an-address"), true));
    }

    #[test]
    fn test_num_en_cn() {
        assert!(validate(ValidationKind::NumEnCn, Some("abc123中文"), false));
        assert!(!validate(ValidationKind::NumEnCn, Some("abc 123"), false));
        assert!(!validate(ValidationKind::NumEnCn, Some(""), false));
    }

    #[test]
    fn test_required_empty_fails() {
        assert!(!validate(ValidationKind::Email, Some(""), true));
        assert!(!validate(ValidationKind::Email, None, true));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("numEnCn".parse::<ValidationKind>().unwrap(), ValidationKind::NumEnCn);
        let err = "zip".parse::<ValidationKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown validation kind 'zip'");
    }

    #[test]
    fn test_text_probes() {
        assert!(has_special_char("hello<script>"));
        assert!(has_special_char("你好！"));
        assert!(!has_special_char("plain text 123"));

        assert!(has_sql_keyword("1 OR 1=1"));
        assert!(has_sql_keyword("Drop Table users"));
        assert!(!has_sql_keyword("android"));

        assert!(has_cjk_char("abc中"));
        assert!(!has_cjk_char("abc"));
    }
}
