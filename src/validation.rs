use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3})(\d{3,4})(\d{4})$").expect("phone pattern"));

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// `01012345678` becomes `010-1234-5678`; anything that does not look like a
/// Korean phone number is returned as given.
pub fn format_phone(phone: &str) -> String {
    if phone.is_empty() {
        return String::new();
    }
    let cleaned = digits(phone);
    match PHONE_RE.captures(&cleaned) {
        Some(caps) => format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]),
        None => phone.to_string(),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    (10..=11).contains(&digits(phone).len())
}

/// Digits of a phone number, used for searching.
pub fn phone_digits(phone: &str) -> String {
    digits(phone)
}

pub fn truncate(value: &str, length: usize) -> String {
    if value.chars().count() <= length {
        return value.to_string();
    }
    let head: String = value.chars().take(length).collect();
    format!("{head}...")
}

/// Form rules. Each returns the message to show, or `None` when the value
/// passes. Blank values pass everything except [`required`].
pub mod rules {
    use super::{is_valid_email, is_valid_phone};

    pub fn required(value: &str, field: &str) -> Option<String> {
        if value.trim().is_empty() {
            return Some(format!("{field}는 필수 입력 항목입니다."));
        }
        None
    }

    pub fn email(value: &str) -> Option<String> {
        if value.is_empty() || is_valid_email(value) {
            return None;
        }
        Some("유효한 이메일 주소를 입력해주세요.".to_string())
    }

    pub fn phone(value: &str) -> Option<String> {
        if value.is_empty() || is_valid_phone(value) {
            return None;
        }
        Some("유효한 전화번호를 입력해주세요.".to_string())
    }

    pub fn min_length(value: &str, min: usize) -> Option<String> {
        if value.is_empty() || value.chars().count() >= min {
            return None;
        }
        Some(format!("최소 {min}자 이상 입력해주세요."))
    }

    pub fn max_length(value: &str, max: usize) -> Option<String> {
        if value.is_empty() || value.chars().count() <= max {
            return None;
        }
        Some(format!("최대 {max}자까지 입력 가능합니다."))
    }

    pub fn number(value: &str) -> Option<String> {
        if value.is_empty() || value.trim().parse::<f64>().is_ok() {
            return None;
        }
        Some("숫자만 입력 가능합니다.".to_string())
    }

    pub fn range(value: &str, min: f64, max: f64) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        match value.trim().parse::<f64>() {
            Ok(num) if num >= min && num <= max => None,
            _ => Some(format!("{min}에서 {max} 사이의 값을 입력해주세요.")),
        }
    }
}

/// Collects rule failures so a form can report all of them at once.
#[derive(Debug, Default)]
pub struct Errors(Vec<String>);

impl Errors {
    pub fn check(&mut self, outcome: Option<String>) -> &mut Self {
        if let Some(message) = outcome {
            self.0.push(message);
        }
        self
    }

    pub fn push(&mut self, message: impl Into<String>) -> &mut Self {
        self.0.push(message.into());
        self
    }

    pub fn into_result(self) -> crate::errors::DomainResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(crate::errors::DomainError::Validation(self.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mobile_numbers() {
        assert_eq!(format_phone("01012345678"), "010-1234-5678");
        assert_eq!(format_phone("0101234567"), "010-123-4567");
        assert_eq!(format_phone("010-1234-5678"), "010-1234-5678");
        assert_eq!(format_phone("12345"), "12345");
        assert_eq!(format_phone(""), "");
    }

    #[test]
    fn email_needs_a_dotted_domain() {
        assert!(!is_valid_email("foo@bar"));
        assert!(is_valid_email("foo@bar.com"));
        assert!(!is_valid_email("foo bar@baz.com"));
    }

    #[test]
    fn phone_digit_count() {
        assert!(is_valid_phone("010-1234-5678"));
        assert!(is_valid_phone("02-1234-5678"));
        assert!(!is_valid_phone("02-123-4567"));
        assert!(!is_valid_phone("1234"));
    }

    #[test]
    fn rules_skip_blank_values() {
        assert!(rules::email("").is_none());
        assert!(rules::phone("").is_none());
        assert!(rules::number("").is_none());
        assert_eq!(
            rules::required("  ", "이름").as_deref(),
            Some("이름는 필수 입력 항목입니다.")
        );
        assert!(rules::range("5", 1.0, 10.0).is_none());
        assert!(rules::range("11", 1.0, 10.0).is_some());
        assert!(rules::min_length("abc", 6).is_some());
        assert!(rules::max_length("abcdef", 3).is_some());
        assert!(rules::number("12a").is_some());
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("필라테스 그룹", 4), "필라테스...");
        assert_eq!(truncate("요가", 4), "요가");
    }

    #[test]
    fn errors_collect_into_validation() {
        let mut errors = Errors::default();
        errors.check(rules::email("foo@bar")).check(rules::phone("010"));
        assert!(errors.into_result().is_err());
    }
}
