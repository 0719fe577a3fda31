//! E-mail 格式驗證與 CNPJ 正規化。純函式，永不回傳錯誤：
//! 格式不合的輸入一律得到否定答案 (false / None)。

/// 驗證 e-mail 的基本格式（不保證信箱存在）。
///
/// 規則：恰好一個 `@`、local part 與 domain 去空白後非空、
/// domain 含 `.` 且不以 `.` 結尾。
pub fn is_format_valid(email: &str) -> bool {
    let email = email.trim();

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.trim().is_empty() || domain.trim().is_empty() {
        return false;
    }

    if !domain.contains('.') || domain.ends_with('.') {
        return false;
    }

    true
}

/// 取出 domain（最後一個 `@` 之後的部分），小寫、去空白。
/// 沒有 `@` 或結果為空時回傳 None。
pub fn extract_domain(email: &str) -> Option<String> {
    let email = email.trim();
    if !email.contains('@') {
        return None;
    }

    let domain = email.rsplit('@').next()?.trim().to_lowercase();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// 去掉非數字字元並要求恰好 14 位（CNPJ 的正規化格式）。
/// 不足或超過 14 位時回傳 None，該筆不消耗查詢配額。
pub fn normalize_tax_id(tax_id: &str) -> Option<String> {
    let digits: String = tax_id.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 14 {
        Some(digits)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_formats() {
        assert!(is_format_valid("a@b.com"));
        assert!(is_format_valid("  user@example.com.br  "));
        assert!(is_format_valid("user.name+tag@sub.example.com"));
    }

    #[test]
    fn test_missing_or_repeated_at_sign() {
        assert!(!is_format_valid("ab.com"));
        assert!(!is_format_valid(""));
        assert!(!is_format_valid("a@b@c.com"));
        assert!(!is_format_valid("@"));
    }

    #[test]
    fn test_empty_parts() {
        assert!(!is_format_valid("@b.com"));
        assert!(!is_format_valid("a@"));
        assert!(!is_format_valid("   @b.com"));
    }

    #[test]
    fn test_domain_dot_rules() {
        assert!(!is_format_valid("a@bcom"));
        assert!(!is_format_valid("a@b."));
        assert!(is_format_valid("a@b.c"));
    }

    #[test]
    fn test_extract_domain_lowercases_and_trims() {
        assert_eq!(extract_domain("User@Example.COM"), Some("example.com".to_string()));
        assert_eq!(extract_domain("  user@ Example.com "), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_domain_uses_last_at_sign() {
        assert_eq!(extract_domain("a@b@c.com"), Some("c.com".to_string()));
    }

    #[test]
    fn test_extract_domain_absent() {
        assert_eq!(extract_domain("no-at-sign"), None);
        assert_eq!(extract_domain("user@"), None);
        assert_eq!(extract_domain(""), None);
    }

    #[test]
    fn test_normalize_tax_id() {
        assert_eq!(
            normalize_tax_id("12.345.678/0001-95"),
            Some("12345678000195".to_string())
        );
        assert_eq!(
            normalize_tax_id("12345678000195"),
            Some("12345678000195".to_string())
        );
        assert_eq!(normalize_tax_id("123"), None);
        assert_eq!(normalize_tax_id("123456780001950"), None);
        assert_eq!(normalize_tax_id(""), None);
        assert_eq!(normalize_tax_id("abc"), None);
    }
}
