use crate::errors::AppError;

/// Returns the trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Checks that every named field is present and non-blank.
/// The error lists all missing fields in the order given.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| non_blank(*value).is_none())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Trims and lower-cases an email after checking its shape:
/// one `@`, non-empty local part, a dotted domain, no whitespace.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let invalid = || AppError::Validation(format!("Invalid email address: {}", raw.trim()));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(email)
}

/// Trims a phone number after checking it holds 7 to 15 digits once spaces,
/// dashes, parentheses and a leading `+` are removed.
pub fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let phone = raw.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let digits: String = body
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit())
        || !(7..=15).contains(&digits.len())
    {
        return Err(AppError::Validation(format!("Invalid phone number: {phone}")));
    }
    Ok(phone.to_string())
}

/// Optional URL: blank is `None`, otherwise it must be http(s).
pub fn normalize_optional_url(raw: Option<&str>) -> Result<Option<String>, AppError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
            Ok(Some(url.to_string()))
        }
        Some(url) => Err(AppError::Validation(format!(
            "Proof of work must be an http(s) URL: {url}"
        ))),
    }
}
