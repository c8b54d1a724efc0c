//! Input checks shared by registration, admin user creation and password change

pub const MAX_NAME_CHARS: usize = 60;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 16;
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required");
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err("Name must be at most 60 characters");
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace and exactly one `@`
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let invalid = "Invalid email address";
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid);
    }
    let (local, domain) = email.split_once('@').ok_or(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid),
    }
}

/// 8-16 characters from `[A-Za-z0-9!@#$%^&*]`, with at least one
/// uppercase letter and one of `!@#$%^&*`
pub fn validate_new_password(password: &str) -> Result<(), &'static str> {
    let message = "New password must be 8-16 characters, include one uppercase letter and one special character.";

    let len = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&len) {
        return Err(message);
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    if !password.chars().all(allowed) {
        return Err(message);
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !(has_upper && has_special) {
        return Err(message);
    }
    Ok(())
}
