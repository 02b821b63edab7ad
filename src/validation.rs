//! Signin and signup form validation

use crate::error::Locale;
use crate::types::AuthCredentials;
use std::collections::HashMap;
use std::fmt;

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";
pub const REPEAT_PASSWORD_FIELD: &str = "repeatPassword";

/// Minimum password length in UTF-16 code units, the unit browsers report
pub const MIN_PASSWORD_LENGTH: usize = 12;

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_DOMAIN_LABEL_LENGTH: usize = 63;
const GMAIL_DOMAINS: [&str; 2] = ["gmail.com", "googlemail.com"];

/// Field-level validation failure shown next to an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    EmptyFields,
    ShortPassword,
    IncorrectEmail,
    PasswordsMustMatch,
}

impl FieldError {
    pub fn localized(&self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Self::EmptyFields) => "Fill in all fields",
            (Locale::En, Self::ShortPassword) => "Password must be longer than 11 characters",
            (Locale::En, Self::IncorrectEmail) => "Incorrect email",
            (Locale::En, Self::PasswordsMustMatch) => "Passwords must match",
            (Locale::Ru, Self::EmptyFields) => "Заполните все поля",
            (Locale::Ru, Self::ShortPassword) => "Пароль должен быть больше 11 символов",
            (Locale::Ru, Self::IncorrectEmail) => "Некорректная почта",
            (Locale::Ru, Self::PasswordsMustMatch) => "Пароли должны совпадать",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.localized(Locale::En))
    }
}

/// Error slots for the three auth form inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub email: Option<FieldError>,
    pub password: Option<FieldError>,
    pub repeat_password: Option<FieldError>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.repeat_password.is_none()
    }
}

/// Named inputs of a submitted auth form
///
/// A form that carries a `repeatPassword` input is a signup form.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    fields: HashMap<String, String>,
}

impl AuthForm {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_signup(&self) -> bool {
        self.fields.contains_key(REPEAT_PASSWORD_FIELD)
    }

    /// Value of a named input; empty inputs count as missing
    fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Validates auth forms and keeps the resulting field errors for the UI
#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    errors: FormErrors,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Validate a submitted form
    ///
    /// Returns the credentials to send, or `None` with the offending field
    /// errors set.
    pub fn validate(&mut self, form: &AuthForm) -> Option<AuthCredentials> {
        let email = form.value(EMAIL_FIELD);
        let password = form.value(PASSWORD_FIELD);

        let (email, password) = match (email, password) {
            (Some(email), Some(password)) => (email, password),
            (email, password) => {
                if password.is_none() {
                    self.errors.password = Some(FieldError::EmptyFields);
                }
                if email.is_none() {
                    self.errors.email = Some(FieldError::EmptyFields);
                }
                return None;
            }
        };

        if utf16_len(password) < MIN_PASSWORD_LENGTH {
            self.errors.password = Some(FieldError::ShortPassword);
            return None;
        }

        if !is_email(email) {
            self.errors.email = Some(FieldError::IncorrectEmail);
            return None;
        }

        if form.is_signup() {
            // An empty repeat input still has to match
            let repeat = form.fields.get(REPEAT_PASSWORD_FIELD).map(String::as_str);
            if repeat.is_some_and(|repeat| repeat != password) {
                self.errors.repeat_password = Some(FieldError::PasswordsMustMatch);
                return None;
            }
        }

        Some(AuthCredentials::new(email, password))
    }

    /// Clear all field errors
    pub fn reset(&mut self) {
        self.errors = FormErrors::default();
    }
}

/// Domain-aware email address check
///
/// Requires a dot-atom local part and a fully qualified domain with an
/// alphabetic or punycode TLD. IP literal domains, quoted local parts and
/// display names are rejected. Gmail addresses must also satisfy Gmail's
/// own username rules.
pub fn is_email(email: &str) -> bool {
    if utf16_len(email) > MAX_EMAIL_LENGTH {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    let lower_domain = domain.to_lowercase();
    if GMAIL_DOMAINS.contains(&lower_domain.as_str()) && !is_gmail_local_part(local) {
        return false;
    }

    if local.len() > MAX_LOCAL_PART_LENGTH || domain.len() > MAX_EMAIL_LENGTH {
        return false;
    }

    is_fqdn(domain) && is_dot_atom(local)
}

/// Gmail ignores dots and `+tag` suffixes; what remains must be 6 to 30
/// letters or digits
fn is_gmail_local_part(local: &str) -> bool {
    let lower = local.to_lowercase();
    let username = lower.split('+').next().unwrap_or_default();

    let undotted_len = username.chars().filter(|c| *c != '.').count();
    if !(6..=30).contains(&undotted_len) {
        return false;
    }

    username.split('.').all(|part| {
        !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    })
}

/// Length as counted by JavaScript's `String.length`
fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn is_dot_atom(local: &str) -> bool {
    local.split('.').all(|part| !part.is_empty() && part.chars().all(is_atom_char))
}

fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || is_extended_char(c)
}

fn is_extended_char(c: char) -> bool {
    matches!(c, '\u{A1}'..='\u{D7FF}' | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFEF}')
}

fn is_fqdn(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2 && is_tld(tld) && labels.iter().all(|label| is_domain_label(label))
}

fn is_tld(tld: &str) -> bool {
    let lower = tld.to_lowercase();
    if let Some(rest) = lower.strip_prefix("xn") {
        if rest.chars().count() >= 2
            && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return true;
        }
    }

    tld.chars().count() >= 2
        && tld
            .chars()
            .all(|c| c.is_ascii_alphabetic() || (is_extended_char(c) && !is_tld_excluded(c)))
}

/// `U+00A9` is the only character in the extended range not allowed in a TLD
fn is_tld_excluded(c: char) -> bool {
    c == '\u{A9}'
}

fn is_domain_label(label: &str) -> bool {
    !label.is_empty()
        && utf16_len(label) <= MAX_DOMAIN_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| {
            (c.is_ascii_alphanumeric() || c == '-' || ('\u{A1}'..='\u{FFFF}').contains(&c))
                && !('\u{FF01}'..='\u{FF5E}').contains(&c)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signin_form(email: &str, password: &str) -> AuthForm {
        AuthForm::from_fields([(EMAIL_FIELD, email), (PASSWORD_FIELD, password)])
    }

    fn signup_form(email: &str, password: &str, repeat: &str) -> AuthForm {
        AuthForm::from_fields([
            (EMAIL_FIELD, email),
            (PASSWORD_FIELD, password),
            (REPEAT_PASSWORD_FIELD, repeat),
        ])
    }

    #[test]
    fn test_valid_signin() {
        let mut validator = FormValidator::new();
        let creds = validator.validate(&signin_form("a@b.com", "123456789012")).unwrap();

        assert_eq!(creds, AuthCredentials::new("a@b.com", "123456789012"));
        assert!(validator.errors().is_empty());
    }

    #[test]
    fn test_missing_fields_flag_each_empty_input() {
        let mut validator = FormValidator::new();

        assert!(validator.validate(&signin_form("", "")).is_none());
        assert_eq!(validator.errors().email, Some(FieldError::EmptyFields));
        assert_eq!(validator.errors().password, Some(FieldError::EmptyFields));

        validator.reset();
        let form = AuthForm::from_fields([(EMAIL_FIELD, "a@b.com")]);
        assert!(validator.validate(&form).is_none());
        assert_eq!(validator.errors().email, None);
        assert_eq!(validator.errors().password, Some(FieldError::EmptyFields));
    }

    #[test]
    fn test_short_password_fails_regardless_of_email() {
        for password in ["1", "12345678901", "ёёёёёёёёёёё"] {
            for email in ["a@b.com", "not-an-email"] {
                let mut validator = FormValidator::new();
                assert!(validator.validate(&signin_form(email, password)).is_none());
                assert_eq!(validator.errors().password, Some(FieldError::ShortPassword));
                assert_eq!(validator.errors().email, None);
            }
        }
    }

    #[test]
    fn test_password_length_counts_utf16_units() {
        let mut validator = FormValidator::new();
        assert!(validator.validate(&signin_form("a@b.com", "ёёёёёёёёёёёё")).is_some());

        // Six astral characters are twelve UTF-16 units
        let emoji = "😀".repeat(6);
        assert!(validator.validate(&signin_form("a@b.com", &emoji)).is_some());

        let emoji = "😀".repeat(5);
        assert!(validator.validate(&signin_form("a@b.com", &emoji)).is_none());
        assert_eq!(validator.errors().password, Some(FieldError::ShortPassword));
    }

    #[test]
    fn test_malformed_email_fails() {
        let malformed = [
            "plainaddress",
            "@example.com",
            "user@",
            "user@localhost",
            "user@example",
            "user@example.c",
            "user@example.123",
            "user@-example.com",
            "user@example-.com",
            "user@exa_mple.com",
            "user@example..com",
            "user@example.com.",
            "user@[192.168.0.1]",
            "user@192.168.0.1",
            "user..name@example.com",
            ".user@example.com",
            "user name@example.com",
            "\"quoted\"@example.com",
            "Name <user@example.com>",
        ];

        for email in malformed {
            let mut validator = FormValidator::new();
            assert!(
                validator.validate(&signin_form(email, "123456789012")).is_none(),
                "{email} should be rejected"
            );
            assert_eq!(validator.errors().email, Some(FieldError::IncorrectEmail));
        }
    }

    #[test]
    fn test_well_formed_emails() {
        for email in [
            "a@b.com",
            "first.last@sub.example.org",
            "user+tag@example.co.uk",
            "o'brien@example.ie",
            "почта@пример.рф",
            "user@xn--p1ai.xn--p1ai",
            "john.doe.1@gmail.com",
            "JohnDoe+news@GoogleMail.com",
        ] {
            assert!(is_email(email), "{email} should be accepted");
        }
    }

    #[test]
    fn test_gmail_rules() {
        assert!(!is_email("abc@gmail.com"));
        assert!(!is_email("a.b.c.d@gmail.com"));
        assert!(!is_email("john_doe@gmail.com"));
        assert!(!is_email("john..doe@gmail.com"));
        assert!(!is_email("abcdefghijklmnopqrstuvwxyz12345@gmail.com"));
        assert!(is_email("a.b.c.d.e.f@gmail.com"));
        // Same rules do not apply elsewhere
        assert!(is_email("abc@example.com"));
    }

    #[test]
    fn test_length_limits() {
        let local = "a".repeat(65);
        assert!(!is_email(&format!("{local}@example.com")));

        let label = "a".repeat(64);
        assert!(!is_email(&format!("user@{label}.com")));
    }

    #[test]
    fn test_idn_label_length_counts_characters() {
        let label = "д".repeat(40);
        assert!(is_email(&format!("user@{label}.рф")));

        let label = "д".repeat(63);
        assert!(is_email(&format!("user@{label}.рф")));

        let label = "д".repeat(64);
        assert!(!is_email(&format!("user@{label}.рф")));
    }

    #[test]
    fn test_signup_mismatch() {
        let mut validator = FormValidator::new();
        let form = signup_form("a@b.com", "123456789012", "123456789013");

        assert!(form.is_signup());
        assert!(validator.validate(&form).is_none());
        assert_eq!(
            validator.errors().repeat_password,
            Some(FieldError::PasswordsMustMatch)
        );
    }

    #[test]
    fn test_signup_match() {
        let mut validator = FormValidator::new();
        let creds = validator
            .validate(&signup_form("a@b.com", "123456789012", "123456789012"))
            .unwrap();

        assert_eq!(creds.password, "123456789012");
    }

    #[test]
    fn test_signup_empty_repeat_must_match() {
        let mut validator = FormValidator::new();
        assert!(validator
            .validate(&signup_form("a@b.com", "123456789012", ""))
            .is_none());
        assert_eq!(
            validator.errors().repeat_password,
            Some(FieldError::PasswordsMustMatch)
        );
    }

    #[test]
    fn test_reset_clears_all_slots() {
        let mut validator = FormValidator::new();
        validator.validate(&signin_form("", ""));
        validator.validate(&signup_form("a@b.com", "123456789012", "x"));
        assert!(!validator.errors().is_empty());

        validator.reset();
        assert_eq!(validator.errors(), &FormErrors::default());
    }

    #[test]
    fn test_field_error_messages() {
        assert_eq!(FieldError::EmptyFields.to_string(), "Fill in all fields");
        assert_eq!(
            FieldError::PasswordsMustMatch.localized(Locale::Ru),
            "Пароли должны совпадать"
        );
    }
}
