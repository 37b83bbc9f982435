//! Form checks run before anything is sent to the server.

use thiserror::Error;

use sharebin_types::api::{ContentInput, RegisterRequest};

pub const MAX_TAGS: usize = 5;
const TAG_LEN: std::ops::RangeInclusive<usize> = 2..=20;
const MIN_PASSWORD: usize = 6;
const MIN_USERNAME: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must be at least {0} characters")]
    TitleTooShort(usize),
    #[error("content must be at least {0} characters")]
    ContentTooShort(usize),
    #[error("maximum {MAX_TAGS} tags allowed")]
    TooManyTags,
    #[error("tag '{0}' must be between 2 and 20 characters")]
    BadTag(String),
    #[error("username must be at least {MIN_USERNAME} characters")]
    UsernameTooShort,
    #[error("email is invalid")]
    BadEmail,
    #[error("password must be at least {MIN_PASSWORD} characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("new password must be different from current password")]
    PasswordUnchanged,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("room name cannot be empty")]
    EmptyRoomName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Paste,
    Blog,
}

impl ContentKind {
    fn min_title(self) -> usize {
        match self {
            Self::Paste => 3,
            Self::Blog => 5,
        }
    }

    fn min_content(self) -> usize {
        match self {
            Self::Paste => 10,
            Self::Blog => 50,
        }
    }
}

/// Paste or blog editor contents; `tags` is the raw comma-separated field.
#[derive(Debug, Clone, Default)]
pub struct ContentForm {
    pub title: String,
    pub content: String,
    pub tags: String,
}

impl ContentForm {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: tags.into(),
        }
    }

    pub fn validate(&self, kind: ContentKind) -> Result<ContentInput, ValidationError> {
        let title = self.title.trim();
        if title.chars().count() < kind.min_title() {
            return Err(ValidationError::TitleTooShort(kind.min_title()));
        }
        let content = self.content.trim();
        if content.chars().count() < kind.min_content() {
            return Err(ValidationError::ContentTooShort(kind.min_content()));
        }
        let tags = parse_tags(&self.tags);
        if tags.len() > MAX_TAGS {
            return Err(ValidationError::TooManyTags);
        }
        if let Some(bad) = tags.iter().find(|t| !TAG_LEN.contains(&t.chars().count())) {
            return Err(ValidationError::BadTag(bad.clone()));
        }
        Ok(ContentInput {
            title: title.to_string(),
            content: content.to_string(),
            tags,
        })
    }
}

/// Splits on commas, trims, and drops empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let username = self.username.trim();
        if username.chars().count() < MIN_USERNAME {
            return Err(ValidationError::UsernameTooShort);
        }
        let email = self.email.trim();
        if !is_email(email) {
            return Err(ValidationError::BadEmail);
        }
        check_new_password(&self.password, &self.confirm_password)?;

        let name = self.name.trim();
        Ok(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            name: (!name.is_empty()).then(|| name.to_string()),
            role: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_new_password(&self.new_password, &self.confirm_password)?;
        if self.new_password == self.current_password {
            return Err(ValidationError::PasswordUnchanged);
        }
        Ok(())
    }
}

/// Length rule shared by sign-up, password change and admin reset.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_password(password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Something before an `@`, and a `.` somewhere after it with text on both sides.
fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => match domain.rsplit_once('.') {
            Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.contains('@'),
            None => false,
        },
        _ => false,
    }
}
