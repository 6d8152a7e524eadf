//! Client-side form checks. Each function turns raw input into a typed draft
//! or names the first offending field.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::api::types::{
    Category, CategoryDraft, Credentials, ProfileUpdate, Registration, SpendDraft, TaskDraft,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_CATEGORY_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FormError {
    pub field: &'static str,
    pub message: String,
}

impl FormError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type FormResult<T> = Result<T, FormError>;

fn required(field: &'static str, value: &str) -> FormResult<String> {
    let v = value.trim();
    if v.is_empty() {
        Err(FormError::new(field, "is required"))
    } else {
        Ok(v.to_string())
    }
}

fn optional(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

pub fn parse_date(field: &'static str, value: &str) -> FormResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| FormError::new(field, "use YYYY-MM-DD"))
}

pub fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}

pub fn credentials(username: &str, password: &str) -> FormResult<Credentials> {
    let username = required("username", username)?;
    if password.is_empty() {
        return Err(FormError::new("password", "is required"));
    }
    Ok(Credentials {
        username,
        password: password.to_string(),
    })
}

pub fn registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> FormResult<Registration> {
    let username = required("username", username)?;
    let email = required("email", email)?;
    if !looks_like_email(&email) {
        return Err(FormError::new("email", "is not a valid address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirm {
        return Err(FormError::new("confirm", "passwords do not match"));
    }
    Ok(Registration {
        username,
        email,
        password: password.to_string(),
    })
}

/// `date` empty means `today`.
pub fn spend(
    title: &str,
    amount: &str,
    date: &str,
    category: Option<i64>,
    note: &str,
    today: NaiveDate,
) -> FormResult<SpendDraft> {
    let title = required("title", title)?;

    let raw = required("amount", amount)?;
    let amount = Decimal::from_str(&raw).map_err(|_| FormError::new("amount", "is not a number"))?;
    if amount <= Decimal::ZERO {
        return Err(FormError::new("amount", "must be greater than zero"));
    }
    if amount.normalize().scale() > 2 {
        return Err(FormError::new("amount", "at most 2 decimal places"));
    }

    let date = if date.trim().is_empty() {
        today
    } else {
        parse_date("date", date)?
    };

    Ok(SpendDraft {
        title,
        amount: amount.round_dp(2),
        category,
        date,
        note: optional(note),
    })
}

pub fn task(title: &str, description: &str, due_date: &str, completed: bool) -> FormResult<TaskDraft> {
    let title = required("title", title)?;
    let due_date = if due_date.trim().is_empty() {
        None
    } else {
        Some(parse_date("due_date", due_date)?)
    };
    Ok(TaskDraft {
        title,
        description: optional(description),
        completed,
        due_date,
    })
}

pub fn category(name: &str, existing: &[Category]) -> FormResult<CategoryDraft> {
    let name = required("name", name)?;
    if name.chars().count() > MAX_CATEGORY_LEN {
        return Err(FormError::new(
            "name",
            format!("at most {MAX_CATEGORY_LEN} characters"),
        ));
    }
    let lower = name.to_lowercase();
    if existing.iter().any(|c| c.name.trim().to_lowercase() == lower) {
        return Err(FormError::new("name", "already exists"));
    }
    Ok(CategoryDraft { name })
}

pub fn profile(email: &str, first_name: &str, last_name: &str) -> FormResult<ProfileUpdate> {
    let email = email.trim();
    if !email.is_empty() && !looks_like_email(email) {
        return Err(FormError::new("email", "is not a valid address"));
    }
    Ok(ProfileUpdate {
        email: email.to_string(),
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
    })
}
