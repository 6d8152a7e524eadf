//! Request and response bodies for the tracker backend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============= Auth =============

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of a successful login. DRF `authtoken` says `token`, simplejwt says `access`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "access", alias = "key")]
    pub token: String,
}

// ============= Spends =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spend {
    pub id: i64,
    pub title: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendDraft {
    pub title: String,
    pub amount: Decimal,
    pub category: Option<i64>,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl From<&Spend> for SpendDraft {
    fn from(s: &Spend) -> Self {
        Self {
            title: s.title.clone(),
            amount: s.amount,
            category: s.category,
            date: s.date,
            note: s.note.clone(),
        }
    }
}

// ============= Tasks =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct CompletedPatch {
    pub completed: bool,
}

// ============= Categories =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDraft {
    pub name: String,
}

// ============= Profile =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Profile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// A list endpoint answers with a bare array, or with a DRF page when
/// pagination is enabled on the backend.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListBody<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paged { results: items } => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn spend_accepts_string_and_number_amounts() {
        let s: Spend = serde_json::from_str(
            r#"{"id": 1, "title": "Lunch", "amount": "12.50", "category": 3, "date": "2024-05-01", "note": null}"#,
        )
        .unwrap();
        assert_eq!(s.amount, Decimal::from_str("12.50").unwrap());
        assert_eq!(s.category, Some(3));

        let s: Spend = serde_json::from_str(
            r#"{"id": 2, "title": "Bus", "amount": 2.75, "date": "2024-05-02"}"#,
        )
        .unwrap();
        assert_eq!(s.amount, Decimal::from_str("2.75").unwrap());
        assert_eq!(s.category, None);
    }

    #[test]
    fn spend_draft_sends_amount_as_string() {
        let draft = SpendDraft {
            title: "Coffee".into(),
            amount: Decimal::from_str("3.20").unwrap(),
            category: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            note: None,
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["amount"], "3.20");
        assert_eq!(v["date"], "2024-01-02");
        assert!(v["category"].is_null());
    }

    #[test]
    fn list_body_accepts_pages() {
        let plain: ListBody<Category> =
            serde_json::from_str(r#"[{"id": 1, "name": "Food"}]"#).unwrap();
        assert_eq!(plain.into_vec().len(), 1);

        let paged: ListBody<Category> = serde_json::from_str(
            r#"{"count": 2, "next": null, "previous": null, "results": [{"id": 1, "name": "Food"}, {"id": 2, "name": "Rent"}]}"#,
        )
        .unwrap();
        assert_eq!(paged.into_vec()[1].name, "Rent");
    }

    #[test]
    fn token_aliases() {
        let t: TokenResponse = serde_json::from_str(r#"{"access": "jwt", "refresh": "r"}"#).unwrap();
        assert_eq!(t.token, "jwt");
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let mut p = Profile {
            id: Some(1),
            username: "alice".into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
        };
        assert_eq!(p.display_name(), "alice");
        p.first_name = "Alice".into();
        assert_eq!(p.display_name(), "Alice");
    }
}
