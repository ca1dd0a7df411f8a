use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    /// Anything that is not a valid role is treated as a plain user.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Income {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDateTime,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub description: String,
    pub method: String,
    pub date: NaiveDateTime,
}

/// An expense joined with the username of whoever recorded it.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct ExpenseWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub expense: Expense,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewIncome {
    pub amount: f64,
    pub description: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub name: String,
    pub amount: f64,
    pub description: String,
    pub method: String,
    pub date: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_column_value() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn unknown_role_is_not_admin() {
        let user = User {
            id: 1,
            username: "budi".into(),
            pwd_hash: "x".into(),
            role: "superuser".into(),
            created_at: String::new(),
        };
        assert_eq!(user.role(), Role::User);
        assert!(!user.is_admin());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            username: "budi".into(),
            pwd_hash: "$argon2id$secret".into(),
            role: "user".into(),
            created_at: String::new(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("budi"));
    }
}
