use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    /// Blocked users get a refusal instead of a reading
    pub access: bool,
    pub admin: bool,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub user_id: i64,
    pub cards: Vec<String>,
    pub request: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn user_state(&self) -> UserState {
        UserState::parse(&self.state)
    }
}

/// Dialogue state kept in `users.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Main,
    /// The user picked a spread of this many cards
    Cards(usize),
}

impl UserState {
    /// Unknown values fall back to [`UserState::Main`].
    pub fn parse(s: &str) -> Self {
        s.strip_prefix("cards_")
            .and_then(|n| n.parse().ok())
            .map(Self::Cards)
            .unwrap_or(Self::Main)
    }

    pub fn card_count(self, default: usize) -> usize {
        match self {
            Self::Cards(n) => n,
            Self::Main => default,
        }
    }
}

impl std::fmt::Display for UserState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Cards(n) => write!(f, "cards_{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_card_state() {
        assert_eq!(UserState::parse("cards_3"), UserState::Cards(3));
        assert_eq!(UserState::parse("main"), UserState::Main);
        assert_eq!(UserState::parse("cards_x"), UserState::Main);
        assert_eq!(UserState::parse(""), UserState::Main);
    }

    #[test]
    fn display_matches_stored_form() {
        assert_eq!(UserState::Cards(7).to_string(), "cards_7");
        assert_eq!(UserState::Main.to_string(), "main");
        assert_eq!(UserState::parse(&UserState::Cards(2).to_string()), UserState::Cards(2));
    }

    #[test]
    fn card_count_uses_default_in_main_state() {
        assert_eq!(UserState::Main.card_count(5), 5);
        assert_eq!(UserState::Cards(3).card_count(5), 3);
    }
}
