//! User profiles and the statistics read model.

use serde::{Deserialize, Serialize};

use super::ProfileStore;
use crate::core::{Result, SessionId};
use crate::session::Outcome;

/// A player: identity, counters and owned sessions.
///
/// Persisted as `{ username, avatarRef, gamesPlayed, gamesWon, savedSessionIds }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub avatar_ref: String,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub games_won: u32,
    #[serde(default)]
    pub saved_session_ids: Vec<SessionId>,
}

impl UserProfile {
    /// Create a profile with zeroed counters.
    pub fn new(username: impl Into<String>, avatar_ref: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            avatar_ref: avatar_ref.into(),
            ..Self::default()
        }
    }

    /// Count one finished game.
    pub fn record_outcome(&mut self, outcome: Outcome) {
        self.games_played = self.games_played.saturating_add(1);
        if outcome.is_win() {
            self.games_won = self.games_won.saturating_add(1);
        }
    }

    /// Remember an owned session. Returns false if it was already listed.
    pub fn add_session(&mut self, id: SessionId) -> bool {
        if self.saved_session_ids.contains(&id) {
            return false;
        }
        self.saved_session_ids.push(id);
        true
    }

    #[must_use]
    pub fn owns(&self, id: SessionId) -> bool {
        self.saved_session_ids.contains(&id)
    }
}

/// One line of the statistics table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRow {
    pub username: String,
    pub games_played: u32,
    pub games_won: u32,
}

impl StatisticsRow {
    /// Fraction of games won, 0.0 when none were played.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            f64::from(self.games_won) / f64::from(self.games_played)
        }
    }
}

impl From<&UserProfile> for StatisticsRow {
    fn from(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            games_played: profile.games_played,
            games_won: profile.games_won,
        }
    }
}

/// Statistics for every profile, sorted by username.
pub fn statistics(profiles: &dyn ProfileStore) -> Result<Vec<StatisticsRow>> {
    let mut rows: Vec<StatisticsRow> = profiles.list()?.iter().map(StatisticsRow::from).collect();
    rows.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(rows)
}
