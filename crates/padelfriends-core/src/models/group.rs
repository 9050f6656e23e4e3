use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Player {
    pub id: String,
    pub name: String,
    pub group_id: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Match {
    pub id: String,
    pub group_id: String,
    /// Player ids, team 1 first.
    #[serde(default)]
    pub players: Vec<String>,
    pub score_team1: Option<i32>,
    pub score_team2: Option<i32>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Score as "6 - 3", or "pending" until results are submitted
    pub fn score_display(&self) -> String {
        match (self.status, self.score_team1, self.score_team2) {
            (MatchStatus::Completed, Some(a), Some(b)) => format!("{} - {}", a, b),
            _ => "pending".to_string(),
        }
    }
}

/// One page of a group's match history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MatchPage {
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(rename = "pageSize", default)]
    pub page_size: u32,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Statistic {
    pub player_id: String,
    pub player_name: String,

    #[serde(default)]
    pub total_games: u32,
    #[serde(default)]
    pub games_won: u32,
    #[serde(default)]
    pub games_lost: u32,
    #[serde(default)]
    pub game_win_rate: f64,

    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub points_won: u32,
    #[serde(default)]
    pub points_lost: u32,
    #[serde(default)]
    pub point_win_rate: f64,
}

impl Statistic {
    pub fn win_rate_display(&self) -> String {
        if self.total_games == 0 {
            "-".to_string()
        } else {
            format!("{:.0}%", self.game_win_rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_match_page() {
        let json = r#"{
            "matches": [{
                "id": "m1", "group_id": "g1", "players": ["a", "b", "c", "d"],
                "score_team1": 6, "score_team2": 4, "status": "completed"
            }],
            "total": 11, "page": 2, "pageSize": 10, "totalPages": 2
        }"#;
        let page: MatchPage = serde_json::from_str(json).expect("Failed to parse match page JSON");

        assert_eq!(page.matches.len(), 1);
        assert_eq!(page.total, 11);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.matches[0].status, MatchStatus::Completed);
        assert_eq!(page.matches[0].score_display(), "6 - 4");
    }

    #[test]
    fn test_match_without_scores_is_pending() {
        let json = r#"{
            "id": "m2", "group_id": "g1", "players": ["a", "b", "c", "d"],
            "score_team1": null, "score_team2": null
        }"#;
        let m: Match = serde_json::from_str(json).expect("Failed to parse match JSON");
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.score_display(), "pending");
    }

    #[test]
    fn test_statistic_defaults_and_display() {
        let json = r#"{"player_id":"p1","player_name":"Ana"}"#;
        let s: Statistic = serde_json::from_str(json).expect("Failed to parse statistic JSON");
        assert_eq!(s.total_games, 0);
        assert_eq!(s.win_rate_display(), "-");

        let s = Statistic { total_games: 4, game_win_rate: 75.0, ..s };
        assert_eq!(s.win_rate_display(), "75%");
    }
}
