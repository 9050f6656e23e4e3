use std::fmt;
use std::sync::Arc;

use crate::models::{Group, Match, MatchPage, Player, Statistic};

/// The three collections a session caches for its active group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Players,
    Matches,
    Statistics,
}

impl Collection {
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Matches => "matches",
            Collection::Statistics => "statistics",
        }
    }
}

/// Fetch-in-progress flags, one per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub players: bool,
    pub matches: bool,
    pub statistics: bool,
}

impl LoadingFlags {
    pub fn get(&self, collection: Collection) -> bool {
        match collection {
            Collection::Players => self.players,
            Collection::Matches => self.matches,
            Collection::Statistics => self.statistics,
        }
    }

    pub(crate) fn set(&mut self, collection: Collection, value: bool) {
        match collection {
            Collection::Players => self.players = value,
            Collection::Matches => self.matches = value,
            Collection::Statistics => self.statistics = value,
        }
    }

    pub fn any(&self) -> bool {
        self.players || self.matches || self.statistics
    }
}

/// Sequence number of the latest request issued per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RequestSeq {
    players: u64,
    matches: u64,
    statistics: u64,
}

impl RequestSeq {
    fn slot(&mut self, collection: Collection) -> &mut u64 {
        match collection {
            Collection::Players => &mut self.players,
            Collection::Matches => &mut self.matches,
            Collection::Statistics => &mut self.statistics,
        }
    }

    /// Number a new request for `collection`.
    pub(crate) fn issue(&mut self, collection: Collection) -> u64 {
        let slot = self.slot(collection);
        *slot = slot.wrapping_add(1);
        *slot
    }

    pub(crate) fn is_latest(&self, collection: Collection, seq: u64) -> bool {
        let latest = match collection {
            Collection::Players => self.players,
            Collection::Matches => self.matches,
            Collection::Statistics => self.statistics,
        };
        latest == seq
    }
}

/// Paging metadata of the last fetched match page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total: u32,
    pub total_pages: u32,
}

impl From<&MatchPage> for PageInfo {
    fn from(page: &MatchPage) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

/// Snapshot of the active group session.
///
/// Collections are shared immutable slices: a fetch swaps the whole `Arc`,
/// so a snapshot held by a caller never changes underneath it.
#[derive(Clone)]
pub struct SessionState {
    pub current_group: Option<Group>,
    pub password: String,
    pub is_authenticated: bool,
    pub players: Arc<[Player]>,
    pub matches: Arc<[Match]>,
    pub match_page: Option<PageInfo>,
    pub statistics: Option<Arc<[Statistic]>>,
    pub loading: LoadingFlags,
    pub error: Option<String>,
    /// Bumped whenever the active group changes or the session is reset.
    pub(crate) generation: u64,
    pub(crate) requests: RequestSeq,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_group: None,
            password: String::new(),
            is_authenticated: false,
            players: Arc::from(Vec::new()),
            matches: Arc::from(Vec::new()),
            match_page: None,
            statistics: None,
            loading: LoadingFlags::default(),
            error: None,
            generation: 0,
            requests: RequestSeq::default(),
        }
    }
}

impl SessionState {
    pub fn group_id(&self) -> Option<&str> {
        self.current_group.as_ref().map(|g| g.id.as_str())
    }

    pub fn group_name(&self) -> Option<&str> {
        self.current_group.as_ref().map(|g| g.name.as_str())
    }

    /// Drop everything tied to the active group.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            generation: self.generation.wrapping_add(1),
            ..Self::default()
        };
    }

    /// Drop cached collections and in-flight markers ahead of a group switch.
    pub(crate) fn clear_collections(&mut self) {
        self.players = Arc::from(Vec::new());
        self.matches = Arc::from(Vec::new());
        self.match_page = None;
        self.statistics = None;
        self.loading = LoadingFlags::default();
        self.generation = self.generation.wrapping_add(1);
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("current_group", &self.current_group)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("is_authenticated", &self.is_authenticated)
            .field("players", &self.players.len())
            .field("matches", &self.matches.len())
            .field("match_page", &self.match_page)
            .field("statistics", &self.statistics.as_ref().map(|s| s.len()))
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_flags_are_independent() {
        let mut flags = LoadingFlags::default();
        assert!(!flags.any());

        flags.set(Collection::Matches, true);
        flags.set(Collection::Players, true);
        flags.set(Collection::Players, false);

        assert!(flags.get(Collection::Matches));
        assert!(!flags.get(Collection::Players));
        assert!(!flags.get(Collection::Statistics));
        assert!(flags.any());
    }

    #[test]
    fn test_only_newest_request_is_latest() {
        let mut requests = RequestSeq::default();
        let first = requests.issue(Collection::Matches);
        let second = requests.issue(Collection::Matches);
        let players = requests.issue(Collection::Players);

        assert!(!requests.is_latest(Collection::Matches, first));
        assert!(requests.is_latest(Collection::Matches, second));
        assert!(requests.is_latest(Collection::Players, players));
        assert_eq!(players, 1);
    }

    #[test]
    fn test_reset_empties_state() {
        let mut state = SessionState {
            current_group: Some(Group {
                id: "g1".into(),
                name: "Sunday Padel".into(),
                created_at: None,
            }),
            password: "secret".into(),
            is_authenticated: true,
            error: Some("boom".into()),
            ..Default::default()
        };
        state.reset();
        assert!(state.current_group.is_none());
        assert!(state.password.is_empty());
        assert!(!state.is_authenticated);
        assert!(state.error.is_none());
        assert_eq!(state.generation, 1);
    }

    #[test]
    fn test_debug_hides_password() {
        let state = SessionState { password: "secret".into(), ..Default::default() };
        assert!(!format!("{:?}", state).contains("secret"));
    }
}
