//! Test doubles shared by the session tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::api::{ApiError, GroupGateway};
use crate::auth::{KeyValueStore, MemoryStore};
use crate::models::{Group, Match, MatchPage, MatchStatus, Player, Statistic};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn group(id: &str, name: &str) -> Group {
    Group {
        id: id.to_string(),
        name: name.to_string(),
        created_at: None,
    }
}

pub(crate) fn player(id: &str, name: &str) -> Player {
    Player {
        id: id.to_string(),
        name: name.to_string(),
        group_id: "g1".to_string(),
        created_at: None,
    }
}

pub(crate) fn completed_match(id: &str) -> Match {
    Match {
        id: id.to_string(),
        group_id: "g1".to_string(),
        players: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        score_team1: Some(6),
        score_team2: Some(3),
        status: MatchStatus::Completed,
        created_at: None,
    }
}

pub(crate) fn statistic(player_id: &str) -> Statistic {
    Statistic {
        player_id: player_id.to_string(),
        player_name: player_id.to_uppercase(),
        total_games: 2,
        games_won: 1,
        games_lost: 1,
        game_win_rate: 50.0,
        total_points: 18,
        points_won: 9,
        points_lost: 9,
        point_win_rate: 50.0,
    }
}

/// In-memory group server. Records every call as `"<method>:<argument>"`.
#[derive(Default)]
pub(crate) struct FakeGateway {
    groups: Mutex<Vec<Group>>,
    passwords: Mutex<HashMap<String, String>>,
    players: Mutex<Vec<Player>>,
    matches: Mutex<Vec<Match>>,
    statistics: Mutex<Vec<Statistic>>,
    failing: Mutex<HashSet<&'static str>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    page_delays: Mutex<HashMap<u32, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_group(&self, id: &str, name: &str, password: &str) {
        lock(&self.groups).push(group(id, name));
        lock(&self.passwords).insert(id.to_string(), password.to_string());
    }

    pub(crate) fn set_password(&self, id: &str, password: &str) {
        lock(&self.passwords).insert(id.to_string(), password.to_string());
    }

    pub(crate) fn set_players(&self, players: Vec<Player>) {
        *lock(&self.players) = players;
    }

    pub(crate) fn set_matches(&self, matches: Vec<Match>) {
        *lock(&self.matches) = matches;
    }

    pub(crate) fn set_statistics(&self, statistics: Vec<Statistic>) {
        *lock(&self.statistics) = statistics;
    }

    /// Make every call to `method` fail with a server error.
    pub(crate) fn fail(&self, method: &'static str) {
        lock(&self.failing).insert(method);
    }

    pub(crate) fn recover(&self, method: &'static str) {
        lock(&self.failing).remove(method);
    }

    /// Hold responses to `method` for `delay` before answering.
    pub(crate) fn set_delay(&self, method: &'static str, delay: Duration) {
        lock(&self.delays).insert(method, delay);
    }

    /// Hold the answer for one page of matches.
    pub(crate) fn set_page_delay(&self, page: u32, delay: Duration) {
        lock(&self.page_delays).insert(page, delay);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{}:", method);
        lock(&self.calls).iter().filter(|c| c.starts_with(&prefix)).count()
    }

    async fn enter(&self, method: &'static str, arg: &str) -> Result<(), ApiError> {
        lock(&self.calls).push(format!("{}:{}", method, arg));
        let delay = lock(&self.delays).get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing).contains(method) {
            return Err(ApiError::Server {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: format!("{} unavailable", method),
            });
        }
        Ok(())
    }

    fn check_password(&self, group_id: &str, password: &str) -> Result<(), ApiError> {
        match lock(&self.passwords).get(group_id) {
            Some(expected) if expected == password => Ok(()),
            Some(_) => Err(ApiError::PasswordRejected),
            None => Err(ApiError::NotFound(group_id.to_string())),
        }
    }
}

#[async_trait]
impl GroupGateway for FakeGateway {
    async fn get_by_name(&self, name: &str) -> Result<Group, ApiError> {
        self.enter("get_by_name", name).await?;
        let found = lock(&self.groups).iter().find(|g| g.name == name).cloned();
        found.ok_or_else(|| ApiError::NotFound(name.to_string()))
    }

    async fn authenticate(&self, group_id: &str, password: &str) -> Result<bool, ApiError> {
        self.enter("authenticate", group_id).await?;
        Ok(self.check_password(group_id, password).is_ok())
    }

    async fn get_players(&self, group_id: &str, password: &str) -> Result<Vec<Player>, ApiError> {
        self.enter("get_players", group_id).await?;
        self.check_password(group_id, password)?;
        Ok(lock(&self.players).clone())
    }

    async fn get_matches(
        &self,
        group_id: &str,
        password: &str,
        page: u32,
        page_size: u32,
    ) -> Result<MatchPage, ApiError> {
        self.enter("get_matches", group_id).await?;
        let delay = lock(&self.page_delays).get(&page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_password(group_id, password)?;
        let all = lock(&self.matches).clone();
        let total = all.len() as u32;
        let start = ((page.max(1) - 1) * page_size) as usize;
        let matches = all.into_iter().skip(start).take(page_size as usize).collect();
        Ok(MatchPage {
            matches,
            total,
            page,
            page_size,
            total_pages: if page_size == 0 { 0 } else { total.div_ceil(page_size) },
        })
    }

    async fn get_statistics(
        &self,
        group_id: &str,
        password: &str,
    ) -> Result<Vec<Statistic>, ApiError> {
        self.enter("get_statistics", group_id).await?;
        self.check_password(group_id, password)?;
        Ok(lock(&self.statistics).clone())
    }
}

/// Memory backend that counts flushes.
#[derive(Clone, Default)]
pub(crate) struct CountingStore {
    pub(crate) inner: MemoryStore,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }
}
