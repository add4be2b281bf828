//! Rankings and statistics over stored results
//!
//! Everything here is derived on demand from the persisted player map and
//! result list; nothing is stored separately.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::persistence::{MAX_GENERATION, MIN_GENERATION, PlayerRecord, SessionResult};

/// Maximum number of players on the ranking
pub const MAX_RANKINGS: usize = 20;

/// Results listed in a player's history
pub const RECENT_RESULTS: usize = 10;

/// One player's best result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player_id: String,
    pub name: String,
    pub generation: u32,
    pub score: u32,
    /// When the best score was achieved (ms since Unix epoch)
    pub played_at: f64,
}

/// Best result per player, score descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<RankingEntry>,
}

impl Leaderboard {
    /// Build from stored records. Results of unknown players are skipped.
    /// Ties keep the earlier-achieved result first.
    pub fn from_records(
        players: &BTreeMap<String, PlayerRecord>,
        results: &[SessionResult],
        limit: usize,
    ) -> Self {
        let mut best: HashMap<&str, RankingEntry> = HashMap::new();
        for result in results {
            let Some(player) = players.get(&result.player_id) else {
                continue;
            };
            let improves = best
                .get(result.player_id.as_str())
                .is_none_or(|e| result.score > e.score);
            if improves {
                best.insert(
                    &result.player_id,
                    RankingEntry {
                        player_id: player.id.clone(),
                        name: player.name.clone(),
                        generation: player.generation,
                        score: result.score,
                        played_at: result.played_at,
                    },
                );
            }
        }

        let mut entries: Vec<RankingEntry> = best.into_values().collect();
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.played_at.total_cmp(&b.played_at))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        entries.truncate(limit);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    /// 1-based rank of a player, if listed
    pub fn rank_of(&self, player_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.player_id == player_id)
            .map(|i| i + 1)
    }

    /// Rank a new score would take against the current entries
    pub fn potential_rank(&self, score: u32) -> usize {
        self.entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len())
            + 1
    }
}

/// Summary of one player's history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games: usize,
    pub best_score: u32,
    /// Rounded mean score
    pub average_score: u32,
    pub total_hazards: u32,
    /// Most recent first
    pub recent: Vec<SessionResult>,
}

pub fn player_stats(player_id: &str, results: &[SessionResult]) -> PlayerStats {
    let mut mine: Vec<&SessionResult> = results.iter().filter(|r| r.player_id == player_id).collect();
    if mine.is_empty() {
        return PlayerStats::default();
    }
    // Stable sort keeps insertion order among equal timestamps
    mine.sort_by(|a, b| b.played_at.total_cmp(&a.played_at));

    let total: u64 = mine.iter().map(|r| r.score as u64).sum();
    PlayerStats {
        games: mine.len(),
        best_score: mine.iter().map(|r| r.score).max().unwrap_or(0),
        average_score: rounded_mean(total, mine.len()),
        total_hazards: mine.iter().map(|r| r.hazard_count).sum(),
        recent: mine.into_iter().take(RECENT_RESULTS).cloned().collect(),
    }
}

/// Aggregate for one generation tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub players: usize,
    pub games: usize,
    pub best_score: u32,
    pub average_score: u32,
}

/// One row per generation, MIN_GENERATION..=MAX_GENERATION, including empty ones
pub fn generation_stats(
    players: &BTreeMap<String, PlayerRecord>,
    results: &[SessionResult],
) -> Vec<GenerationStats> {
    let mut rows: Vec<GenerationStats> = (MIN_GENERATION..=MAX_GENERATION)
        .map(|generation| GenerationStats {
            generation,
            ..GenerationStats::default()
        })
        .collect();
    let mut totals = vec![0u64; rows.len()];
    let index = |generation: u32| {
        (MIN_GENERATION..=MAX_GENERATION)
            .contains(&generation)
            .then(|| (generation - MIN_GENERATION) as usize)
    };

    for player in players.values() {
        if let Some(i) = index(player.generation) {
            rows[i].players += 1;
        }
    }
    for result in results {
        let Some(i) = players.get(&result.player_id).and_then(|p| index(p.generation)) else {
            continue;
        };
        rows[i].games += 1;
        rows[i].best_score = rows[i].best_score.max(result.score);
        totals[i] += result.score as u64;
    }
    for (row, total) in rows.iter_mut().zip(totals) {
        row.average_score = rounded_mean(total, row.games);
    }
    rows
}

fn rounded_mean(total: u64, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u32
}

/// Format milliseconds as m:ss
pub fn format_duration(ms: f64) -> String {
    let secs = (ms.max(0.0) / 1000.0).floor() as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}
