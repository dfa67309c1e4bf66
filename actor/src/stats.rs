//! Training loop statistics and persistence.
//!
//! Counters are updated lock-free from the orchestrator as games and
//! iterations complete. A snapshot is written to `training_stats.json` in
//! the data directory after every iteration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

use crate::selfplay::GameSummary;

#[derive(Debug)]
pub struct TrainingStats {
    iterations_completed: AtomicU32,
    games_completed: AtomicU32,
    total_plies: AtomicU64,
    /// Games with a positive outcome label
    white_wins: AtomicU32,
    black_wins: AtomicU32,
    draws: AtomicU32,
    searches: AtomicU64,
    search_nodes: AtomicU64,
    training_records: AtomicU64,
    ensemble_trees: AtomicU32,
    /// Most recent arena score, if any
    last_win_rate: Mutex<Option<f64>>,
    start_time: Instant,
    stats_path: PathBuf,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingStatsSnapshot {
    pub iterations_completed: u32,
    pub games_completed: u32,
    pub total_plies: u64,
    pub white_wins: u32,
    pub black_wins: u32,
    pub draws: u32,
    pub avg_game_length: f64,
    pub avg_nodes_per_search: f64,
    pub games_per_second: f64,
    pub training_records: u64,
    pub ensemble_trees: u32,
    pub last_win_rate: Option<f64>,
    pub runtime_seconds: f64,
    pub timestamp: u64,
}

impl TrainingStats {
    pub fn new(data_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(data_dir) {
            warn!("Failed to create data directory: {}", e);
        }

        Self {
            iterations_completed: AtomicU32::new(0),
            games_completed: AtomicU32::new(0),
            total_plies: AtomicU64::new(0),
            white_wins: AtomicU32::new(0),
            black_wins: AtomicU32::new(0),
            draws: AtomicU32::new(0),
            searches: AtomicU64::new(0),
            search_nodes: AtomicU64::new(0),
            training_records: AtomicU64::new(0),
            ensemble_trees: AtomicU32::new(0),
            last_win_rate: Mutex::new(None),
            start_time: Instant::now(),
            stats_path: data_dir.join("training_stats.json"),
        }
    }

    /// Record a finished self-play game.
    pub fn record_game(&self, summary: &GameSummary) {
        self.games_completed.fetch_add(1, Ordering::Relaxed);
        self.total_plies
            .fetch_add(summary.plies as u64, Ordering::Relaxed);
        self.searches
            .fetch_add(summary.searches as u64, Ordering::Relaxed);
        self.search_nodes.fetch_add(summary.nodes, Ordering::Relaxed);

        if summary.outcome > 0.0 {
            self.white_wins.fetch_add(1, Ordering::Relaxed);
        } else if summary.outcome < 0.0 {
            self.black_wins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.draws.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed training iteration.
    pub fn record_iteration(&self, records: usize, ensemble_trees: usize) {
        self.iterations_completed.fetch_add(1, Ordering::Relaxed);
        self.training_records
            .fetch_add(records as u64, Ordering::Relaxed);
        self.ensemble_trees
            .store(ensemble_trees as u32, Ordering::Relaxed);
    }

    pub fn record_win_rate(&self, win_rate: f64) {
        if let Ok(mut last) = self.last_win_rate.lock() {
            *last = Some(win_rate);
        }
    }

    pub fn snapshot(&self) -> TrainingStatsSnapshot {
        let games = self.games_completed.load(Ordering::Relaxed);
        let plies = self.total_plies.load(Ordering::Relaxed);
        let searches = self.searches.load(Ordering::Relaxed);
        let nodes = self.search_nodes.load(Ordering::Relaxed);
        let runtime = self.start_time.elapsed().as_secs_f64();

        let avg_game_length = if games > 0 {
            plies as f64 / games as f64
        } else {
            0.0
        };
        let avg_nodes_per_search = if searches > 0 {
            nodes as f64 / searches as f64
        } else {
            0.0
        };
        let games_per_second = if runtime > 0.0 {
            games as f64 / runtime
        } else {
            0.0
        };

        TrainingStatsSnapshot {
            iterations_completed: self.iterations_completed.load(Ordering::Relaxed),
            games_completed: games,
            total_plies: plies,
            white_wins: self.white_wins.load(Ordering::Relaxed),
            black_wins: self.black_wins.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
            avg_game_length,
            avg_nodes_per_search,
            games_per_second,
            training_records: self.training_records.load(Ordering::Relaxed),
            ensemble_trees: self.ensemble_trees.load(Ordering::Relaxed),
            last_win_rate: self.last_win_rate.lock().ok().and_then(|r| *r),
            runtime_seconds: runtime,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write stats to JSON (write-then-rename).
    pub fn write_stats(&self) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize training stats: {}", e);
                return;
            }
        };

        let temp_path = self.stats_path.with_extension("json.tmp");
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write training stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote training stats to {}", self.stats_path.display());
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn game(plies: u32, outcome: f64) -> GameSummary {
        GameSummary {
            game: 0,
            plies,
            outcome,
            records: plies as usize,
            searches: plies,
            nodes: plies as u64 * 10,
        }
    }

    #[test]
    fn test_record_games() {
        let dir = tempdir().unwrap();
        let stats = TrainingStats::new(dir.path());

        stats.record_game(&game(9, 1.0));
        stats.record_game(&game(8, -1.0));
        stats.record_game(&game(10, 0.0));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 3);
        assert_eq!(snapshot.white_wins, 1);
        assert_eq!(snapshot.black_wins, 1);
        assert_eq!(snapshot.draws, 1);
        assert_eq!(snapshot.total_plies, 27);
        assert!((snapshot.avg_game_length - 9.0).abs() < 1e-9);
        assert!((snapshot.avg_nodes_per_search - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_averages_with_nothing_recorded() {
        let dir = tempdir().unwrap();
        let snapshot = TrainingStats::new(dir.path()).snapshot();

        assert_eq!(snapshot.games_completed, 0);
        assert_eq!(snapshot.avg_game_length, 0.0);
        assert_eq!(snapshot.avg_nodes_per_search, 0.0);
        assert_eq!(snapshot.last_win_rate, None);
    }

    #[test]
    fn test_iterations_and_win_rate() {
        let dir = tempdir().unwrap();
        let stats = TrainingStats::new(dir.path());

        stats.record_iteration(100, 3);
        stats.record_iteration(50, 5);
        stats.record_win_rate(0.75);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.iterations_completed, 2);
        assert_eq!(snapshot.training_records, 150);
        assert_eq!(snapshot.ensemble_trees, 5);
        assert_eq!(snapshot.last_win_rate, Some(0.75));
    }

    #[test]
    fn test_write_stats_overwrites() {
        let dir = tempdir().unwrap();
        let stats = TrainingStats::new(dir.path());
        assert_eq!(stats.stats_path(), dir.path().join("training_stats.json"));

        stats.record_game(&game(5, 1.0));
        stats.write_stats();
        let first: TrainingStatsSnapshot =
            serde_json::from_str(&fs::read_to_string(stats.stats_path()).unwrap()).unwrap();
        assert_eq!(first.games_completed, 1);

        stats.record_game(&game(7, -1.0));
        stats.write_stats();
        let second: TrainingStatsSnapshot =
            serde_json::from_str(&fs::read_to_string(stats.stats_path()).unwrap()).unwrap();
        assert_eq!(second.games_completed, 2);
        assert!(!dir.path().join("training_stats.json.tmp").exists());
    }

    #[test]
    fn test_creates_missing_data_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let stats = TrainingStats::new(&nested);
        stats.write_stats();
        assert!(nested.join("training_stats.json").exists());
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let stats = Arc::new(TrainingStats::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_game(&game(5, 1.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().games_completed, 800);
    }
}
