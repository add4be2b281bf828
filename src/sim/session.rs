//! Session controller
//!
//! One `Session` is one round: not-started -> running <-> paused -> ended.
//! The host drives it with wall-clock milliseconds: `frame(now, input)` once
//! per animation frame runs due timers (clock ticks, spawns) and then steps
//! the basket and items. Nothing inside reads a real clock, so a session is
//! fully reproducible from its seed and the sequence of calls.
//!
//! Clock ticks, spawns, and burst follow-ups all live on one session-owned
//! `Scheduler`. Pause and end cancel the clock and spawn timers and bump the
//! scheduler epoch, so no work queued before the transition can run after it.

use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::clock::RoundClock;
use super::entity::{Basket, FallingItem, ItemCategory, ScoringRule};
use super::scheduler::{Fired, Scheduler};
use super::score::ScoreTracker;
use super::spawn::Spawner;
use crate::persistence::{PlayerRecord, SessionResult};
use crate::settings::{ConfigError, GameConfig, PointerTracking};

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Running,
    Paused,
    Ended,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Ended => "ended",
        })
    }
}

/// Lifecycle request, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    Pause,
    Resume,
    End,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionAction::Start => "start",
            SessionAction::Pause => "pause",
            SessionAction::Resume => "resume",
            SessionAction::End => "end",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Start requested without a registered player
    NoPlayer,
    InvalidTransition {
        phase: SessionPhase,
        action: SessionAction,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPlayer => write!(f, "a registered player is required to start"),
            Self::InvalidTransition { phase, action } => {
                write!(f, "cannot {action} a session that is {phase}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    HazardLimit,
    Quit,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndReason::TimeUp => "Time's up!",
            EndReason::HazardLimit => "Too much carbon collected!",
            EndReason::Quit => "Game over!",
        })
    }
}

/// Work queued on the session scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTask {
    ClockTick,
    Spawn,
    /// Extra spawn of catalog entry `archetype`
    Burst { archetype: usize },
}

/// Current difficulty parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    pub spawn_interval_ms: f64,
    pub fall_speed: f32,
    /// Checkpoints passed so far
    pub escalations: u32,
}

/// Input sampled for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    /// Pointer/touch x in playfield units, if the pointer is active
    pub pointer_x: Option<f32>,
}

/// Final tally handed to the results screen and to persistence
#[derive(Debug, Clone, PartialEq)]
pub struct EndSummary {
    pub reason: EndReason,
    pub base_score: u32,
    pub time_bonus: u32,
    pub level: u32,
    pub remaining_secs: u32,
    pub result: SessionResult,
}

/// Notifications for the UI and the application layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Paused,
    Resumed,
    Tick {
        remaining: u32,
    },
    ScoreChanged {
        score: u32,
    },
    LevelChanged {
        level: u32,
    },
    Collected {
        category: ItemCategory,
        label: String,
        points: u32,
    },
    HazardHit {
        count: u32,
        max: u32,
    },
    Stolen {
        amount: u32,
    },
    DifficultyIncreased {
        spawn_interval_ms: f64,
        fall_speed: f32,
    },
    Ended(EndSummary),
}

pub struct Session {
    config: GameConfig,
    player: Option<PlayerRecord>,
    phase: SessionPhase,
    scheduler: Scheduler<SessionTask>,
    clock: RoundClock,
    spawner: Spawner,
    tracker: ScoreTracker,
    basket: Basket,
    items: Vec<FallingItem>,
    difficulty: Difficulty,
    rng: Pcg32,
    started_at: Option<f64>,
    summary: Option<EndSummary>,
    events: Vec<SessionEvent>,
}

impl Session {
    /// Build a not-started session. The config is validated here.
    pub fn new(config: GameConfig, player: Option<PlayerRecord>, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let spawner = Spawner::new(&config.spawn, seed)?;
        Ok(Self {
            player,
            phase: SessionPhase::NotStarted,
            scheduler: Scheduler::new(),
            clock: RoundClock::new(config.round_seconds),
            spawner,
            tracker: ScoreTracker::new(config.max_hazards, config.level_step),
            basket: Self::initial_basket(&config),
            items: Vec::new(),
            difficulty: Self::base_difficulty(&config),
            // Independent stream from the spawner's
            rng: Pcg32::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
            started_at: None,
            summary: None,
            events: Vec::new(),
            config,
        })
    }

    fn initial_basket(config: &GameConfig) -> Basket {
        let b = &config.basket;
        Basket::new(
            Vec2::new(b.start_x, b.y),
            Vec2::new(b.width, b.height),
            b.speed,
            config.viewport.width,
        )
    }

    fn base_difficulty(config: &GameConfig) -> Difficulty {
        Difficulty {
            spawn_interval_ms: config.difficulty.base_spawn_interval_ms,
            fall_speed: config.difficulty.base_fall_speed,
            escalations: 0,
        }
    }

    // --- Lifecycle ---

    /// not-started -> running. Resets every counter and arms the clock and
    /// the first spawn (due immediately).
    pub fn start(&mut self, now_ms: f64) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::NotStarted, SessionAction::Start)?;
        let Some(player) = &self.player else {
            return Err(SessionError::NoPlayer);
        };
        log::info!("Session started for {} ({})", player.name, player.id);

        self.tracker.reset();
        self.items.clear();
        self.basket = Self::initial_basket(&self.config);
        self.difficulty = Self::base_difficulty(&self.config);
        self.clock.reset(&mut self.scheduler);

        self.scheduler.advance_to(now_ms);
        self.scheduler.bump_epoch();
        self.started_at = Some(now_ms);
        self.phase = SessionPhase::Running;
        self.arm_timers();
        self.events.push(SessionEvent::Started);
        Ok(())
    }

    /// running -> paused. Timers already due run first; then the clock and
    /// spawn timers are cancelled and queued burst follow-ups are dropped.
    pub fn pause(&mut self, now_ms: f64) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Running, SessionAction::Pause)?;
        self.run_timers(now_ms);
        self.expect_phase(SessionPhase::Running, SessionAction::Pause)?;
        self.scheduler.advance_to(now_ms);
        self.disarm_timers();
        self.phase = SessionPhase::Paused;
        log::info!("Session paused with {}s left", self.clock.remaining());
        self.events.push(SessionEvent::Paused);
        Ok(())
    }

    /// paused -> running. The clock resumes a full second out and a spawn is
    /// due immediately.
    pub fn resume(&mut self, now_ms: f64) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Paused, SessionAction::Resume)?;
        self.scheduler.advance_to(now_ms);
        self.phase = SessionPhase::Running;
        self.arm_timers();
        log::info!("Session resumed");
        self.events.push(SessionEvent::Resumed);
        Ok(())
    }

    /// Pause if running, resume if paused. Returns the new phase.
    pub fn toggle_pause(&mut self, now_ms: f64) -> Result<SessionPhase, SessionError> {
        match self.phase {
            SessionPhase::Running => self.pause(now_ms)?,
            SessionPhase::Paused => self.resume(now_ms)?,
            phase => {
                return Err(SessionError::InvalidTransition {
                    phase,
                    action: SessionAction::Pause,
                });
            }
        }
        Ok(self.phase)
    }

    /// Quit the round (running or paused). Timers already due run first, so
    /// a clock that ran out before the call still ends the round as time-up.
    pub fn end(&mut self, now_ms: f64) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Running | SessionPhase::Paused => {
                self.run_timers(now_ms);
                if self.phase != SessionPhase::Ended {
                    self.finalize(EndReason::Quit, now_ms);
                }
                Ok(())
            }
            phase => Err(SessionError::InvalidTransition {
                phase,
                action: SessionAction::End,
            }),
        }
    }

    fn expect_phase(&self, want: SessionPhase, action: SessionAction) -> Result<(), SessionError> {
        if self.phase == want {
            Ok(())
        } else {
            log::warn!("Rejected {action}: session is {}", self.phase);
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn arm_timers(&mut self) {
        self.clock.start(&mut self.scheduler, SessionTask::ClockTick);
        self.spawner.arm(&mut self.scheduler, 0.0, SessionTask::Spawn);
    }

    fn disarm_timers(&mut self) {
        self.clock.stop(&mut self.scheduler);
        self.spawner.disarm(&mut self.scheduler);
        self.scheduler.bump_epoch();
    }

    // --- Timers ---

    /// Run every timer due at or before `now_ms`, in order. Stops as soon
    /// as the session leaves the running phase.
    pub fn run_timers(&mut self, now_ms: f64) {
        while self.phase == SessionPhase::Running {
            let Some(fired) = self.scheduler.pop_due(now_ms) else {
                break;
            };
            self.handle_timer(fired);
        }
    }

    fn handle_timer(&mut self, fired: Fired<SessionTask>) {
        match fired.task {
            SessionTask::ClockTick => {
                let Some(tick) = self
                    .clock
                    .on_timer(&mut self.scheduler, fired.id, SessionTask::ClockTick)
                else {
                    return;
                };
                self.events.push(SessionEvent::Tick {
                    remaining: tick.remaining,
                });
                if tick.expired {
                    self.finalize(EndReason::TimeUp, fired.due_ms);
                } else if self.config.difficulty.checkpoints.contains(&tick.remaining) {
                    self.escalate();
                }
            }
            SessionTask::Spawn => {
                if !self.spawner.claim(fired.id) {
                    return;
                }
                let batch = self
                    .spawner
                    .spawn(self.config.viewport.width, self.difficulty.fall_speed);
                log::trace!("spawned {} #{}", batch.item.label, batch.item.id);
                self.items.push(batch.item);
                for delay in batch.follow_ups {
                    self.scheduler.schedule_in(
                        delay,
                        SessionTask::Burst {
                            archetype: batch.archetype,
                        },
                    );
                }
                let delay = self.spawner.next_delay(self.difficulty.spawn_interval_ms);
                self.spawner.arm(&mut self.scheduler, delay, SessionTask::Spawn);
            }
            SessionTask::Burst { archetype } => {
                if let Some(item) = self.spawner.spawn_archetype(
                    archetype,
                    self.config.viewport.width,
                    self.difficulty.fall_speed,
                ) {
                    self.items.push(item);
                }
            }
        }
    }

    /// Step difficulty up once; live items adopt the new speed immediately
    fn escalate(&mut self) {
        let d = &self.config.difficulty;
        self.difficulty.spawn_interval_ms =
            (self.difficulty.spawn_interval_ms - d.spawn_interval_step_ms).max(d.min_spawn_interval_ms);
        self.difficulty.fall_speed = (self.difficulty.fall_speed + d.fall_speed_step).min(d.max_fall_speed);
        self.difficulty.escalations += 1;

        let speed = self.difficulty.fall_speed;
        for item in &mut self.items {
            item.set_speed(speed);
        }
        log::info!(
            "Difficulty up: spawn every {}ms, fall speed {}",
            self.difficulty.spawn_interval_ms,
            speed
        );
        self.events.push(SessionEvent::DifficultyIncreased {
            spawn_interval_ms: self.difficulty.spawn_interval_ms,
            fall_speed: speed,
        });
    }

    // --- Frame update ---

    /// Run due timers, then step one frame
    pub fn frame(&mut self, now_ms: f64, input: &FrameInput) {
        self.run_timers(now_ms);
        self.update(input);
    }

    /// One frame: move the basket, then advance, collide, and cull items in
    /// spawn order. No-op unless running.
    pub fn update(&mut self, input: &FrameInput) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.apply_input(input);

        let policy = self.config.collision;
        let height = self.config.viewport.height;
        let mut i = 0;
        while i < self.items.len() {
            let item = &mut self.items[i];
            item.advance();
            if item.overlaps(&self.basket, policy) {
                let item = self.items.remove(i);
                self.collect(item);
                if self.phase != SessionPhase::Running {
                    return;
                }
            } else if item.is_out_of_bounds(height) {
                self.items.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn apply_input(&mut self, input: &FrameInput) {
        if input.left {
            self.basket.move_left();
        }
        if input.right {
            self.basket.move_right();
        }
        if let Some(x) = input.pointer_x {
            match self.config.pointer {
                PointerTracking::Direct => self.basket.center_on(x),
                PointerTracking::Step { deadzone } => self.basket.step_toward(x, deadzone),
            }
        }
    }

    fn collect(&mut self, item: FallingItem) {
        log::debug!("collected {} ({})", item.label, item.category.as_str());
        match item.category.scoring_rule(&self.config.scoring) {
            ScoringRule::Add => self.award(item, 1, 0),
            ScoringRule::Double => self.award(item, 2, 0),
            ScoringRule::AddWithBonus { cap } => {
                let bonus = self.rng.random_range(0..=cap);
                self.award(item, 1, bonus);
            }
            ScoringRule::Hazard => {
                let limit = self.tracker.add_hazard();
                self.events.push(SessionEvent::HazardHit {
                    count: self.tracker.hazards(),
                    max: self.tracker.max_hazards(),
                });
                if limit {
                    let now = self.scheduler.now();
                    self.finalize(EndReason::HazardLimit, now);
                }
            }
            ScoringRule::Steal { amount } => {
                let level = self.tracker.level();
                let stolen = self.tracker.steal(amount);
                self.events.push(SessionEvent::Stolen { amount: stolen });
                self.events.push(SessionEvent::ScoreChanged {
                    score: self.tracker.score(),
                });
                if self.tracker.level() != level {
                    self.events.push(SessionEvent::LevelChanged {
                        level: self.tracker.level(),
                    });
                }
            }
        }
    }

    fn award(&mut self, item: FallingItem, multiplier: u32, bonus: u32) {
        let points = item.points.saturating_mul(multiplier).saturating_add(bonus);
        let level = self.tracker.add_score(points);
        self.events.push(SessionEvent::Collected {
            category: item.category,
            label: item.label,
            points,
        });
        self.events.push(SessionEvent::ScoreChanged {
            score: self.tracker.score(),
        });
        if let Some(level) = level {
            log::info!("Level {level}");
            self.events.push(SessionEvent::LevelChanged { level });
        }
    }

    /// Enter the ended phase and build the result. Runs at most once.
    fn finalize(&mut self, reason: EndReason, now_ms: f64) {
        if self.phase == SessionPhase::Ended {
            return;
        }
        self.disarm_timers();
        self.phase = SessionPhase::Ended;

        let remaining_secs = self.clock.remaining();
        let base_score = self.tracker.score();
        let time_bonus = remaining_secs.saturating_mul(self.config.scoring.time_bonus_per_second);
        let started_at = self.started_at.unwrap_or(now_ms);
        let result = SessionResult {
            id: format!("game_{}_{:08x}", now_ms as u64, self.rng.random::<u32>()),
            player_id: self
                .player
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
            score: base_score.saturating_add(time_bonus),
            hazard_count: self.tracker.hazards(),
            played_at: now_ms,
            duration_ms: (now_ms - started_at).max(0.0),
        };
        log::info!(
            "Session ended ({reason}): {} + {} time bonus = {}",
            base_score,
            time_bonus,
            result.score
        );

        let summary = EndSummary {
            reason,
            base_score,
            time_bonus,
            level: self.tracker.level(),
            remaining_secs,
            result,
        };
        self.summary = Some(summary.clone());
        self.events.push(SessionEvent::Ended(summary));
    }

    // --- Accessors ---

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> Option<&PlayerRecord> {
        self.player.as_ref()
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn basket(&self) -> &Basket {
        &self.basket
    }

    pub fn score(&self) -> u32 {
        self.tracker.score()
    }

    pub fn hazards(&self) -> u32 {
        self.tracker.hazards()
    }

    pub fn level(&self) -> u32 {
        self.tracker.level()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Live timers (clock tick, spawn, burst follow-ups)
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn summary(&self) -> Option<&EndSummary> {
        self.summary.as_ref()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.summary.as_ref().map(|s| &s.result)
    }

    /// Place an item directly (scripted scenes and tests)
    pub fn insert_item(&mut self, item: FallingItem) {
        self.items.push(item);
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerRecord {
        PlayerRecord::new("Tester", 5, 0.0)
    }

    fn quiet_config() -> GameConfig {
        // Spawns effectively never fire during short tests
        let mut config = GameConfig::default();
        config.difficulty.base_spawn_interval_ms = 1.0e9;
        config.difficulty.min_spawn_interval_ms = 1.0e9;
        config.spawn.burst = None;
        config
    }

    fn started(config: GameConfig) -> Session {
        let mut s = Session::new(config, Some(player()), 1).unwrap();
        s.start(0.0).unwrap();
        s.drain_events();
        s
    }

    /// An item of `category` already overlapping the default basket after one advance
    fn item_over_basket(id: u32, category: ItemCategory, points: u32) -> FallingItem {
        FallingItem::new(id, Vec2::new(375.0, 500.0), Vec2::splat(50.0), category, "test", points, 2.0)
    }

    #[test]
    fn test_start_requires_player() {
        let mut s = Session::new(GameConfig::default(), None, 1).unwrap();
        assert_eq!(s.start(0.0), Err(SessionError::NoPlayer));
        assert_eq!(s.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut s = Session::new(GameConfig::default(), Some(player()), 1).unwrap();
        assert!(matches!(s.pause(0.0), Err(SessionError::InvalidTransition { .. })));
        assert!(matches!(s.end(0.0), Err(SessionError::InvalidTransition { .. })));
        s.start(0.0).unwrap();
        assert!(matches!(s.start(0.0), Err(SessionError::InvalidTransition { .. })));
        assert!(matches!(s.resume(0.0), Err(SessionError::InvalidTransition { .. })));
        s.end(10.0).unwrap();
        assert!(matches!(s.toggle_pause(20.0), Err(SessionError::InvalidTransition { .. })));
        assert!(matches!(s.end(20.0), Err(SessionError::InvalidTransition { .. })));
    }

    #[test]
    fn test_first_spawn_is_immediate() {
        let mut s = Session::new(GameConfig::default(), Some(player()), 9).unwrap();
        s.start(1000.0).unwrap();
        assert!(s.items().is_empty());
        s.run_timers(1000.0);
        assert_eq!(s.items().len(), 1);
        assert_eq!(s.items()[0].pos.y, -50.0);
    }

    #[test]
    fn test_scoring_rules() {
        let mut s = started(quiet_config());
        s.insert_item(item_over_basket(1, ItemCategory::Standard, 10));
        s.update(&FrameInput::default());
        assert_eq!(s.score(), 10);

        s.insert_item(item_over_basket(2, ItemCategory::Bonus, 50));
        s.update(&FrameInput::default());
        assert_eq!(s.score(), 110);

        s.insert_item(item_over_basket(3, ItemCategory::Festive, 15));
        s.update(&FrameInput::default());
        assert!((125..=135).contains(&s.score()));

        let before = s.score();
        s.insert_item(item_over_basket(4, ItemCategory::Thief, 0));
        s.update(&FrameInput::default());
        assert_eq!(s.score(), before - 50);
        assert!(s.items().is_empty());
    }

    #[test]
    fn test_thief_never_goes_negative() {
        let mut s = started(quiet_config());
        s.insert_item(item_over_basket(1, ItemCategory::Standard, 20));
        s.insert_item(item_over_basket(2, ItemCategory::Thief, 0));
        s.update(&FrameInput::default());
        assert_eq!(s.score(), 0);
        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::Stolen { amount: 20 }));
    }

    #[test]
    fn test_items_fall_and_cull() {
        let mut s = started(quiet_config());
        s.insert_item(FallingItem::new(
            1,
            Vec2::new(0.0, 599.0),
            Vec2::splat(50.0),
            ItemCategory::Standard,
            "far left",
            10,
            2.0,
        ));
        s.update(&FrameInput::default());
        assert!(s.items().is_empty());
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_input_moves_basket() {
        let mut s = started(quiet_config());
        s.update(&FrameInput { left: true, ..Default::default() });
        assert_eq!(s.basket().pos.x, 355.0);
        s.update(&FrameInput {
            pointer_x: Some(100.0),
            ..Default::default()
        });
        assert_eq!(s.basket().pos.x, 60.0);

        let mut config = quiet_config();
        config.pointer = PointerTracking::Step { deadzone: 10.0 };
        let mut s = started(config);
        s.update(&FrameInput {
            pointer_x: Some(100.0),
            ..Default::default()
        });
        assert_eq!(s.basket().pos.x, 355.0);
    }

    #[test]
    fn test_processing_stops_once_ended() {
        let mut config = quiet_config();
        config.max_hazards = 1;
        let mut s = started(config);
        s.insert_item(item_over_basket(1, ItemCategory::Hazard, 0));
        s.insert_item(item_over_basket(2, ItemCategory::Standard, 10));
        s.update(&FrameInput::default());
        assert_eq!(s.phase(), SessionPhase::Ended);
        assert_eq!(s.score(), 0);
        // The second item was never visited
        assert_eq!(s.items().len(), 1);
        assert_eq!(s.items()[0].pos.y, 500.0);
    }

    #[test]
    fn test_end_finalizes_once_with_time_bonus() {
        let mut s = started(quiet_config());
        s.insert_item(item_over_basket(1, ItemCategory::Standard, 20));
        s.update(&FrameInput::default());
        s.run_timers(10_500.0);
        assert_eq!(s.remaining_secs(), 50);
        s.end(10_500.0).unwrap();

        let summary = s.summary().unwrap().clone();
        assert_eq!(summary.reason, EndReason::Quit);
        assert_eq!(summary.base_score, 20);
        assert_eq!(summary.time_bonus, 100);
        assert_eq!(summary.result.score, 120);
        assert_eq!(summary.result.duration_ms, 10_500.0);
        assert_eq!(summary.result.player_id, player().id);

        let ended = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::Ended(_)))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(s.pending_timers(), 0);
        s.run_timers(1.0e7);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_end_reason_messages_are_distinct() {
        let messages = [EndReason::TimeUp, EndReason::HazardLimit, EndReason::Quit].map(|r| r.to_string());
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn test_toggle_pause() {
        let mut s = started(quiet_config());
        assert_eq!(s.toggle_pause(100.0), Ok(SessionPhase::Paused));
        assert_eq!(s.toggle_pause(200.0), Ok(SessionPhase::Running));
        let events = s.drain_events();
        assert_eq!(events, vec![SessionEvent::Paused, SessionEvent::Resumed]);
    }

    #[test]
    fn test_update_is_frozen_while_paused() {
        let mut s = started(quiet_config());
        s.insert_item(item_over_basket(1, ItemCategory::Standard, 10));
        s.pause(0.0).unwrap();
        s.frame(5_000.0, &FrameInput { left: true, ..Default::default() });
        assert_eq!(s.items()[0].pos.y, 500.0);
        assert_eq!(s.basket().pos.x, 360.0);
        assert_eq!(s.remaining_secs(), 60);
    }
}
