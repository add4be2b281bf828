//! Application controller
//!
//! Owns the current player, the persistence collaborator, and at most one
//! live `Session`. Session events are forwarded to a `GameObserver` (the UI)
//! after each call, and the round result is handed to persistence when the
//! single `Ended` event goes by.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::highscores::{self, GenerationStats, Leaderboard, MAX_RANKINGS, PlayerStats};
use crate::persistence::{
    KvStore, MAX_GENERATION, MIN_GENERATION, Persistence, PersistenceError, PlayerRecord,
};
use crate::settings::{ConfigError, GameConfig};
use crate::sim::{FrameInput, Session, SessionAction, SessionError, SessionEvent, SessionPhase};

/// Receives lifecycle and display updates
pub trait GameObserver {
    fn on_event(&mut self, _event: &SessionEvent) {}
    fn on_player_changed(&mut self, _player: Option<&PlayerRecord>) {}
}

impl GameObserver for () {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    EmptyName,
    InvalidGeneration(u32),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "please enter your name"),
            Self::InvalidGeneration(g) => write!(
                f,
                "generation {g} is not valid ({MIN_GENERATION}-{MAX_GENERATION})"
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

#[derive(Debug)]
pub enum GameError {
    Session(SessionError),
    Persistence(PersistenceError),
    Config(ConfigError),
    Registration(RegistrationError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "{e}"),
            Self::Persistence(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Registration(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            Self::Persistence(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Registration(e) => Some(e),
        }
    }
}

impl From<SessionError> for GameError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<PersistenceError> for GameError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

impl From<ConfigError> for GameError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RegistrationError> for GameError {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

pub struct Game<S, O> {
    config: GameConfig,
    persistence: Persistence<S>,
    observer: O,
    player: Option<PlayerRecord>,
    session: Option<Session>,
    seeds: Pcg32,
}

impl<S: KvStore, O: GameObserver> Game<S, O> {
    /// Validate the config and restore the stored current player, if any
    pub fn new(config: GameConfig, store: S, observer: O, seed: u64) -> Result<Self, GameError> {
        config.validate()?;
        let persistence = Persistence::new(store);
        let player = persistence.current_player()?;
        let mut game = Self {
            config,
            persistence,
            observer,
            player,
            session: None,
            seeds: Pcg32::seed_from_u64(seed),
        };
        if let Some(player) = &game.player {
            log::info!("Welcome back, {}!", player.name);
        }
        game.observer.on_player_changed(game.player.as_ref());
        Ok(game)
    }

    /// Create a player and make it current
    pub fn register_player(
        &mut self,
        name: &str,
        generation: u32,
        now_ms: f64,
    ) -> Result<PlayerRecord, GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistrationError::EmptyName.into());
        }
        if !(MIN_GENERATION..=MAX_GENERATION).contains(&generation) {
            return Err(RegistrationError::InvalidGeneration(generation).into());
        }

        let player = PlayerRecord::new(name, generation, now_ms);
        self.persistence.save_player(&player)?;
        self.persistence.set_current_player(&player)?;
        log::info!("Registered {} (generation {})", player.name, player.generation);
        self.player = Some(player.clone());
        self.observer.on_player_changed(self.player.as_ref());
        Ok(player)
    }

    /// Begin a fresh round for the current player
    pub fn start_session(&mut self, now_ms: f64) -> Result<(), GameError> {
        if let Some(phase) = self.active_phase() {
            return Err(SessionError::InvalidTransition {
                phase,
                action: SessionAction::Start,
            }
            .into());
        }
        let Some(player) = self.player.clone() else {
            return Err(SessionError::NoPlayer.into());
        };
        let mut session = Session::new(self.config.clone(), Some(player), self.seeds.random())?;
        session.start(now_ms)?;
        self.session = Some(session);
        self.flush()
    }

    /// Per-frame entry point
    pub fn frame(&mut self, now_ms: f64, input: &FrameInput) -> Result<(), GameError> {
        if let Some(session) = self.session.as_mut() {
            session.frame(now_ms, input);
        }
        self.flush()
    }

    pub fn pause(&mut self, now_ms: f64) -> Result<(), GameError> {
        self.with_session(SessionAction::Pause, |s| s.pause(now_ms))
    }

    pub fn resume(&mut self, now_ms: f64) -> Result<(), GameError> {
        self.with_session(SessionAction::Resume, |s| s.resume(now_ms))
    }

    pub fn toggle_pause(&mut self, now_ms: f64) -> Result<(), GameError> {
        self.with_session(SessionAction::Pause, |s| s.toggle_pause(now_ms).map(|_| ()))
    }

    /// Quit the current round
    pub fn end_session(&mut self, now_ms: f64) -> Result<(), GameError> {
        self.with_session(SessionAction::End, |s| s.end(now_ms))
    }

    fn with_session(
        &mut self,
        action: SessionAction,
        f: impl FnOnce(&mut Session) -> Result<(), SessionError>,
    ) -> Result<(), GameError> {
        let Some(session) = self.session.as_mut() else {
            return Err(SessionError::InvalidTransition {
                phase: SessionPhase::NotStarted,
                action,
            }
            .into());
        };
        let outcome = f(session);
        let flushed = self.flush();
        outcome?;
        flushed
    }

    /// Forward queued session events; persist the result on `Ended`
    fn flush(&mut self) -> Result<(), GameError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let mut saved = Ok(());
        for event in session.drain_events() {
            if let SessionEvent::Ended(summary) = &event {
                if let Err(e) = self.persistence.save_result(&summary.result) {
                    log::error!("Could not save result {}: {e}", summary.result.id);
                    saved = Err(e);
                }
            }
            self.observer.on_event(&event);
        }
        saved.map_err(GameError::from)
    }

    fn active_phase(&self) -> Option<SessionPhase> {
        self.session
            .as_ref()
            .map(Session::phase)
            .filter(|p| matches!(p, SessionPhase::Running | SessionPhase::Paused))
    }

    // --- Statistics ---

    pub fn leaderboard(&self) -> Result<Leaderboard, GameError> {
        let players = self.persistence.all_players()?;
        let results = self.persistence.all_results()?;
        Ok(Leaderboard::from_records(&players, &results, MAX_RANKINGS))
    }

    /// Current player's history, None without a player
    pub fn player_stats(&self) -> Result<Option<PlayerStats>, GameError> {
        let Some(player) = &self.player else {
            return Ok(None);
        };
        let results = self.persistence.all_results()?;
        Ok(Some(highscores::player_stats(&player.id, &results)))
    }

    pub fn generation_stats(&self) -> Result<Vec<GenerationStats>, GameError> {
        let players = self.persistence.all_players()?;
        let results = self.persistence.all_results()?;
        Ok(highscores::generation_stats(&players, &results))
    }

    /// Erase all stored data and forget the current player and session
    pub fn reset_all_data(&mut self) -> Result<(), GameError> {
        self.session = None;
        self.persistence.clear_all()?;
        self.player = None;
        self.observer.on_player_changed(None);
        Ok(())
    }

    // --- Accessors ---

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> Option<&PlayerRecord> {
        self.player.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}
