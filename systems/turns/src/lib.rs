#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round-robin turn scheduling for human players and tool-driven agents.
//!
//! The scheduler owns an ordered list of actors and hands each one exclusive
//! mutable access to the world for the duration of its turn. Turns never
//! overlap: the next actor starts only once the previous turn future has
//! resolved or timed out.

mod agent;
mod player;

pub use agent::{
    AgentActor, AgentConfig, AgentPhase, DecisionFuture, DecisionSource, Observation,
    ScriptedDecisionSource, DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_EXCHANGES,
};
pub use player::{PendingTarget, PlayerActor, PlayerInput};

use std::{future::Future, pin::Pin, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use turngrid_core::{Command, Event};
use turngrid_world::{self as world, World};

/// Future returned by [`TurnActor::execute_turn`].
pub type TurnFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Participant that takes turns in the scheduler's rotation.
pub trait TurnActor: Send {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Prepares the actor before its first turn.
    fn initialize(&mut self, world: &mut World);

    /// Plays one turn with exclusive access to the world, recording each
    /// action in `report` as soon as it takes effect.
    ///
    /// The future may suspend between actions but must leave the world and
    /// the report consistent at every suspension point, since it can be
    /// dropped there when the turn times out.
    fn execute_turn<'a>(
        &'a mut self,
        world: &'a mut World,
        report: &'a mut TurnReport,
    ) -> TurnFuture<'a>;
}

/// Summary of one completed turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnReport {
    /// Name of the actor that played the turn.
    pub actor: String,
    /// Round the turn belonged to.
    pub round: u64,
    /// Actions that took effect.
    pub actions_taken: u32,
    /// Events emitted while the turn was played.
    pub events: Vec<Event>,
    /// Whether the turn was cut short by the scheduler's timeout.
    pub timed_out: bool,
}

impl TurnReport {
    /// Creates an empty report for `actor`.
    #[must_use]
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            ..Self::default()
        }
    }
}

/// Tunables of the scheduler, loadable from scenario files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound for a single turn in milliseconds. Turns are unbounded when absent.
    pub turn_timeout_ms: Option<u64>,
}

impl SchedulerConfig {
    /// Timeout applied to every turn.
    #[must_use]
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_ms.map(Duration::from_millis)
    }
}

/// Failures of the scheduler itself.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The rotation has nobody to schedule.
    #[error("no actors are registered with the scheduler")]
    NoActors,
}

/// Runs actors one after another in registration order.
pub struct TurnScheduler {
    actors: Vec<Box<dyn TurnActor>>,
    current_index: usize,
    round: u64,
    initialized: bool,
    config: SchedulerConfig,
}

impl TurnScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            actors: Vec::new(),
            current_index: 0,
            round: 0,
            initialized: false,
            config,
        }
    }

    /// Appends an actor to the end of the rotation.
    pub fn add_actor(&mut self, actor: Box<dyn TurnActor>) {
        debug!("scheduling {}", actor.name());
        self.actors.push(actor);
    }

    /// Number of actors in the rotation.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Rounds started so far.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Position of the actor that plays next.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Name of the actor that plays next.
    #[must_use]
    pub fn current_actor_name(&self) -> Option<&str> {
        self.actors
            .get(self.current_index)
            .map(|actor| actor.name())
    }

    /// Initializes every actor once. Called implicitly before the first turn.
    pub fn initialize(&mut self, world: &mut World) {
        if self.initialized {
            return;
        }
        for actor in &mut self.actors {
            actor.initialize(world);
        }
        self.initialized = true;
        info!("turn system ready with {} actors", self.actors.len());
    }

    /// Plays the next turn in the rotation.
    ///
    /// The first turn of each round advances the world clock.
    pub async fn run_turn(&mut self, world: &mut World) -> Result<TurnReport, SchedulerError> {
        if self.actors.is_empty() {
            return Err(SchedulerError::NoActors);
        }
        self.initialize(world);

        let mut round_events = Vec::new();
        if self.current_index == 0 {
            self.round += 1;
            info!("Current turn: {}", self.round);
            world::apply(world, Command::Tick, &mut round_events);
        }

        let timeout = self.config.turn_timeout();
        let round = self.round;
        let actor = self
            .actors
            .get_mut(self.current_index)
            .ok_or(SchedulerError::NoActors)?;
        let name = actor.name().to_owned();
        debug!("{name} starts its turn");

        let mut report = TurnReport {
            round,
            events: round_events,
            ..TurnReport::new(name.as_str())
        };
        let turn = actor.execute_turn(world, &mut report);
        match timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, turn).await.is_err() {
                    warn!("{name} ran out of time after {} ms", limit.as_millis());
                    report.timed_out = true;
                }
            }
            None => turn.await,
        }

        self.current_index = (self.current_index + 1) % self.actors.len();
        Ok(report)
    }

    /// Plays `rounds` full rotations and returns every turn's report.
    pub async fn run_rounds(
        &mut self,
        world: &mut World,
        rounds: u64,
    ) -> Result<Vec<TurnReport>, SchedulerError> {
        let mut reports = Vec::new();
        let target = self.round + rounds;
        loop {
            if self.current_index == 0 && self.round >= target {
                return Ok(reports);
            }
            reports.push(self.run_turn(world).await?);
        }
    }

    /// Plays turns forever. Returns only when there is nobody to schedule.
    pub async fn run(&mut self, world: &mut World) -> Result<(), SchedulerError> {
        loop {
            let report = self.run_turn(world).await?;
            debug!(
                "{} finished turn in round {} with {} actions",
                report.actor, report.round, report.actions_taken
            );
        }
    }
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{SchedulerConfig, SchedulerError, TurnActor, TurnFuture, TurnReport, TurnScheduler};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use turngrid_core::Event;
    use turngrid_world::World;

    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
        pause: Duration,
        initialized: bool,
    }

    impl Recorder {
        fn boxed(name: &str, log: &Arc<Mutex<Vec<String>>>, pause: Duration) -> Box<Self> {
            Box::new(Self {
                name: name.to_owned(),
                log: Arc::clone(log),
                pause,
                initialized: false,
            })
        }
    }

    impl TurnActor for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn initialize(&mut self, _world: &mut World) {
            self.initialized = true;
        }

        fn execute_turn<'a>(
            &'a mut self,
            _world: &'a mut World,
            report: &'a mut TurnReport,
        ) -> TurnFuture<'a> {
            Box::pin(async move {
                assert!(self.initialized, "turns start after initialization");
                tokio::time::sleep(self.pause).await;
                self.log.lock().expect("log").push(self.name.clone());
                report.actions_taken += 1;
            })
        }
    }

    #[tokio::test]
    async fn empty_rotation_is_an_error() {
        let mut world = World::new();
        let mut scheduler = TurnScheduler::default();
        assert_eq!(
            scheduler.run_turn(&mut world).await,
            Err(SchedulerError::NoActors)
        );
        assert_eq!(scheduler.run(&mut world).await, Err(SchedulerError::NoActors));
    }

    #[tokio::test(start_paused = true)]
    async fn actors_take_turns_in_order_and_rounds_tick_the_clock() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut world = World::new();
        let mut scheduler = TurnScheduler::default();
        scheduler.add_actor(Recorder::boxed("a", &log, Duration::from_millis(5)));
        scheduler.add_actor(Recorder::boxed("b", &log, Duration::ZERO));

        let reports = scheduler
            .run_rounds(&mut world, 2)
            .await
            .expect("rotation has actors");

        assert_eq!(*log.lock().expect("log"), ["a", "b", "a", "b"]);
        assert_eq!(scheduler.round(), 2);
        assert_eq!(scheduler.current_index(), 0);
        assert_eq!(reports[0].events, vec![Event::TimeAdvanced { tick: 1 }]);
        assert!(reports[1].events.is_empty());
        assert_eq!(reports[2].round, 2);
        assert_eq!(turngrid_world::query::clock(&world), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_turns_are_cut_off() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut world = World::new();
        let mut scheduler = TurnScheduler::new(SchedulerConfig {
            turn_timeout_ms: Some(50),
        });
        scheduler.add_actor(Recorder::boxed("slow", &log, Duration::from_secs(10)));
        scheduler.add_actor(Recorder::boxed("quick", &log, Duration::from_millis(1)));

        let slow = scheduler.run_turn(&mut world).await.expect("slow turn");
        assert!(slow.timed_out);
        assert_eq!(slow.actor, "slow");
        assert_eq!(slow.actions_taken, 0);
        assert_eq!(slow.events, vec![Event::TimeAdvanced { tick: 1 }]);
        assert_eq!(scheduler.current_actor_name(), Some("quick"));

        let quick = scheduler.run_turn(&mut world).await.expect("quick turn");
        assert!(!quick.timed_out);
        assert_eq!(quick.actions_taken, 1);
        assert_eq!(*log.lock().expect("log"), ["quick"]);
    }
}
