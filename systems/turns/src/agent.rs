use std::{collections::VecDeque, future::Future, pin::Pin, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use turngrid_core::{ElementId, ElementSnapshot, ItemType, ViewDirection};
use turngrid_system_actions::{ToolCall, ToolDispatcher, ToolResponse};
use turngrid_world::{query, vision, MapElement, World};

use crate::{TurnActor, TurnFuture, TurnReport};

/// Decision rounds an agent gets per turn unless configured otherwise.
pub const DEFAULT_MAX_EXCHANGES: u32 = 3;

/// History entries included in an observation unless configured otherwise.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Future returned by [`DecisionSource::decide`].
pub type DecisionFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<Vec<ToolCall>>> + Send + 'a>>;

/// Produces tool calls for an agent, typically by prompting a language model.
pub trait DecisionSource: Send {
    /// Chooses the next tool calls from what the agent perceives and the
    /// responses to its previous calls. An empty list ends the turn.
    fn decide<'a>(
        &'a mut self,
        observation: &'a Observation,
        previous: &'a [ToolResponse],
    ) -> DecisionFuture<'a>;
}

/// Where an agent is within its turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AgentPhase {
    /// Not playing.
    #[default]
    Idle,
    /// Waiting for the decision source.
    AwaitingDecision,
    /// Running the tool calls it returned.
    ExecutingTools,
    /// Turn finished.
    Done,
}

/// Agent tunables, loadable from scenario files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Decision rounds per turn.
    pub max_exchanges: u32,
    /// History entries included in each observation.
    pub history_window: usize,
    /// Pause after most tool calls, in milliseconds.
    pub tool_delay_ms: u64,
    /// Pause after the agent talks, in milliseconds.
    pub talk_delay_ms: u64,
}

impl AgentConfig {
    /// Pause that follows a call to `tool`.
    #[must_use]
    pub fn delay_for(&self, tool: &str) -> Duration {
        match tool {
            "talk" => Duration::from_millis(self.talk_delay_ms),
            _ => Duration::from_millis(self.tool_delay_ms),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_exchanges: DEFAULT_MAX_EXCHANGES,
            history_window: DEFAULT_HISTORY_WINDOW,
            tool_delay_ms: 10,
            talk_delay_ms: 3000,
        }
    }
}

/// What a character knows about itself and its surroundings at one moment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// World clock when the observation was taken.
    pub clock: u64,
    /// The observing character.
    pub me: ElementSnapshot,
    /// Current health.
    pub health: i32,
    /// Health ceiling.
    pub max_health: i32,
    /// Way the character is facing.
    pub facing: ViewDirection,
    /// Item types carried.
    pub inventory: Vec<ItemType>,
    /// Other elements sharing the character's cell.
    pub here: Vec<ElementSnapshot>,
    /// Elements within vision range, nearest rings first.
    pub visible: Vec<ElementSnapshot>,
    /// Latest entries of the character's interaction history, oldest first.
    pub recent_history: Vec<String>,
}

impl Observation {
    /// Observes the world through the eyes of the character `id`.
    #[must_use]
    pub fn capture(world: &World, id: ElementId, history_window: usize) -> Option<Self> {
        let character = query::character(world, id)?;
        let element = query::element(world, id)?;

        let here = query::elements_at(world, element.coordinate())
            .filter(|other| other.id() != id)
            .map(query::snapshot)
            .collect();
        let visible = vision::element_vision(world, id)
            .map(|result| result.visible_elements)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|other| query::element(world, other))
            .map(query::snapshot)
            .collect();

        Some(Self {
            clock: query::clock(world),
            me: query::snapshot(element),
            health: character.health(),
            max_health: character.max_health(),
            facing: character.facing(),
            inventory: character.inventory().item_types(),
            here,
            visible,
            recent_history: character
                .context()
                .recent_interactions(history_window)
                .to_vec(),
        })
    }

    /// Renders the observation as pretty-printed JSON for a prompt.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Character whose turns are decided by a [`DecisionSource`] through tool calls.
pub struct AgentActor<D> {
    id: ElementId,
    name: String,
    source: D,
    config: AgentConfig,
    dispatcher: ToolDispatcher,
    phase: AgentPhase,
    last_responses: Vec<ToolResponse>,
}

impl<D: DecisionSource> AgentActor<D> {
    /// Creates an agent controlling the character `id`.
    #[must_use]
    pub fn new(id: ElementId, name: impl Into<String>, source: D, config: AgentConfig) -> Self {
        Self {
            id,
            name: name.into(),
            source,
            config,
            dispatcher: ToolDispatcher::new(id),
            phase: AgentPhase::Idle,
            last_responses: Vec::new(),
        }
    }

    /// Character controlled by the agent.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> AgentPhase {
        self.phase
    }

    /// Responses produced by the final exchange of the last turn.
    #[must_use]
    pub fn last_responses(&self) -> &[ToolResponse] {
        &self.last_responses
    }

    /// Decision source driving the agent.
    #[must_use]
    pub const fn source(&self) -> &D {
        &self.source
    }

    async fn play(&mut self, world: &mut World, report: &mut TurnReport) {
        let mut previous = Vec::new();

        for exchange in 0..self.config.max_exchanges {
            let Some(observation) = Observation::capture(world, self.id, self.config.history_window)
            else {
                warn!("{} has no character, skipping turn", self.name);
                break;
            };

            self.phase = AgentPhase::AwaitingDecision;
            let calls = match self.source.decide(&observation, &previous).await {
                Ok(calls) => calls,
                Err(error) => {
                    warn!("{} could not decide: {error:#}", self.name);
                    break;
                }
            };
            if calls.is_empty() {
                debug!("{} passes after {exchange} exchanges", self.name);
                break;
            }

            self.phase = AgentPhase::ExecutingTools;
            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                let response = self.dispatcher.execute(world, call, &mut report.events);
                info!("{} -> {}: {}", self.name, call.name, response.content);
                if response.success {
                    report.actions_taken += 1;
                }
                responses.push(response);
                tokio::time::sleep(self.config.delay_for(&call.name)).await;
            }
            previous = responses;
        }

        self.last_responses = previous;
    }
}

impl<D: DecisionSource> TurnActor for AgentActor<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, world: &mut World) {
        if query::character(world, self.id).is_none() {
            warn!("{} controls {} which is not on the map", self.name, self.id);
        }
        self.phase = AgentPhase::Idle;
        self.last_responses.clear();
    }

    fn execute_turn<'a>(
        &'a mut self,
        world: &'a mut World,
        report: &'a mut TurnReport,
    ) -> TurnFuture<'a> {
        Box::pin(async move {
            self.play(world, report).await;
            self.phase = AgentPhase::Done;
        })
    }
}

/// Decision source replaying prepared tool calls, one batch per exchange.
#[derive(Debug, Default)]
pub struct ScriptedDecisionSource {
    script: VecDeque<Vec<ToolCall>>,
    observations: Vec<Observation>,
    feedback: Vec<Vec<ToolResponse>>,
}

impl ScriptedDecisionSource {
    /// Creates a source that returns `batches` in order, then nothing.
    #[must_use]
    pub fn new(batches: impl IntoIterator<Item = Vec<ToolCall>>) -> Self {
        Self {
            script: batches.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Observations received so far.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Previous-call responses received alongside each observation.
    #[must_use]
    pub fn feedback(&self) -> &[Vec<ToolResponse>] {
        &self.feedback
    }

    /// Batches not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn decide<'a>(
        &'a mut self,
        observation: &'a Observation,
        previous: &'a [ToolResponse],
    ) -> DecisionFuture<'a> {
        Box::pin(async move {
            self.observations.push(observation.clone());
            self.feedback.push(previous.to_vec());
            Ok(self.script.pop_front().unwrap_or_default())
        })
    }
}
