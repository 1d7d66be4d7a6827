use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use turngrid_core::{Command, ElementBlueprint, ElementId, Event, GameRules, GridConfiguration};
use turngrid_system_actions::{parse_tool_call, ToolCall};
use turngrid_system_turns::{
    AgentActor, AgentConfig, PlayerActor, PlayerInput, SchedulerConfig, ScriptedDecisionSource,
    TurnScheduler,
};
use turngrid_world::{self as world, query, MapElement, World};

use crate::{layout_transfer::MapLayout, wander::WanderingDecisionSource};

/// Scenario used when no file is given on the command line.
pub(crate) const DEFAULT_SCENARIO: &str = include_str!("../scenarios/village.toml");

/// Tool name that ends a scripted player's turn.
const END_TURN: &str = "end_turn";

/// Everything needed to set up a game: map, rules and who controls whom.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Scenario {
    /// Geometry of the map.
    pub grid: GridConfiguration,
    /// Limits for attacks, speech, gifts and action points.
    pub rules: GameRules,
    /// Turn timeout.
    pub scheduler: SchedulerConfig,
    /// Settings shared by every agent.
    pub agent: AgentConfig,
    /// Elements placed on the map, in registration order.
    pub elements: Vec<ElementBlueprint>,
    /// Turn order.
    pub actors: Vec<ActorSpec>,
}

/// Controller bound to one character of the scenario.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "controller", rename_all = "snake_case")]
pub(crate) enum ActorSpec {
    /// Human player whose inputs are replayed from the scenario.
    Player {
        character: ElementId,
        #[serde(default)]
        inputs: Vec<ScriptedTool>,
    },
    /// Agent that picks a random plausible action each turn.
    Wander { character: ElementId },
    /// Agent that performs the listed calls, one per exchange.
    Script {
        character: ElementId,
        #[serde(default)]
        calls: Vec<ScriptedTool>,
    },
}

impl ActorSpec {
    fn character(&self) -> ElementId {
        match self {
            Self::Player { character, .. }
            | Self::Wander { character }
            | Self::Script { character, .. } => *character,
        }
    }
}

/// Tool invocation written out in a scenario file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct ScriptedTool {
    /// Name of the tool.
    pub tool: String,
    /// Named arguments, as the tool catalog describes them.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ScriptedTool {
    fn to_call(&self, id: String) -> ToolCall {
        ToolCall {
            id,
            name: self.tool.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses scenario TOML.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }

    /// Replaces the grid and elements with a shared layout.
    pub(crate) fn adopt_layout(&mut self, layout: MapLayout) {
        self.grid = layout.grid;
        self.elements = layout.elements;
    }

    /// The scenario's grid and elements as a shareable layout.
    pub(crate) fn layout(&self) -> MapLayout {
        MapLayout {
            grid: self.grid,
            elements: self.elements.clone(),
        }
    }

    /// Creates the world described by the scenario.
    pub(crate) fn build_world(&self, out_events: &mut Vec<Event>) -> World {
        let mut world = World::with_configuration(self.grid);
        world::apply(
            &mut world,
            Command::ConfigureRules { rules: self.rules },
            out_events,
        );
        for blueprint in &self.elements {
            let before = out_events.len();
            world::apply(
                &mut world,
                Command::RegisterElement {
                    blueprint: blueprint.clone(),
                },
                out_events,
            );
            if let Some(Event::RegistrationRejected { id, reason }) = out_events[before..].first() {
                warn!("{} ({id}) was not placed: {reason}", blueprint.name);
            }
        }
        world
    }

    /// Creates the scheduler and one actor per entry in `actors`.
    ///
    /// `seed` makes wandering agents reproducible.
    pub(crate) fn build_scheduler(&self, world: &World, seed: u64) -> Result<TurnScheduler> {
        let mut scheduler = TurnScheduler::new(self.scheduler);
        for actor in &self.actors {
            let character = actor.character();
            let name = query::element(world, character)
                .filter(|element| query::character(world, element.id()).is_some())
                .map(|element| element.name().to_owned())
                .ok_or_else(|| {
                    anyhow!("actor controls {character}, which is not a character on the map")
                })?;

            match actor {
                ActorSpec::Player { inputs, .. } => {
                    let receiver = queue_inputs(&name, inputs)?;
                    scheduler.add_actor(Box::new(PlayerActor::new(character, name, receiver)));
                }
                ActorSpec::Wander { .. } => {
                    let rng = ChaCha8Rng::seed_from_u64(seed ^ u64::from(character.get()));
                    scheduler.add_actor(Box::new(AgentActor::new(
                        character,
                        name,
                        WanderingDecisionSource::new(rng),
                        self.agent,
                    )));
                }
                ActorSpec::Script { calls, .. } => {
                    let batches: Vec<_> = calls
                        .iter()
                        .enumerate()
                        .map(|(index, tool)| vec![tool.to_call(format!("{name}-{index}"))])
                        .collect();
                    scheduler.add_actor(Box::new(AgentActor::new(
                        character,
                        name,
                        ScriptedDecisionSource::new(batches),
                        self.agent,
                    )));
                }
            }
        }
        Ok(scheduler)
    }
}

fn queue_inputs(name: &str, inputs: &[ScriptedTool]) -> Result<mpsc::Receiver<PlayerInput>> {
    let (sender, receiver) = mpsc::channel(inputs.len().max(1));
    for (index, tool) in inputs.iter().enumerate() {
        let input = if tool.tool == END_TURN {
            PlayerInput::EndTurn
        } else {
            let call = tool.to_call(format!("{name}-{index}"));
            let action = parse_tool_call(&call)
                .with_context(|| format!("input {index} of {name} is not a valid action"))?;
            PlayerInput::Action(action)
        };
        if sender.try_send(input).is_err() {
            bail!("input queue for {name} is full");
        }
    }
    Ok(receiver)
}
