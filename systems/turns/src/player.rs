use glam::Vec2;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use turngrid_core::{ElementId, ElementKind, GridCoordinate, ItemType};
use turngrid_system_actions::{execute_action, ActionOutcome, GameAction};
use turngrid_world::{query, MapElement, World};

use crate::{TurnActor, TurnFuture, TurnReport};

/// Action waiting for the player to pick a cell or character on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingTarget {
    /// Next click selects the destination cell.
    Move,
    /// Next click selects the character to strike.
    Attack,
    /// Next click selects the character receiving the item.
    Give(ItemType),
}

/// Input delivered to a [`PlayerActor`] by the front end.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerInput {
    /// Perform an action with every argument already known.
    Action(GameAction),
    /// Arm an action whose target comes from the next click.
    SelectTarget(PendingTarget),
    /// Click at a world-space position.
    Click(Vec2),
    /// Forget the armed action.
    CancelTarget,
    /// Give up the remaining action points.
    EndTurn,
}

/// Human-controlled character driven through an input channel.
///
/// Each turn grants the number of action points configured in the world's
/// rules. Only successful actions that change the world spend a point.
pub struct PlayerActor {
    id: ElementId,
    name: String,
    inputs: mpsc::Receiver<PlayerInput>,
    feedback: Option<mpsc::UnboundedSender<ActionOutcome>>,
    remaining_points: u32,
    pending: Option<PendingTarget>,
}

impl PlayerActor {
    /// Creates a player controlling the character `id`.
    #[must_use]
    pub fn new(id: ElementId, name: impl Into<String>, inputs: mpsc::Receiver<PlayerInput>) -> Self {
        Self {
            id,
            name: name.into(),
            inputs,
            feedback: None,
            remaining_points: 0,
            pending: None,
        }
    }

    /// Sends every action outcome to `feedback`.
    #[must_use]
    pub fn with_feedback(mut self, feedback: mpsc::UnboundedSender<ActionOutcome>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Character controlled by the player.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Action points left in the current turn.
    #[must_use]
    pub const fn remaining_points(&self) -> u32 {
        self.remaining_points
    }

    /// Action currently waiting for a click.
    #[must_use]
    pub const fn pending_target(&self) -> Option<PendingTarget> {
        self.pending
    }

    fn handle(&mut self, world: &mut World, input: PlayerInput, report: &mut TurnReport) -> bool {
        match input {
            PlayerInput::Action(action) => self.perform(world, action, report),
            PlayerInput::SelectTarget(target) => {
                info!("{}: click on the map to choose a target", self.name);
                self.pending = Some(target);
            }
            PlayerInput::Click(point) => self.resolve_click(world, point, report),
            PlayerInput::CancelTarget => self.pending = None,
            PlayerInput::EndTurn => return false,
        }
        true
    }

    fn resolve_click(&mut self, world: &mut World, point: Vec2, report: &mut TurnReport) {
        let Some(target) = self.pending else {
            debug!("{} clicked with nothing armed", self.name);
            return;
        };
        let Some(coordinate) = query::grid(world).world_to_coordinate(point) else {
            self.send(ActionOutcome {
                success: false,
                message: String::from("That position is outside the map"),
                events: Vec::new(),
            });
            return;
        };

        let action = match target {
            PendingTarget::Move => GameAction::Move { to: coordinate },
            PendingTarget::Attack | PendingTarget::Give(_) => {
                let Some(character) = self.character_at(world, coordinate) else {
                    self.send(ActionOutcome {
                        success: false,
                        message: format!(
                            "No character at {}, {}",
                            coordinate.row(),
                            coordinate.column()
                        ),
                        events: Vec::new(),
                    });
                    return;
                };
                match target {
                    PendingTarget::Give(item_type) => GameAction::Give {
                        to: character,
                        item_type,
                    },
                    _ => GameAction::Attack { target: character },
                }
            }
        };
        self.pending = None;
        self.perform(world, action, report);
    }

    fn character_at(&self, world: &World, coordinate: GridCoordinate) -> Option<ElementId> {
        query::elements_at(world, coordinate)
            .find(|element| element.kind() == ElementKind::Character && element.id() != self.id)
            .map(MapElement::id)
    }

    fn perform(&mut self, world: &mut World, action: GameAction, report: &mut TurnReport) {
        let spends_point = action.is_mutating();
        let outcome = execute_action(world, self.id, action);
        if outcome.success && spends_point {
            self.remaining_points = self.remaining_points.saturating_sub(1);
            report.actions_taken += 1;
        }
        debug!(
            "{}: {} ({} points left)",
            self.name, outcome.message, self.remaining_points
        );
        report.events.extend(outcome.events.iter().cloned());
        self.send(outcome);
    }

    fn send(&self, outcome: ActionOutcome) {
        if let Some(feedback) = &self.feedback {
            if feedback.send(outcome).is_err() {
                debug!("{}: nobody is listening for feedback", self.name);
            }
        }
    }
}

impl TurnActor for PlayerActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, world: &mut World) {
        if query::character(world, self.id).is_none() {
            warn!("{} controls {} which is not on the map", self.name, self.id);
        }
        self.remaining_points = 0;
        self.pending = None;
    }

    fn execute_turn<'a>(
        &'a mut self,
        world: &'a mut World,
        report: &'a mut TurnReport,
    ) -> TurnFuture<'a> {
        Box::pin(async move {
            if query::character(world, self.id).is_none() {
                warn!("{} has no character, skipping turn", self.name);
                return;
            }

            self.remaining_points = query::rules(world).action_points;
            self.pending = None;
            while self.remaining_points > 0 {
                let Some(input) = self.inputs.recv().await else {
                    info!("{} input closed, ending turn", self.name);
                    break;
                };
                if !self.handle(world, input, report) {
                    break;
                }
            }

            self.remaining_points = 0;
            self.pending = None;
        })
    }
}
