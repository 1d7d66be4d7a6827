#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Character actions and the tool boundary used by language-model agents.
//!
//! Every action is carried out through world commands, so the world's
//! validation and event reporting apply unchanged. The outcome pairs the
//! emitted events with a sentence that can be shown to a player or fed back
//! to an agent.

mod tools;

pub use tools::{
    is_tool_supported, parse_tool_call, tool_catalog, validate, ToolCall, ToolDispatcher,
    ToolError, ToolResponse, TOOL_NAMES,
};

use log::debug;
use turngrid_core::{
    ActionError, Command, ElementId, Event, GridCoordinate, InventoryError, ItemType,
    NavigationError, ViewDirection, VisionResult,
};
use turngrid_world::{self as world, query, vision, Element, MapElement, World};

/// Single action a character may attempt during its turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameAction {
    /// Relocate to a cell.
    Move {
        /// Destination cell.
        to: GridCoordinate,
    },
    /// Say something to nearby characters.
    Talk {
        /// Spoken text.
        message: String,
    },
    /// Turn around.
    Flip,
    /// Pick up a specific item.
    Pickup {
        /// Item to collect.
        item: ElementId,
    },
    /// Pick up an item of the given type lying in the actor's own cell.
    PickupByType {
        /// Type to look for.
        item_type: ItemType,
    },
    /// Put a carried item down.
    Drop {
        /// Slot to empty.
        item_type: ItemType,
    },
    /// Hand a carried item to another character.
    Give {
        /// Receiving character.
        to: ElementId,
        /// Slot to hand over.
        item_type: ItemType,
    },
    /// Strike a character or a destructible obstacle.
    Attack {
        /// Element to strike.
        target: ElementId,
    },
    /// Scan in a direction, or ahead when no direction is given.
    Look {
        /// Direction to scan.
        direction: Option<ViewDirection>,
    },
}

impl GameAction {
    /// Short name of the action used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            GameAction::Move { .. } => "move",
            GameAction::Talk { .. } => "talk",
            GameAction::Flip => "flip",
            GameAction::Pickup { .. } | GameAction::PickupByType { .. } => "pickup",
            GameAction::Drop { .. } => "drop",
            GameAction::Give { .. } => "give",
            GameAction::Attack { .. } => "attack",
            GameAction::Look { .. } => "look",
        }
    }

    /// Whether the action can change world state.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, GameAction::Look { .. })
    }
}

/// Result of an attempted action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionOutcome {
    /// Whether the action took effect.
    pub success: bool,
    /// Human-readable summary of what happened.
    pub message: String,
    /// Events the world emitted while carrying the action out.
    pub events: Vec<Event>,
}

impl ActionOutcome {
    fn succeeded(message: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            success: true,
            message: message.into(),
            events,
        }
    }

    fn failed(message: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            success: false,
            message: message.into(),
            events,
        }
    }
}

/// Carries out `action` on behalf of the character `actor`.
pub fn execute_action(world: &mut World, actor: ElementId, action: GameAction) -> ActionOutcome {
    if query::character(world, actor).is_none() {
        return ActionOutcome::failed(
            format!("Character with id {} not found", actor.get()),
            Vec::new(),
        );
    }

    let label = action.label();
    let outcome = match action {
        GameAction::Move { to } => move_to(world, actor, to),
        GameAction::Talk { message } => talk(world, actor, message),
        GameAction::Flip => flip(world, actor),
        GameAction::Pickup { item } => pickup(world, actor, item),
        GameAction::PickupByType { item_type } => pickup_by_type(world, actor, item_type),
        GameAction::Drop { item_type } => drop_item(world, actor, item_type),
        GameAction::Give { to, item_type } => give(world, actor, to, item_type),
        GameAction::Attack { target } => attack(world, actor, target),
        GameAction::Look { direction } => look(world, actor, direction),
    };
    debug!(
        "{actor} {label}: {} ({})",
        outcome.message,
        if outcome.success { "ok" } else { "failed" }
    );
    outcome
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn name_of(world: &World, id: ElementId) -> Option<String> {
    query::element(world, id).map(|element| element.name().to_owned())
}

fn move_rejection(events: &[Event]) -> Option<NavigationError> {
    events.iter().find_map(|event| match event {
        Event::MoveRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn action_rejection(events: &[Event]) -> Option<ActionError> {
    events.iter().find_map(|event| match event {
        Event::ActionRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn inventory_rejection(events: &[Event]) -> Option<InventoryError> {
    events.iter().find_map(|event| match event {
        Event::InventoryRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn move_to(world: &mut World, actor: ElementId, to: GridCoordinate) -> ActionOutcome {
    let events = run(world, Command::MoveElement { id: actor, to });
    match move_rejection(&events) {
        Some(reason) => ActionOutcome::failed(
            format!(
                "You cannot move to: {}, {} ({reason})",
                to.row(),
                to.column()
            ),
            events,
        ),
        None => ActionOutcome::succeeded(
            format!("Your position is now: {},{}", to.row(), to.column()),
            events,
        ),
    }
}

fn talk(world: &mut World, actor: ElementId, message: String) -> ActionOutcome {
    let events = run(
        world,
        Command::Talk {
            speaker: actor,
            message: message.clone(),
        },
    );
    if let Some(reason) = action_rejection(&events) {
        return ActionOutcome::failed(format!("You could not talk: {reason}"), events);
    }
    ActionOutcome::succeeded(format!("You said: {message}"), events)
}

fn flip(world: &mut World, actor: ElementId) -> ActionOutcome {
    let events = run(world, Command::Flip { id: actor });
    let facing = events.iter().find_map(|event| match event {
        Event::FacingChanged { facing, .. } => Some(*facing),
        _ => None,
    });
    match facing {
        Some(facing) => ActionOutcome::succeeded(format!("You are now facing {facing}"), events),
        None => ActionOutcome::failed("You could not turn around", events),
    }
}

fn pickup(world: &mut World, actor: ElementId, item: ElementId) -> ActionOutcome {
    let item_name = name_of(world, item).unwrap_or_else(|| item.to_string());
    let events = run(
        world,
        Command::PickupItem {
            character: actor,
            item,
        },
    );

    let message = match inventory_rejection(&events) {
        Some(InventoryError::UnknownElement(_) | InventoryError::NotAnItem(_)) => {
            format!("Item with id {} not found", item.get())
        }
        Some(InventoryError::NotCollectable) => format!("Item {item_name} is not collectable"),
        Some(InventoryError::OutOfRange) => format!("Item {item_name} is out of pickup range"),
        Some(InventoryError::SlotOccupied(item_type)) => {
            format!("Already have {item_type} in inventory")
        }
        Some(other) => format!("Could not pick up {item_name}: {other}"),
        None => {
            let item_type = events.iter().find_map(|event| match event {
                Event::ItemPickedUp { item_type, .. } => Some(*item_type),
                _ => None,
            });
            return match item_type {
                Some(item_type) => ActionOutcome::succeeded(
                    format!("Successfully picked up {item_type} (id: {})", item.get()),
                    events,
                ),
                None => ActionOutcome::failed(format!("Could not pick up {item_name}"), events),
            };
        }
    };
    ActionOutcome::failed(message, events)
}

fn pickup_by_type(world: &mut World, actor: ElementId, item_type: ItemType) -> ActionOutcome {
    let at = query::element(world, actor).map_or(GridCoordinate::INVALID, MapElement::coordinate);
    let found = query::elements_at(world, at)
        .filter_map(Element::as_item)
        .find(|item| item.item_type() == item_type)
        .map(MapElement::id);

    match found {
        Some(item) => pickup(world, actor, item),
        None => ActionOutcome::failed(format!("No {item_type} here to pick up"), Vec::new()),
    }
}

fn drop_item(world: &mut World, actor: ElementId, item_type: ItemType) -> ActionOutcome {
    let events = run(
        world,
        Command::DropItem {
            character: actor,
            item_type,
        },
    );
    match inventory_rejection(&events) {
        Some(InventoryError::MissingItem(_)) => {
            ActionOutcome::failed(format!("No {item_type} in inventory"), events)
        }
        Some(InventoryError::NoRoom) => {
            ActionOutcome::failed(format!("There is no room to drop {item_type} here"), events)
        }
        Some(other) => ActionOutcome::failed(format!("Could not drop {item_type}: {other}"), events),
        None => ActionOutcome::succeeded(
            format!("Successfully dropped {item_type} from inventory"),
            events,
        ),
    }
}

fn give(world: &mut World, actor: ElementId, to: ElementId, item_type: ItemType) -> ActionOutcome {
    let receiver = name_of(world, to);
    let distance = query::distance_between_elements(world, actor, to);
    let events = run(
        world,
        Command::GiveItem {
            from: actor,
            to,
            item_type,
        },
    );

    let message = match inventory_rejection(&events) {
        None => {
            let receiver = receiver.unwrap_or_else(|| to.to_string());
            return ActionOutcome::succeeded(
                format!("Successfully gave {item_type} to {receiver}"),
                events,
            );
        }
        Some(InventoryError::UnknownElement(id) | InventoryError::NotACharacter(id)) => {
            format!("Character with id {} not found", id.get())
        }
        Some(InventoryError::SelfTarget) => String::from("You cannot give items to yourself"),
        Some(InventoryError::OutOfRange) => format!(
            "Target character is out of range (distance: {:.1})",
            distance.unwrap_or(f32::INFINITY)
        ),
        Some(InventoryError::MissingItem(_)) => format!("No {item_type} in inventory"),
        Some(InventoryError::SlotOccupied(_)) => {
            format!("Target character already has {item_type}")
        }
        Some(other) => format!("Could not give {item_type}: {other}"),
    };
    ActionOutcome::failed(message, events)
}

fn attack(world: &mut World, actor: ElementId, target: ElementId) -> ActionOutcome {
    let target_name = name_of(world, target).unwrap_or_else(|| target.to_string());
    let events = run(
        world,
        Command::Attack {
            attacker: actor,
            target,
        },
    );
    if let Some(reason) = action_rejection(&events) {
        return ActionOutcome::failed(format!("Attack failed: {reason}"), events);
    }

    let damage = events
        .iter()
        .find_map(|event| match event {
            Event::Attacked { damage, .. } => Some(*damage),
            _ => None,
        })
        .unwrap_or_default();
    let mut message = format!("You attacked {target_name} for {damage} damage");
    for event in &events {
        match event {
            Event::HealthChanged { current, .. } => {
                message.push_str(&format!(" ({target_name} now has {current} health)"));
            }
            Event::CharacterDefeated { .. } => {
                message.push_str(&format!(". {target_name} was defeated"));
            }
            Event::ObstacleDestroyed { .. } => {
                message.push_str(&format!(". {target_name} was destroyed"));
            }
            _ => {}
        }
    }
    ActionOutcome::succeeded(message, events)
}

fn look(world: &World, actor: ElementId, direction: Option<ViewDirection>) -> ActionOutcome {
    let result = match direction {
        Some(direction) => vision::look_in_direction(world, actor, direction),
        None => vision::look_forward(world, actor),
    };
    match result {
        Some(result) => ActionOutcome::succeeded(describe_vision(world, &result), Vec::new()),
        None => ActionOutcome::failed("You cannot see anything", Vec::new()),
    }
}

/// One-sentence description of a vision scan.
#[must_use]
pub fn describe_vision(world: &World, result: &VisionResult) -> String {
    let heading = match result.direction {
        Some(direction) => format!("Looking {direction}"),
        None => String::from("Looking around"),
    };
    let seen: Vec<String> = result
        .visible_elements
        .iter()
        .filter_map(|id| query::element(world, *id))
        .map(|element| {
            format!(
                "{} ({}, id {}) at {}",
                element.name(),
                element.kind(),
                element.id().get(),
                element.coordinate()
            )
        })
        .collect();

    if seen.is_empty() {
        format!("{heading}: you see nothing")
    } else {
        format!("{heading}: you see {}", seen.join(", "))
    }
}
