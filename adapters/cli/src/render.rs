use std::fmt::Write as _;

use turngrid_core::{ElementId, ElementKind, Event, GridCoordinate};
use turngrid_world::{query, Element, MapElement, World};

/// Glyph for an empty cell.
const EMPTY: char = '.';

/// Draws the grid as text, one line per row.
///
/// Characters show the first letter of their name, obstacles that block
/// movement are `#`, other obstacles `%` and items `*`.
pub(crate) fn render_map(world: &World) -> String {
    let grid = query::grid(world);
    let mut output = String::with_capacity(map_capacity(grid.width(), grid.height()));
    for row in 0..grid.height() {
        for column in 0..grid.width() {
            let coordinate = GridCoordinate::new(row as i32, column as i32);
            output.push(glyph(world, coordinate));
        }
        output.push('\n');
    }
    output
}

/// Bytes needed for a rendered map, or zero when that overflows.
fn map_capacity(width: u32, height: u32) -> usize {
    let line = usize::try_from(width).map_or(0, |width| width.saturating_add(1));
    usize::try_from(height)
        .ok()
        .and_then(|height| line.checked_mul(height))
        .unwrap_or(0)
}

fn glyph(world: &World, coordinate: GridCoordinate) -> char {
    let mut best: Option<(u8, char)> = None;
    for element in query::elements_at(world, coordinate) {
        let candidate = match element {
            Element::Character(character) => (
                3,
                character
                    .name()
                    .chars()
                    .next()
                    .map_or('@', |letter| letter.to_ascii_uppercase()),
            ),
            Element::Obstacle(obstacle) if obstacle.blocks_movement() => (2, '#'),
            Element::Obstacle(_) => (1, '%'),
            Element::Item(_) => (0, '*'),
        };
        if best.map_or(true, |(rank, _)| candidate.0 > rank) {
            best = Some(candidate);
        }
    }
    best.map_or(EMPTY, |(_, glyph)| glyph)
}

/// One status line per character, in id order.
pub(crate) fn roster(world: &World) -> Vec<String> {
    query::elements_by_kind(world, ElementKind::Character)
        .filter_map(Element::as_character)
        .map(|character| {
            let mut line = format!(
                "{} ({}) at {}: {}",
                character.name(),
                character.id(),
                character.coordinate(),
                character.status()
            );
            if !character.inventory().is_empty() {
                let _ = write!(line, ", carrying {}", character.inventory().description());
            }
            line
        })
        .collect()
}

fn name(world: &World, id: ElementId) -> String {
    query::element(world, id).map_or_else(|| id.to_string(), |element| element.name().to_owned())
}

/// Game-log sentence for an event, or `None` for bookkeeping events.
pub(crate) fn describe_event(world: &World, event: &Event) -> Option<String> {
    let line = match event {
        Event::ElementMoved { id, from, to } => {
            format!("{} moved from {from} to {to}", name(world, *id))
        }
        Event::MoveRejected { id, to, reason } => {
            format!("{} could not move to {to}: {reason}", name(world, *id))
        }
        Event::MessageSpoken {
            speaker,
            message,
            listeners,
        } => {
            let audience = if listeners.is_empty() {
                String::from("nobody")
            } else {
                listeners
                    .iter()
                    .map(|listener| name(world, *listener))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!("{} says \"{message}\" (heard by {audience})", name(world, *speaker))
        }
        Event::FacingChanged { id, facing } => {
            format!("{} now faces {facing}", name(world, *id))
        }
        Event::Attacked {
            attacker,
            target,
            damage,
        } => format!(
            "{} hits {} for {damage}",
            name(world, *attacker),
            name(world, *target)
        ),
        Event::HealthChanged { id, current, .. } => {
            format!("{} has {current} health", name(world, *id))
        }
        Event::CharacterDefeated { id } => format!("{} is defeated", name(world, *id)),
        Event::ObstacleDestroyed { id } => format!("{} is destroyed", name(world, *id)),
        Event::ItemPickedUp {
            character,
            item_type,
            ..
        } => format!("{} picks up a {item_type}", name(world, *character)),
        Event::ItemDropped {
            character,
            item_type,
            at,
            ..
        } => format!("{} drops a {item_type} at {at}", name(world, *character)),
        Event::ItemGiven {
            from,
            to,
            item_type,
            ..
        } => format!(
            "{} gives a {item_type} to {}",
            name(world, *from),
            name(world, *to)
        ),
        Event::InventoryRejected { character, reason } => {
            format!("{} fumbles: {reason}", name(world, *character))
        }
        Event::ActionRejected { actor, reason } => {
            format!("{} cannot do that: {reason}", name(world, *actor))
        }
        Event::ElementUnregistered { id, from } => {
            format!("{} leaves {from}", name(world, *id))
        }
        _ => return None,
    };
    Some(line)
}
