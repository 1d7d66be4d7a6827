use rand::{seq::SliceRandom, Rng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use turngrid_core::{ElementKind, GridDirection};
use turngrid_system_actions::{ToolCall, ToolResponse};
use turngrid_system_turns::{DecisionFuture, DecisionSource, Observation};

const STEPS: [GridDirection; 4] = [
    GridDirection::North,
    GridDirection::South,
    GridDirection::West,
    GridDirection::East,
];

/// Offline stand-in for a language model: one plausible action per turn,
/// chosen with a seeded generator so runs are reproducible.
pub(crate) struct WanderingDecisionSource {
    rng: ChaCha8Rng,
    issued: u64,
}

impl WanderingDecisionSource {
    pub(crate) fn new(rng: ChaCha8Rng) -> Self {
        Self { rng, issued: 0 }
    }

    fn choose(&mut self, observation: &Observation) -> ToolCall {
        self.issued += 1;
        let id = format!("wander-{}", self.issued);

        if let Some(item) = observation
            .here
            .iter()
            .find(|element| element.kind == ElementKind::Item)
        {
            return ToolCall::new(id, "pickup_item", json!({ "itemId": item.id.get() }));
        }

        let me = observation.me.coordinate;
        let neighbour = observation.visible.iter().find(|element| {
            element.kind == ElementKind::Character && element.coordinate.manhattan_distance(me) <= 1
        });
        if let Some(neighbour) = neighbour {
            if self.rng.gen_bool(0.5) {
                let greeting = format!("Hello, {}", neighbour.name);
                return ToolCall::new(id, "talk", json!({ "message": greeting }));
            }
        }

        if self.rng.gen_ratio(1, 5) {
            return ToolCall::new(id, "look", json!({}));
        }

        let direction = STEPS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(GridDirection::East);
        let target = me.step(direction);
        ToolCall::new(
            id,
            "move",
            json!({ "row": target.row(), "col": target.column() }),
        )
    }
}

impl DecisionSource for WanderingDecisionSource {
    fn decide<'a>(
        &'a mut self,
        observation: &'a Observation,
        previous: &'a [ToolResponse],
    ) -> DecisionFuture<'a> {
        Box::pin(async move {
            if !previous.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![self.choose(observation)])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use turngrid_core::{ElementId, ElementSnapshot, GridCoordinate, ViewDirection};

    fn snapshot(id: u32, kind: ElementKind, row: i32, column: i32) -> ElementSnapshot {
        ElementSnapshot {
            id: ElementId::new(id),
            kind,
            name: format!("element {id}"),
            coordinate: GridCoordinate::new(row, column),
            vision_distance: 5,
            status: String::new(),
        }
    }

    fn observation(here: Vec<ElementSnapshot>) -> Observation {
        Observation {
            clock: 1,
            me: snapshot(1, ElementKind::Character, 4, 4),
            health: 100,
            max_health: 100,
            facing: ViewDirection::Right,
            inventory: Vec::new(),
            here,
            visible: Vec::new(),
            recent_history: Vec::new(),
        }
    }

    #[test]
    fn items_underfoot_are_collected_first() {
        let mut source = WanderingDecisionSource::new(ChaCha8Rng::seed_from_u64(3));
        let call = source.choose(&observation(vec![snapshot(9, ElementKind::Item, 4, 4)]));
        assert_eq!(call.name, "pickup_item");
        assert_eq!(call.arguments.get("itemId"), Some(&json!(9)));
    }

    #[test]
    fn wandering_is_reproducible_and_stays_adjacent() {
        let mut first = WanderingDecisionSource::new(ChaCha8Rng::seed_from_u64(11));
        let mut second = WanderingDecisionSource::new(ChaCha8Rng::seed_from_u64(11));
        let empty = observation(Vec::new());

        for _ in 0..20 {
            let call = first.choose(&empty);
            assert_eq!(call, second.choose(&empty));
            if call.name == "move" {
                let row = call.arguments["row"].as_i64().expect("row");
                let column = call.arguments["col"].as_i64().expect("col");
                assert_eq!((row - 4).abs() + (column - 4).abs(), 1);
            } else {
                assert_eq!(call.name, "look");
            }
        }
    }
}
