//! Per-cell occupancy and traversal bookkeeping.

use glam::Vec2;
use turngrid_core::{ElementId, GridCoordinate};

/// Traversal cost of a single-occupant or empty cell.
pub const BASE_TRAVERSAL_COST: f32 = 1.0;

/// Extra cost each occupant adds once a cell is shared.
pub const CROWDING_COST_PER_OCCUPANT: f32 = 0.1;

/// Lower bound for explicitly assigned traversal costs.
pub const MIN_TRAVERSAL_COST: f32 = 0.1;

/// A single map cell together with the elements standing in it.
///
/// The cell only stores identifiers. Whether an occupant blocks movement is
/// answered by the caller through a predicate so the element arena remains
/// the single owner of element state.
#[derive(Clone, Debug, PartialEq)]
pub struct MapCell {
    coordinate: GridCoordinate,
    world_position: Vec2,
    occupants: Vec<ElementId>,
    traversable: bool,
    traversal_cost: f32,
}

impl MapCell {
    /// Creates an empty, traversable cell.
    #[must_use]
    pub fn new(coordinate: GridCoordinate, world_position: Vec2) -> Self {
        Self {
            coordinate,
            world_position,
            occupants: Vec::new(),
            traversable: true,
            traversal_cost: BASE_TRAVERSAL_COST,
        }
    }

    /// Coordinate of the cell.
    #[must_use]
    pub const fn coordinate(&self) -> GridCoordinate {
        self.coordinate
    }

    /// World-space centre of the cell.
    #[must_use]
    pub const fn world_position(&self) -> Vec2 {
        self.world_position
    }

    /// Elements standing in the cell, in arrival order.
    #[must_use]
    pub fn occupants(&self) -> &[ElementId] {
        &self.occupants
    }

    /// Whether movement into the cell is currently allowed.
    #[must_use]
    pub const fn is_traversable(&self) -> bool {
        self.traversable
    }

    /// Cost of entering the cell. Infinite when blocked.
    #[must_use]
    pub const fn traversal_cost(&self) -> f32 {
        self.traversal_cost
    }

    /// Reports whether any element stands in the cell.
    #[must_use]
    pub fn has_occupants(&self) -> bool {
        !self.occupants.is_empty()
    }

    /// Number of elements standing in the cell.
    #[must_use]
    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    /// Reports whether the element stands in the cell.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.occupants.contains(&id)
    }

    /// Adds an occupant. Adding an element twice has no effect.
    ///
    /// Returns whether the element was newly added.
    pub fn add_occupant<F>(&mut self, id: ElementId, can_be_traversed: F) -> bool
    where
        F: Fn(ElementId) -> bool,
    {
        if self.contains(id) {
            return false;
        }
        self.occupants.push(id);
        self.refresh(can_be_traversed);
        true
    }

    /// Removes an occupant, returning whether it was present.
    pub fn remove_occupant<F>(&mut self, id: ElementId, can_be_traversed: F) -> bool
    where
        F: Fn(ElementId) -> bool,
    {
        let before = self.occupants.len();
        self.occupants.retain(|occupant| *occupant != id);
        let removed = self.occupants.len() != before;
        if removed {
            self.refresh(can_be_traversed);
        }
        removed
    }

    /// Empties the cell and restores the base traversal state.
    pub fn clear_occupants(&mut self) {
        self.occupants.clear();
        self.traversable = true;
        self.traversal_cost = BASE_TRAVERSAL_COST;
    }

    /// Recomputes traversability and cost from the current occupants.
    pub fn refresh<F>(&mut self, can_be_traversed: F)
    where
        F: Fn(ElementId) -> bool,
    {
        self.traversable = self.occupants.iter().all(|id| can_be_traversed(*id));
        self.traversal_cost = if !self.traversable {
            f32::INFINITY
        } else if self.occupants.len() > 1 {
            BASE_TRAVERSAL_COST + self.occupants.len() as f32 * CROWDING_COST_PER_OCCUPANT
        } else {
            BASE_TRAVERSAL_COST
        };
    }

    /// Forces the cell closed, or reopens it by recomputing from occupants.
    pub fn set_traversable<F>(&mut self, traversable: bool, can_be_traversed: F)
    where
        F: Fn(ElementId) -> bool,
    {
        if traversable {
            self.refresh(can_be_traversed);
        } else {
            self.traversable = false;
            self.traversal_cost = f32::INFINITY;
        }
    }

    /// Overrides the traversal cost. Costs below the minimum are raised to it and
    /// an infinite cost closes the cell.
    pub fn set_traversal_cost(&mut self, cost: f32) {
        self.traversal_cost = cost.max(MIN_TRAVERSAL_COST);
        if self.traversal_cost.is_infinite() {
            self.traversable = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> MapCell {
        MapCell::new(GridCoordinate::new(1, 2), Vec2::new(2.5, -1.5))
    }

    fn everything_passable(_: ElementId) -> bool {
        true
    }

    #[test]
    fn adding_twice_keeps_a_single_entry() {
        let mut cell = cell();
        let id = ElementId::new(7);
        assert!(cell.add_occupant(id, everything_passable));
        assert!(!cell.add_occupant(id, everything_passable));
        assert_eq!(cell.occupant_count(), 1);
        assert!((cell.traversal_cost() - BASE_TRAVERSAL_COST).abs() < f32::EPSILON);
    }

    #[test]
    fn shared_cells_cost_more() {
        let mut cell = cell();
        let _ = cell.add_occupant(ElementId::new(1), everything_passable);
        let _ = cell.add_occupant(ElementId::new(2), everything_passable);
        assert!(cell.is_traversable());
        assert!((cell.traversal_cost() - 1.2).abs() < 1e-6);
    }

    #[test]
    fn blocking_occupant_closes_the_cell() {
        let mut cell = cell();
        let wall = ElementId::new(9);
        let blocks = |id: ElementId| id != wall;
        let _ = cell.add_occupant(ElementId::new(1), blocks);
        let _ = cell.add_occupant(wall, blocks);
        assert!(!cell.is_traversable());
        assert!(cell.traversal_cost().is_infinite());

        assert!(cell.remove_occupant(wall, blocks));
        assert!(cell.is_traversable());
        assert!((cell.traversal_cost() - BASE_TRAVERSAL_COST).abs() < f32::EPSILON);
        assert!(!cell.remove_occupant(wall, blocks));
    }

    #[test]
    fn reopening_recomputes_from_occupants() {
        let mut cell = cell();
        let _ = cell.add_occupant(ElementId::new(1), everything_passable);
        cell.set_traversable(false, everything_passable);
        assert!(!cell.is_traversable());
        assert!(cell.traversal_cost().is_infinite());

        cell.set_traversable(true, everything_passable);
        assert!(cell.is_traversable());

        cell.set_traversable(true, |_| false);
        assert!(!cell.is_traversable(), "a blocking occupant keeps the cell closed");
    }

    #[test]
    fn explicit_costs_are_clamped() {
        let mut cell = cell();
        cell.set_traversal_cost(0.01);
        assert!((cell.traversal_cost() - MIN_TRAVERSAL_COST).abs() < f32::EPSILON);
        assert!(cell.is_traversable());

        cell.set_traversal_cost(f32::INFINITY);
        assert!(!cell.is_traversable());
    }

    #[test]
    fn clearing_restores_defaults() {
        let mut cell = cell();
        let _ = cell.add_occupant(ElementId::new(1), |_| false);
        cell.clear_occupants();
        assert!(!cell.has_occupants());
        assert!(cell.is_traversable());
    }
}
