//! Read-only movement queries: traversability, line of sight and a simple
//! greedy path search.
//!
//! Path search is deliberately naive. It follows the straight line when
//! nothing blocks it and otherwise walks toward the target one row or column
//! at a time without ever backing up, so it can stall in front of a detour
//! that a real pathfinder would find.

use turngrid_core::{ElementId, GridCoordinate};

use crate::{query, MapCell, MapElement, World};

/// Upper bound on the number of cells a greedy walk may produce.
pub const MAX_PATH_STEPS: usize = 100;

/// Whether an element standing on `from` may enter `to`.
#[must_use]
pub fn is_navigation_viable(world: &World, from: GridCoordinate, to: GridCoordinate) -> bool {
    let grid = query::grid(world);
    grid.is_valid(from) && grid.is_valid(to) && query::is_cell_traversable(world, to)
}

/// Whether the element may enter `to` from its current cell.
#[must_use]
pub fn is_element_navigation_viable(world: &World, id: ElementId, to: GridCoordinate) -> bool {
    query::element(world, id)
        .is_some_and(|element| is_navigation_viable(world, element.coordinate(), to))
}

/// Whether the element may step into the neighbouring cell `to`.
#[must_use]
pub fn can_move_to_adjacent_cell(world: &World, id: ElementId, to: GridCoordinate) -> bool {
    query::element(world, id).is_some_and(|element| {
        let from = element.coordinate();
        from.is_adjacent(to) && is_navigation_viable(world, from, to)
    })
}

/// Whether every cell on the straight line between the endpoints, both
/// included, is traversable.
#[must_use]
pub fn has_direct_line_of_sight(world: &World, from: GridCoordinate, to: GridCoordinate) -> bool {
    let line = query::grid(world).cells_in_line(from, to);
    !line.is_empty()
        && line
            .iter()
            .all(|cell| query::is_cell_traversable(world, *cell))
}

/// Finds a route from `start` to `target`.
///
/// The straight line is returned when every cell after `start` is open. The
/// start cell is not checked because the mover itself usually blocks it.
/// Otherwise a greedy walk is attempted, which may end short of the target.
/// An empty path means the target itself cannot be entered.
#[must_use]
pub fn find_simple_path(
    world: &World,
    start: GridCoordinate,
    target: GridCoordinate,
) -> Vec<GridCoordinate> {
    if !is_navigation_viable(world, start, target) {
        return Vec::new();
    }

    let line = query::grid(world).cells_in_line(start, target);
    let clear = line
        .iter()
        .skip(1)
        .all(|cell| query::is_cell_traversable(world, *cell));
    if clear {
        return line;
    }
    greedy_path(world, start, target)
}

fn greedy_path(
    world: &World,
    start: GridCoordinate,
    target: GridCoordinate,
) -> Vec<GridCoordinate> {
    let mut rows_left = target.row() - start.row();
    let mut columns_left = target.column() - start.column();
    let mut current = start;
    let mut path = vec![start];

    while current != target {
        let mut next = current;

        if rows_left != 0 {
            let step = rows_left.signum();
            let candidate = current.offset(step, 0);
            if query::is_cell_traversable(world, candidate) {
                next = candidate;
                rows_left -= step;
            }
        }

        if next == current && columns_left != 0 {
            let step = columns_left.signum();
            let candidate = current.offset(0, step);
            if query::is_cell_traversable(world, candidate) {
                next = candidate;
                columns_left -= step;
            }
        }

        if next == current {
            break;
        }
        current = next;
        path.push(current);
        if path.len() > MAX_PATH_STEPS {
            break;
        }
    }

    path
}

/// Valid, traversable neighbours in compass order starting from north.
#[must_use]
pub fn adjacent_traversable_cells(world: &World, center: GridCoordinate) -> Vec<GridCoordinate> {
    query::grid(world)
        .all_adjacent(center)
        .into_iter()
        .flatten()
        .filter(|cell| query::is_cell_traversable(world, *cell))
        .collect()
}

/// Traversable cells within `radius` Manhattan steps, the centre included.
#[must_use]
pub fn traversable_cells_around(
    world: &World,
    center: GridCoordinate,
    radius: u32,
) -> Vec<GridCoordinate> {
    query::grid(world)
        .cells_in_radius(center, radius)
        .into_iter()
        .filter(|cell| query::is_cell_traversable(world, *cell))
        .collect()
}

/// Returns `target` when it is open, otherwise the closest open cell found
/// by widening the search radius one step at a time.
#[must_use]
pub fn nearest_traversable_cell(
    world: &World,
    target: GridCoordinate,
    max_radius: u32,
) -> Option<GridCoordinate> {
    if query::is_cell_traversable(world, target) {
        return Some(target);
    }

    (1..=max_radius).find_map(|radius| {
        traversable_cells_around(world, target, radius)
            .into_iter()
            .min_by(|a, b| {
                target
                    .euclidean_distance(*a)
                    .total_cmp(&target.euclidean_distance(*b))
            })
    })
}

/// Cost of moving from `from` to `to`: the Manhattan distance scaled by the
/// destination cell's cost, or infinity when the move is not viable.
#[must_use]
pub fn traversal_cost(world: &World, from: GridCoordinate, to: GridCoordinate) -> f32 {
    if !is_navigation_viable(world, from, to) {
        return f32::INFINITY;
    }
    query::cell(world, to).map_or(f32::INFINITY, |cell| {
        from.manhattan_distance(to) as f32 * cell.traversal_cost()
    })
}

/// Number of open cells in the rectangle spanned by two corners.
#[must_use]
pub fn count_traversable_cells_in_area(
    world: &World,
    corner: GridCoordinate,
    opposite: GridCoordinate,
) -> usize {
    query::grid(world)
        .cells_in_square_area(corner, opposite)
        .into_iter()
        .filter(|cell| query::is_cell_traversable(world, *cell))
        .count()
}

/// Whether every valid cell in the rectangle is open.
#[must_use]
pub fn is_area_fully_traversable(
    world: &World,
    corner: GridCoordinate,
    opposite: GridCoordinate,
) -> bool {
    query::grid(world)
        .cells_in_square_area(corner, opposite)
        .into_iter()
        .all(|cell| query::cell(world, cell).is_some_and(MapCell::is_traversable))
}

/// Euclidean length of a path, summed step by step.
#[must_use]
pub fn path_length(path: &[GridCoordinate]) -> f32 {
    path.windows(2)
        .map(|pair| pair[0].euclidean_distance(pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply;
    use turngrid_core::{
        CharacterTraits, Command, ElementBlueprint, ElementTraits, ObstacleTraits,
    };

    fn world_with_walls(walls: &[(u32, u32)]) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        for (index, (row, column)) in walls.iter().enumerate() {
            let blueprint = ElementBlueprint {
                id: ElementId::new(100 + index as u32),
                name: String::from("wall"),
                description: String::new(),
                linear_index: row * 10 + column,
                vision_distance: None,
                traits: ElementTraits::Obstacle(ObstacleTraits::default()),
            };
            apply(&mut world, Command::RegisterElement { blueprint }, &mut events);
        }
        world
    }

    fn place_character(world: &mut World, id: u32, row: u32, column: u32) {
        let blueprint = ElementBlueprint {
            id: ElementId::new(id),
            name: format!("walker-{id}"),
            description: String::new(),
            linear_index: row * 10 + column,
            vision_distance: None,
            traits: ElementTraits::Character(CharacterTraits::default()),
        };
        let mut events = Vec::new();
        apply(world, Command::RegisterElement { blueprint }, &mut events);
    }

    fn cells(coordinates: &[(i32, i32)]) -> Vec<GridCoordinate> {
        coordinates
            .iter()
            .map(|(row, column)| GridCoordinate::new(*row, *column))
            .collect()
    }

    #[test]
    fn viability_requires_valid_endpoints_and_open_destination() {
        let world = world_with_walls(&[(2, 2)]);
        let origin = GridCoordinate::new(2, 1);
        assert!(is_navigation_viable(&world, origin, GridCoordinate::new(2, 0)));
        assert!(!is_navigation_viable(&world, origin, GridCoordinate::new(2, 2)));
        assert!(!is_navigation_viable(&world, origin, GridCoordinate::new(2, 10)));
        assert!(!is_navigation_viable(
            &world,
            GridCoordinate::INVALID,
            GridCoordinate::new(0, 0)
        ));
    }

    #[test]
    fn straight_path_ignores_the_movers_own_cell() {
        let mut world = World::new();
        place_character(&mut world, 1, 0, 0);

        let path = find_simple_path(&world, GridCoordinate::new(0, 0), GridCoordinate::new(0, 3));
        assert_eq!(path, cells(&[(0, 0), (0, 1), (0, 2), (0, 3)]));
        assert!(
            !has_direct_line_of_sight(&world, GridCoordinate::new(0, 0), GridCoordinate::new(0, 3)),
            "line of sight includes the occupied start cell"
        );
    }

    #[test]
    fn blocked_line_falls_back_to_greedy_steps() {
        let world = world_with_walls(&[(1, 1)]);
        let path = find_simple_path(&world, GridCoordinate::new(0, 0), GridCoordinate::new(2, 2));
        assert_eq!(path, cells(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]));
        assert!((path_length(&path) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn greedy_walk_stalls_in_front_of_a_detour() {
        let world = world_with_walls(&[(2, 0), (2, 1)]);
        let start = GridCoordinate::new(0, 0);
        let target = GridCoordinate::new(4, 0);

        let path = find_simple_path(&world, start, target);
        assert_eq!(
            path,
            cells(&[(0, 0), (1, 0)]),
            "no backtracking, so the open route through column 2 is never tried"
        );
        assert_eq!(
            count_traversable_cells_in_area(
                &world,
                GridCoordinate::new(2, 0),
                GridCoordinate::new(2, 9)
            ),
            8
        );
    }

    #[test]
    fn unreachable_target_yields_no_path() {
        let world = world_with_walls(&[(5, 5)]);
        assert!(find_simple_path(&world, GridCoordinate::new(0, 0), GridCoordinate::new(5, 5))
            .is_empty());
    }

    #[test]
    fn neighbour_queries_skip_blocked_cells() {
        let world = world_with_walls(&[(0, 1), (1, 1)]);
        assert_eq!(
            adjacent_traversable_cells(&world, GridCoordinate::new(0, 0)),
            cells(&[(1, 0)])
        );
        assert_eq!(
            traversable_cells_around(&world, GridCoordinate::new(0, 0), 1),
            cells(&[(0, 0), (1, 0)])
        );
    }

    #[test]
    fn nearest_open_cell_widens_the_search() {
        let world = world_with_walls(&[(4, 4), (3, 4), (5, 4), (4, 3), (4, 5)]);
        let target = GridCoordinate::new(4, 4);
        let nearest = nearest_traversable_cell(&world, target, 3).expect("open cell nearby");
        assert_eq!(target.manhattan_distance(nearest), 2);
        assert!(target.is_diagonally_adjacent(nearest));

        assert_eq!(nearest_traversable_cell(&world, target, 1), None);
        assert_eq!(
            nearest_traversable_cell(&world, GridCoordinate::new(0, 0), 3),
            Some(GridCoordinate::new(0, 0))
        );
    }

    #[test]
    fn traversal_cost_scales_with_distance() {
        let world = world_with_walls(&[(0, 5)]);
        let from = GridCoordinate::new(0, 0);
        assert!((traversal_cost(&world, from, GridCoordinate::new(0, 3)) - 3.0).abs() < 1e-6);
        assert!(traversal_cost(&world, from, GridCoordinate::new(0, 5)).is_infinite());
        assert!(!is_area_fully_traversable(&world, from, GridCoordinate::new(1, 5)));
        assert!(is_area_fully_traversable(&world, from, GridCoordinate::new(1, 4)));
    }

    #[test]
    fn adjacent_moves_require_a_neighbouring_open_cell() {
        let mut world = world_with_walls(&[(3, 4)]);
        place_character(&mut world, 1, 3, 3);
        let walker = ElementId::new(1);

        assert!(can_move_to_adjacent_cell(&world, walker, GridCoordinate::new(2, 2)));
        assert!(!can_move_to_adjacent_cell(&world, walker, GridCoordinate::new(3, 4)));
        assert!(!can_move_to_adjacent_cell(&world, walker, GridCoordinate::new(3, 5)));
        assert!(is_element_navigation_viable(&world, walker, GridCoordinate::new(3, 5)));
        assert!(!is_element_navigation_viable(&world, ElementId::new(9), GridCoordinate::new(3, 5)));
    }
}
