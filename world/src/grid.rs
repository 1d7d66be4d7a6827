//! Grid geometry: cell validity, linear indexing and world-space conversion.

use glam::Vec2;
use turngrid_core::{GridConfiguration, GridCoordinate, GridDirection, MAX_OBJECTS_PER_CELL};

/// Converts between grid coordinates and world positions for a fixed configuration.
///
/// World space has x growing to the right and y growing upward. Rows grow
/// downward, so row centres sit at negative y values below `offset_top`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSystem {
    configuration: GridConfiguration,
}

impl GridSystem {
    /// Creates a grid system for the provided configuration.
    #[must_use]
    pub const fn new(configuration: GridConfiguration) -> Self {
        Self { configuration }
    }

    /// Configuration the grid was built from.
    #[must_use]
    pub const fn configuration(&self) -> &GridConfiguration {
        &self.configuration
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.configuration.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.configuration.height
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn is_valid(&self, coordinate: GridCoordinate) -> bool {
        self.configuration.is_valid(coordinate)
    }

    /// Row-major index of a valid coordinate.
    #[must_use]
    pub fn linear_index(&self, coordinate: GridCoordinate) -> Option<usize> {
        if !self.is_valid(coordinate) {
            return None;
        }
        usize::try_from(coordinate.linear_index(self.width())).ok()
    }

    /// Coordinate stored at the provided linear index, or
    /// [`GridCoordinate::INVALID`] when the index lies beyond the grid.
    #[must_use]
    pub fn coordinate_from_linear_index(&self, index: usize) -> GridCoordinate {
        let Ok(width) = usize::try_from(self.width()) else {
            return GridCoordinate::INVALID;
        };
        if width == 0 || index >= self.configuration.total_cells() {
            return GridCoordinate::INVALID;
        }

        match (i32::try_from(index / width), i32::try_from(index % width)) {
            (Ok(row), Ok(column)) => GridCoordinate::new(row, column),
            _ => GridCoordinate::INVALID,
        }
    }

    /// Cell containing the world-space point, if any.
    #[must_use]
    pub fn world_to_coordinate(&self, point: Vec2) -> Option<GridCoordinate> {
        let configuration = &self.configuration;
        if configuration.cell_width <= 0.0 || configuration.cell_height <= 0.0 {
            return None;
        }

        let column = ((point.x - configuration.offset_left) / configuration.cell_width).floor();
        let row = (-(point.y + configuration.offset_top) / configuration.cell_height).floor();
        if !column.is_finite() || !row.is_finite() {
            return None;
        }

        let coordinate = GridCoordinate::new(row as i32, column as i32);
        self.is_valid(coordinate).then_some(coordinate)
    }

    /// World-space centre of the cell, or the origin for invalid coordinates.
    #[must_use]
    pub fn coordinate_to_world_center(&self, coordinate: GridCoordinate) -> Vec2 {
        if !self.is_valid(coordinate) {
            return Vec2::ZERO;
        }

        let configuration = &self.configuration;
        let x = configuration.offset_left
            + coordinate.column() as f32 * configuration.cell_width
            + configuration.cell_width * 0.5;
        let y = -(configuration.offset_top
            + coordinate.row() as f32 * configuration.cell_height
            + configuration.cell_height * 0.5);
        Vec2::new(x, y)
    }

    /// Neighbour of the cell in the provided direction, if it lies inside the grid.
    #[must_use]
    pub fn adjacent(
        &self,
        coordinate: GridCoordinate,
        direction: GridDirection,
    ) -> Option<GridCoordinate> {
        let neighbour = coordinate.step(direction);
        self.is_valid(neighbour).then_some(neighbour)
    }

    /// All eight neighbours ordered north, then clockwise.
    #[must_use]
    pub fn all_adjacent(&self, coordinate: GridCoordinate) -> [Option<GridCoordinate>; 8] {
        GridDirection::ALL.map(|direction| self.adjacent(coordinate, direction))
    }

    /// Valid cells within `radius` Manhattan steps of `center`, the centre included.
    #[must_use]
    pub fn cells_in_radius(&self, center: GridCoordinate, radius: u32) -> Vec<GridCoordinate> {
        let reach = radius.min(self.width().max(self.height()));
        let reach = i32::try_from(reach).unwrap_or(i32::MAX);

        let mut cells = Vec::new();
        for delta_row in -reach..=reach {
            for delta_column in -reach..=reach {
                let candidate = center.offset(delta_row, delta_column);
                if self.is_valid(candidate) && center.manhattan_distance(candidate) <= radius {
                    cells.push(candidate);
                }
            }
        }
        cells
    }

    /// Valid cells in the inclusive rectangle spanned by two corners.
    #[must_use]
    pub fn cells_in_square_area(
        &self,
        corner: GridCoordinate,
        opposite: GridCoordinate,
    ) -> Vec<GridCoordinate> {
        let rows = corner.row().min(opposite.row())..=corner.row().max(opposite.row());
        let columns =
            corner.column().min(opposite.column())..=corner.column().max(opposite.column());

        rows.flat_map(|row| {
            columns
                .clone()
                .map(move |column| GridCoordinate::new(row, column))
        })
        .filter(|cell| self.is_valid(*cell))
        .collect()
    }

    /// Ordered Bresenham line between two cells, both endpoints included.
    ///
    /// Returns an empty line when either endpoint lies outside the grid.
    #[must_use]
    pub fn cells_in_line(&self, start: GridCoordinate, end: GridCoordinate) -> Vec<GridCoordinate> {
        if !self.is_valid(start) || !self.is_valid(end) {
            return Vec::new();
        }

        let delta_row = (end.row() - start.row()).abs();
        let delta_column = (end.column() - start.column()).abs();
        let row_step = if start.row() < end.row() { 1 } else { -1 };
        let column_step = if start.column() < end.column() { 1 } else { -1 };

        let mut error = delta_row - delta_column;
        let mut current = start;
        let mut cells = Vec::new();

        loop {
            cells.push(current);
            if current == end {
                break;
            }

            let doubled = 2 * error;
            if doubled > -delta_column {
                error -= delta_column;
                current = current.offset(row_step, 0);
            }
            if doubled < delta_row {
                error += delta_row;
                current = current.offset(0, column_step);
            }
        }

        cells
    }

    /// Cells on the outer ring of the grid, each listed once.
    #[must_use]
    pub fn border_cells(&self) -> Vec<GridCoordinate> {
        let last_row = i32::try_from(self.height()).unwrap_or(i32::MAX) - 1;
        let last_column = i32::try_from(self.width()).unwrap_or(i32::MAX) - 1;

        self.cells_in_square_area(
            GridCoordinate::new(0, 0),
            GridCoordinate::new(last_row, last_column),
        )
        .into_iter()
        .filter(|cell| {
            cell.row() == 0
                || cell.column() == 0
                || cell.row() == last_row
                || cell.column() == last_column
        })
        .collect()
    }

    /// World positions that spread `count` occupants evenly across a cell.
    ///
    /// A single occupant sits at the centre. Larger groups are laid out in a
    /// horizontal row through the centre. Counts outside
    /// `1..=MAX_OBJECTS_PER_CELL` and invalid cells yield no positions.
    #[must_use]
    pub fn multi_cell_positions(&self, coordinate: GridCoordinate, count: usize) -> Vec<Vec2> {
        if count == 0 || count > MAX_OBJECTS_PER_CELL || !self.is_valid(coordinate) {
            return Vec::new();
        }

        let center = self.coordinate_to_world_center(coordinate);
        if count == 1 {
            return vec![center];
        }

        let cell_width = self.configuration.cell_width;
        let spacing = cell_width / (count as f32 + 1.0);
        let start_x = center.x - cell_width * 0.5 + spacing;
        (0..count)
            .map(|index| Vec2::new(start_x + index as f32 * spacing, center.y))
            .collect()
    }

    /// Coarse distance between two cell centres, scaled down by the grid width
    /// and rounded to the nearest whole number.
    #[must_use]
    pub fn grid_distance(&self, from: GridCoordinate, to: GridCoordinate) -> u32 {
        let width = self.width().max(1) as f32;
        let distance = self
            .coordinate_to_world_center(from)
            .distance(self.coordinate_to_world_center(to));
        (distance / width).round() as u32
    }
}

impl Default for GridSystem {
    fn default() -> Self {
        Self::new(GridConfiguration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridSystem {
        GridSystem::default()
    }

    #[test]
    fn default_configuration_is_ten_by_ten_unit_cells() {
        let configuration = GridConfiguration::default();
        assert_eq!(configuration.width, 10);
        assert_eq!(configuration.height, 10);
        assert_eq!(configuration.total_cells(), 100);
        assert!((configuration.total_width() - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn world_round_trip_holds_for_every_valid_cell() {
        let grid = GridSystem::new(GridConfiguration {
            width: 7,
            height: 5,
            cell_width: 1.5,
            cell_height: 0.75,
            offset_left: -3.0,
            offset_top: 2.0,
        });

        for index in 0..35 {
            let cell = grid.coordinate_from_linear_index(index);
            let center = grid.coordinate_to_world_center(cell);
            assert_eq!(
                grid.world_to_coordinate(center),
                Some(cell),
                "centre of {cell} must map back to the same cell"
            );
            assert_eq!(grid.linear_index(cell), Some(index));
        }
    }

    #[test]
    fn world_to_coordinate_floors_instead_of_rounding() {
        let grid = grid();
        assert_eq!(
            grid.world_to_coordinate(Vec2::new(0.99, -0.01)),
            Some(GridCoordinate::new(0, 0))
        );
        assert_eq!(
            grid.world_to_coordinate(Vec2::new(1.0, -1.0)),
            Some(GridCoordinate::new(1, 1))
        );
        assert_eq!(grid.world_to_coordinate(Vec2::new(-0.01, -0.5)), None);
        assert_eq!(grid.world_to_coordinate(Vec2::new(0.5, 0.5)), None);
        assert_eq!(grid.world_to_coordinate(Vec2::new(f32::NAN, -0.5)), None);
    }

    #[test]
    fn invalid_cells_map_to_origin_and_sentinel() {
        let grid = grid();
        assert_eq!(
            grid.coordinate_to_world_center(GridCoordinate::new(10, 0)),
            Vec2::ZERO
        );
        assert_eq!(
            grid.coordinate_from_linear_index(100),
            GridCoordinate::INVALID
        );
        assert_eq!(grid.linear_index(GridCoordinate::new(-1, 3)), None);
    }

    #[test]
    fn adjacency_drops_cells_outside_the_grid() {
        let grid = grid();
        let corner = grid.all_adjacent(GridCoordinate::new(0, 0));
        let present: Vec<_> = corner.into_iter().flatten().collect();
        assert_eq!(
            present,
            vec![
                GridCoordinate::new(0, 1),
                GridCoordinate::new(1, 1),
                GridCoordinate::new(1, 0),
            ]
        );
        assert_eq!(
            grid.adjacent(GridCoordinate::new(5, 5), GridDirection::NorthWest),
            Some(GridCoordinate::new(4, 4))
        );
    }

    #[test]
    fn cells_in_radius_form_a_diamond() {
        let grid = grid();
        let cells = grid.cells_in_radius(GridCoordinate::new(5, 5), 2);
        assert_eq!(cells.len(), 13);
        assert!(cells.contains(&GridCoordinate::new(5, 5)));
        assert!(!cells.contains(&GridCoordinate::new(3, 4)));

        let clipped = grid.cells_in_radius(GridCoordinate::new(0, 0), 1);
        assert_eq!(clipped.len(), 3);
    }

    #[test]
    fn diagonal_line_visits_each_diagonal_cell() {
        let grid = grid();
        let line = grid.cells_in_line(GridCoordinate::new(0, 0), GridCoordinate::new(3, 3));
        assert_eq!(
            line,
            vec![
                GridCoordinate::new(0, 0),
                GridCoordinate::new(1, 1),
                GridCoordinate::new(2, 2),
                GridCoordinate::new(3, 3),
            ]
        );
    }

    #[test]
    fn line_is_empty_for_invalid_endpoints() {
        let grid = grid();
        assert!(grid
            .cells_in_line(GridCoordinate::new(0, 0), GridCoordinate::new(0, 10))
            .is_empty());
    }

    #[test]
    fn shallow_line_is_contiguous() {
        let grid = grid();
        let line = grid.cells_in_line(GridCoordinate::new(2, 0), GridCoordinate::new(4, 7));
        assert_eq!(line.first(), Some(&GridCoordinate::new(2, 0)));
        assert_eq!(line.last(), Some(&GridCoordinate::new(4, 7)));
        for pair in line.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn border_lists_perimeter_once() {
        let grid = grid();
        let border = grid.border_cells();
        assert_eq!(border.len(), 36);
        assert!(!border.contains(&GridCoordinate::new(1, 1)));
    }

    #[test]
    fn multi_positions_spread_across_the_cell() {
        let grid = grid();
        let cell = GridCoordinate::new(0, 0);
        assert_eq!(
            grid.multi_cell_positions(cell, 1),
            vec![Vec2::new(0.5, -0.5)]
        );

        let three = grid.multi_cell_positions(cell, 3);
        assert_eq!(three.len(), 3);
        assert!((three[0].x - 0.25).abs() < 1e-6);
        assert!((three[1].x - 0.5).abs() < 1e-6);
        assert!((three[2].x - 0.75).abs() < 1e-6);

        assert!(grid.multi_cell_positions(cell, 0).is_empty());
        assert!(grid
            .multi_cell_positions(cell, MAX_OBJECTS_PER_CELL + 1)
            .is_empty());
    }

    #[test]
    fn grid_distance_scales_by_width() {
        let grid = grid();
        assert_eq!(
            grid.grid_distance(GridCoordinate::new(0, 0), GridCoordinate::new(0, 9)),
            1
        );
        assert_eq!(
            grid.grid_distance(GridCoordinate::new(0, 0), GridCoordinate::new(0, 4)),
            0
        );
    }
}
