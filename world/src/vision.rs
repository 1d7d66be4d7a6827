//! Read-only visibility queries over the world.
//!
//! Directional scans sweep whole columns (for left and right) or whole rows
//! (for up and down) outward from the observer, so they report everything in
//! a widening band rather than along a single ray. An element is reported
//! when its own vision distance reaches back to the observer.

use turngrid_core::{ElementId, GridCoordinate, ViewDirection, VisionResult};

use crate::{query, Element, MapElement, World};

/// Sweeps the grid from `observer` in `direction`, one full column or row per
/// step, for offsets `0..=max_range` or until the grid edge.
///
/// Elements in the observer's own column or row are included.
#[must_use]
pub fn directional_vision(
    world: &World,
    observer: GridCoordinate,
    direction: ViewDirection,
    max_range: u32,
) -> VisionResult {
    let mut result = VisionResult::new(Some(direction), observer, max_range);
    let grid = query::grid(world);
    if !grid.is_valid(observer) {
        return result;
    }

    let horizontal = matches!(direction, ViewDirection::Left | ViewDirection::Right);
    let sign = match direction {
        ViewDirection::Left | ViewDirection::Up => -1,
        ViewDirection::Right | ViewDirection::Down => 1,
    };
    let span = if horizontal {
        grid.height()
    } else {
        grid.width()
    };
    let span = i32::try_from(span).unwrap_or(i32::MAX);

    for offset in 0..=max_range {
        let Ok(offset) = i32::try_from(offset) else {
            break;
        };
        let line = if horizontal {
            observer.column() + offset * sign
        } else {
            observer.row() + offset * sign
        };

        let mut scanned_any = false;
        for across in 0..span {
            let cell = if horizontal {
                GridCoordinate::new(across, line)
            } else {
                GridCoordinate::new(line, across)
            };
            if !grid.is_valid(cell) {
                break;
            }
            scanned_any = true;
            scan_cell(world, observer, cell, None, &mut result);
        }
        if !scanned_any {
            break;
        }
    }

    result
}

/// Scans every cell within `range` Manhattan steps of `observer`, its own
/// cell excluded, skipping the element named by `exclude`.
#[must_use]
pub fn radius_vision(
    world: &World,
    observer: GridCoordinate,
    range: u32,
    exclude: Option<ElementId>,
) -> VisionResult {
    let mut result = VisionResult::new(None, observer, range);
    let grid = query::grid(world);
    if !grid.is_valid(observer) {
        return result;
    }

    for cell in grid.cells_in_radius(observer, range) {
        if cell == observer {
            continue;
        }
        scan_cell(world, observer, cell, exclude, &mut result);
    }
    result
}

/// Everything the element can perceive around itself.
#[must_use]
pub fn element_vision(world: &World, id: ElementId) -> Option<VisionResult> {
    let element = query::element(world, id)?;
    Some(radius_vision(
        world,
        element.coordinate(),
        element.vision_distance(),
        Some(id),
    ))
}

/// Directional scan from the element's cell up to its vision distance. The
/// element itself is left out of the result.
#[must_use]
pub fn look_in_direction(
    world: &World,
    id: ElementId,
    direction: ViewDirection,
) -> Option<VisionResult> {
    let element = query::element(world, id)?;
    let mut result = directional_vision(
        world,
        element.coordinate(),
        direction,
        element.vision_distance(),
    );
    result.visible_elements.retain(|visible| *visible != id);
    Some(result)
}

/// Directional scan in the way a character is facing.
#[must_use]
pub fn look_forward(world: &World, id: ElementId) -> Option<VisionResult> {
    let facing = query::character(world, id)?.facing();
    look_in_direction(world, id, facing)
}

/// Elements an observer with the given range would see from `observer`.
#[must_use]
pub fn elements_visible_from(
    world: &World,
    observer: GridCoordinate,
    range: u32,
) -> Vec<ElementId> {
    radius_vision(world, observer, range, None).visible_elements
}

/// Mutual visibility: both elements must see at least as far as the
/// Manhattan distance between them.
#[must_use]
pub fn can_element_see_element(world: &World, observer: ElementId, target: ElementId) -> bool {
    let (Some(first), Some(second)) = (
        query::element(world, observer),
        query::element(world, target),
    ) else {
        return false;
    };
    let distance = first.coordinate().manhattan_distance(second.coordinate());
    distance <= first.vision_distance() && distance <= second.vision_distance()
}

fn scan_cell(
    world: &World,
    observer: GridCoordinate,
    cell: GridCoordinate,
    exclude: Option<ElementId>,
    result: &mut VisionResult,
) {
    result.scanned_cells.push(cell);
    let distance = observer.manhattan_distance(cell);
    result.visible_elements.extend(
        query::elements_at(world, cell)
            .filter(|element| Some(element.id()) != exclude)
            .filter(|element| element.vision_distance() >= distance)
            .map(Element::id),
    );
}
