#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the turngrid engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the turn-driving systems. Actors submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing exactly what changed. Everything else observes the world through
//! read-only queries and the snapshot types declared here.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of elements that may share a single map cell.
pub const MAX_OBJECTS_PER_CELL: usize = 4;

/// Location of a single grid cell expressed as row and column indices.
///
/// Coordinates are signed so that neighbour arithmetic near the grid edge
/// produces out-of-range values rather than wrapping. Validity is always
/// judged against a grid's dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoordinate {
    row: i32,
    column: i32,
}

impl GridCoordinate {
    /// Sentinel describing "no cell".
    pub const INVALID: Self = Self::new(-1, -1);

    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell. Rows grow downward.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Reports whether the coordinate lies inside a grid of the given size.
    #[must_use]
    pub const fn is_valid(&self, width: u32, height: u32) -> bool {
        self.row >= 0
            && self.column >= 0
            && (self.row as i64) < height as i64
            && (self.column as i64) < width as i64
    }

    /// Row-major linear index of the coordinate within a grid of `width` columns.
    #[must_use]
    pub const fn linear_index(&self, width: u32) -> i64 {
        self.row as i64 * width as i64 + self.column as i64
    }

    /// Returns the coordinate shifted by the provided row and column deltas.
    #[must_use]
    pub const fn offset(self, delta_row: i32, delta_column: i32) -> Self {
        Self::new(
            self.row.saturating_add(delta_row),
            self.column.saturating_add(delta_column),
        )
    }

    /// Returns the neighbouring coordinate in the provided direction.
    #[must_use]
    pub const fn step(self, direction: GridDirection) -> Self {
        let (delta_row, delta_column) = direction.delta();
        self.offset(delta_row, delta_column)
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoordinate) -> u32 {
        self.row
            .abs_diff(other.row)
            .saturating_add(self.column.abs_diff(other.column))
    }

    /// Computes the Chebyshev (king-move) distance between two coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: GridCoordinate) -> u32 {
        self.row
            .abs_diff(other.row)
            .max(self.column.abs_diff(other.column))
    }

    /// Computes the straight-line distance between two coordinates in cells.
    #[must_use]
    pub fn euclidean_distance(self, other: GridCoordinate) -> f32 {
        let rows = self.row.abs_diff(other.row) as f32;
        let columns = self.column.abs_diff(other.column) as f32;
        rows.hypot(columns)
    }

    /// Reports whether `other` is one of the eight neighbours of this cell.
    #[must_use]
    pub fn is_adjacent(self, other: GridCoordinate) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }

    /// Reports whether `other` touches this cell only by a corner.
    #[must_use]
    pub fn is_diagonally_adjacent(self, other: GridCoordinate) -> bool {
        self.row.abs_diff(other.row) == 1 && self.column.abs_diff(other.column) == 1
    }

    /// Reports whether `other` shares an edge with this cell.
    #[must_use]
    pub fn is_orthogonally_adjacent(self, other: GridCoordinate) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Compass direction that best describes the step from this cell toward `other`.
    ///
    /// Identical coordinates report [`GridDirection::North`].
    #[must_use]
    pub fn direction_to(self, other: GridCoordinate) -> GridDirection {
        let delta_row = (other.row - self.row).signum();
        let delta_column = (other.column - self.column).signum();
        GridDirection::ALL
            .into_iter()
            .find(|direction| direction.delta() == (delta_row, delta_column))
            .unwrap_or(GridDirection::North)
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// The eight compass directions used for neighbour lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridDirection {
    /// Toward decreasing row indices.
    North,
    /// Toward decreasing rows and increasing columns.
    NorthEast,
    /// Toward increasing column indices.
    East,
    /// Toward increasing rows and columns.
    SouthEast,
    /// Toward increasing row indices.
    South,
    /// Toward increasing rows and decreasing columns.
    SouthWest,
    /// Toward decreasing column indices.
    West,
    /// Toward decreasing rows and columns.
    NorthWest,
}

impl GridDirection {
    /// Every direction in clockwise order starting at north.
    pub const ALL: [GridDirection; 8] = [
        GridDirection::North,
        GridDirection::NorthEast,
        GridDirection::East,
        GridDirection::SouthEast,
        GridDirection::South,
        GridDirection::SouthWest,
        GridDirection::West,
        GridDirection::NorthWest,
    ];

    /// Row and column delta applied by a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            GridDirection::North => (-1, 0),
            GridDirection::NorthEast => (-1, 1),
            GridDirection::East => (0, 1),
            GridDirection::SouthEast => (1, 1),
            GridDirection::South => (1, 0),
            GridDirection::SouthWest => (1, -1),
            GridDirection::West => (0, -1),
            GridDirection::NorthWest => (-1, -1),
        }
    }
}

/// Direction a character faces or looks toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewDirection {
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
}

impl ViewDirection {
    /// Horizontal mirror of the direction. Vertical directions are unchanged.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            ViewDirection::Left => ViewDirection::Right,
            ViewDirection::Right => ViewDirection::Left,
            other => other,
        }
    }
}

impl fmt::Display for ViewDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewDirection::Left => "left",
            ViewDirection::Right => "right",
            ViewDirection::Up => "up",
            ViewDirection::Down => "down",
        };
        f.write_str(label)
    }
}

impl FromStr for ViewDirection {
    type Err = ParseNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(ViewDirection::Left),
            "right" => Ok(ViewDirection::Right),
            "up" => Ok(ViewDirection::Up),
            "down" => Ok(ViewDirection::Down),
            _ => Err(ParseNameError::new("direction", value)),
        }
    }
}

/// Unique identifier assigned to a map element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u32);

impl ElementId {
    /// Creates a new element identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad category of a map element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A player- or agent-controlled actor.
    Character,
    /// A collectable object.
    Item,
    /// Static scenery that may block movement or vision.
    Obstacle,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElementKind::Character => "Character",
            ElementKind::Item => "Item",
            ElementKind::Obstacle => "Obstacle",
        };
        f.write_str(label)
    }
}

/// Kinds of items a character may carry. Inventories hold at most one of each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    /// Opens things.
    Key,
    /// Currency.
    Money,
    /// Food.
    Apple,
}

impl ItemType {
    /// Every item type in slot order.
    pub const ALL: [ItemType; 3] = [ItemType::Key, ItemType::Money, ItemType::Apple];

    /// Zero-based inventory slot reserved for the item type.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            ItemType::Key => 0,
            ItemType::Money => 1,
            ItemType::Apple => 2,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemType::Key => "Key",
            ItemType::Money => "Money",
            ItemType::Apple => "Apple",
        };
        f.write_str(label)
    }
}

impl FromStr for ItemType {
    type Err = ParseNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|item_type| item_type.to_string().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseNameError::new("item type", value))
    }
}

/// Presets that control how an obstacle interacts with movement and vision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleType {
    /// Blocks both movement and vision.
    Wall,
    /// Blocks neither movement nor vision.
    Decoration,
}

/// Failure to interpret a textual name as one of the closed vocabularies above.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {vocabulary} '{value}'")]
pub struct ParseNameError {
    vocabulary: &'static str,
    value: String,
}

impl ParseNameError {
    fn new(vocabulary: &'static str, value: &str) -> Self {
        Self {
            vocabulary,
            value: value.to_owned(),
        }
    }

    /// Text that failed to parse.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Tunable limits for actions that characters perform on each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Maximum Manhattan distance between attacker and target.
    pub attack_range: u32,
    /// Health removed from a character by one attack.
    pub attack_damage: i32,
    /// Characters strictly closer than this Manhattan distance hear a speaker.
    pub talk_range: u32,
    /// Maximum world-space distance between the giver's and receiver's cell centres.
    pub give_range: u32,
    /// Actions a human player may take per turn.
    pub action_points: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            attack_range: 1,
            attack_damage: 10,
            talk_range: 3,
            give_range: 1,
            action_points: 3,
        }
    }
}

/// Declarative description of an element to be placed on the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementBlueprint {
    /// Identifier the element will be registered under.
    pub id: ElementId,
    /// Human-readable name shown in logs and observations.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: String,
    /// Row-major linear index of the cell the element starts in.
    pub linear_index: u32,
    /// Overrides the kind's default vision distance.
    #[serde(default)]
    pub vision_distance: Option<u32>,
    /// Kind-specific attributes.
    #[serde(flatten)]
    pub traits: ElementTraits,
}

/// Kind-specific attributes carried by an [`ElementBlueprint`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementTraits {
    /// Attributes of a character.
    Character(CharacterTraits),
    /// Attributes of an item.
    Item(ItemTraits),
    /// Attributes of an obstacle.
    Obstacle(ObstacleTraits),
}

impl ElementTraits {
    /// Kind of element described by the traits.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            ElementTraits::Character(_) => ElementKind::Character,
            ElementTraits::Item(_) => ElementKind::Item,
            ElementTraits::Obstacle(_) => ElementKind::Obstacle,
        }
    }
}

/// Character attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTraits {
    /// Upper bound for health.
    pub max_health: i32,
    /// Starting health. Defaults to `max_health` when absent.
    pub health: Option<i32>,
    /// Cells per second used by presentation layers. Clamped to at least 0.1.
    pub movement_speed: f32,
    /// Whether the character starts able to move.
    pub can_move: bool,
    /// Whether a human drives the character.
    pub player_controlled: bool,
}

impl Default for CharacterTraits {
    fn default() -> Self {
        Self {
            max_health: 100,
            health: None,
            movement_speed: 1.0,
            can_move: true,
            player_controlled: false,
        }
    }
}

/// Item attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTraits {
    /// Inventory slot the item occupies.
    pub item_type: ItemType,
    /// Whether characters may pick the item up.
    pub collectable: bool,
    /// Maximum world-space distance a collector may stand from the item.
    pub pickup_range: u32,
}

impl Default for ItemTraits {
    fn default() -> Self {
        Self {
            item_type: ItemType::Apple,
            collectable: true,
            pickup_range: 1,
        }
    }
}

/// Obstacle attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTraits {
    /// Preset applied on creation. Overrides the blocking flags when present.
    pub obstacle_type: Option<ObstacleType>,
    /// Whether the obstacle prevents characters from entering its cell.
    pub blocks_movement: bool,
    /// Whether the obstacle is opaque.
    pub blocks_vision: bool,
    /// Whether damage can wear the obstacle down.
    pub destructible: bool,
    /// Upper bound for durability.
    pub max_durability: i32,
    /// Force required to shatter the obstacle in one blow.
    pub destruction_force: f32,
}

impl Default for ObstacleTraits {
    fn default() -> Self {
        Self {
            obstacle_type: None,
            blocks_movement: true,
            blocks_vision: false,
            destructible: false,
            max_durability: 100,
            destruction_force: 50.0,
        }
    }
}

/// Dimensions and placement of the grid in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfiguration {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Horizontal extent of one cell in world units.
    pub cell_width: f32,
    /// Vertical extent of one cell in world units.
    pub cell_height: f32,
    /// World-space x of the grid's left edge.
    pub offset_left: f32,
    /// Distance of the grid's top edge below the world origin.
    pub offset_top: f32,
}

impl Default for GridConfiguration {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            cell_width: 1.0,
            cell_height: 1.0,
            offset_left: 0.0,
            offset_top: 0.0,
        }
    }
}

impl GridConfiguration {
    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn is_valid(&self, coordinate: GridCoordinate) -> bool {
        coordinate.is_valid(self.width, self.height)
    }

    /// Number of cells in the grid.
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Horizontal extent of the whole grid in world units.
    #[must_use]
    pub fn total_width(&self) -> f32 {
        self.width as f32 * self.cell_width
    }

    /// Vertical extent of the whole grid in world units.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.height as f32 * self.cell_height
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the grid with new dimensions, discarding every element.
    ConfigureGrid {
        /// Geometry of the new grid.
        configuration: GridConfiguration,
    },
    /// Replaces the action limits used to validate attacks, talk and gifts.
    ConfigureRules {
        /// Limits to adopt.
        rules: GameRules,
    },
    /// Advances the logical clock used to stamp interaction histories.
    Tick,
    /// Places a new element on the map.
    RegisterElement {
        /// Description of the element.
        blueprint: ElementBlueprint,
    },
    /// Removes an element from the map.
    UnregisterElement {
        /// Element to remove.
        id: ElementId,
    },
    /// Relocates an element to another cell.
    MoveElement {
        /// Element to move.
        id: ElementId,
        /// Destination cell.
        to: GridCoordinate,
    },
    /// Lets one element interact with another.
    Interact {
        /// Element initiating the interaction.
        actor: ElementId,
        /// Element being interacted with.
        target: ElementId,
    },
    /// Heals (positive) or damages (negative) a character.
    ModifyHealth {
        /// Character affected.
        id: ElementId,
        /// Signed health delta.
        amount: i32,
    },
    /// Awards experience to a character.
    AddExperience {
        /// Character affected.
        id: ElementId,
        /// Experience gained.
        amount: u32,
    },
    /// Locks or unlocks a character's movement.
    SetCanMove {
        /// Character affected.
        id: ElementId,
        /// New mobility flag.
        can_move: bool,
    },
    /// Turns a character toward a direction.
    SetFacing {
        /// Character affected.
        id: ElementId,
        /// New facing.
        facing: ViewDirection,
    },
    /// Mirrors a character's facing horizontally.
    Flip {
        /// Character affected.
        id: ElementId,
    },
    /// Changes how far an element can see.
    SetVisionDistance {
        /// Element affected.
        id: ElementId,
        /// New vision distance in cells.
        distance: u32,
    },
    /// Wears down an obstacle.
    DamageObstacle {
        /// Obstacle affected.
        id: ElementId,
        /// Durability removed.
        amount: i32,
    },
    /// Restores an obstacle's durability.
    RepairObstacle {
        /// Obstacle affected.
        id: ElementId,
        /// Durability restored.
        amount: i32,
    },
    /// Applies an obstacle preset.
    SetObstacleType {
        /// Obstacle affected.
        id: ElementId,
        /// Preset to apply.
        obstacle_type: ObstacleType,
    },
    /// Toggles whether an obstacle blocks movement.
    SetBlocksMovement {
        /// Obstacle affected.
        id: ElementId,
        /// New blocking flag.
        blocks: bool,
    },
    /// Toggles whether an item may be collected.
    SetCollectable {
        /// Item affected.
        id: ElementId,
        /// New collectable flag.
        collectable: bool,
    },
    /// Moves an item from the map into a character's inventory.
    PickupItem {
        /// Character collecting the item.
        character: ElementId,
        /// Item being collected.
        item: ElementId,
    },
    /// Places an inventory item back on the map at the character's cell.
    DropItem {
        /// Character dropping the item.
        character: ElementId,
        /// Slot to empty.
        item_type: ItemType,
    },
    /// Transfers an inventory item between two characters.
    GiveItem {
        /// Character giving the item.
        from: ElementId,
        /// Character receiving the item.
        to: ElementId,
        /// Slot to transfer.
        item_type: ItemType,
    },
    /// Strikes a character or destructible obstacle within attack range.
    Attack {
        /// Character attacking.
        attacker: ElementId,
        /// Element being attacked.
        target: ElementId,
    },
    /// Broadcasts a message to nearby characters.
    Talk {
        /// Character speaking.
        speaker: ElementId,
        /// Spoken text.
        message: String,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the logical clock advanced.
    TimeAdvanced {
        /// Clock value after the tick.
        tick: u64,
    },
    /// Confirms that the grid was rebuilt.
    GridConfigured {
        /// Number of columns.
        width: u32,
        /// Number of rows.
        height: u32,
    },
    /// Confirms that an element was placed on the map.
    ElementRegistered {
        /// Element placed.
        id: ElementId,
        /// Kind of the element.
        kind: ElementKind,
        /// Cell the element occupies.
        at: GridCoordinate,
    },
    /// Reports that an element could not be placed.
    RegistrationRejected {
        /// Element that was refused.
        id: ElementId,
        /// Reason for the refusal.
        reason: NavigationError,
    },
    /// Confirms that an element left the map.
    ElementUnregistered {
        /// Element removed.
        id: ElementId,
        /// Cell the element occupied.
        from: GridCoordinate,
    },
    /// Confirms that an element moved between two cells.
    ElementMoved {
        /// Element moved.
        id: ElementId,
        /// Cell occupied before the move.
        from: GridCoordinate,
        /// Cell occupied after the move.
        to: GridCoordinate,
    },
    /// Reports that a move was refused and nothing changed.
    MoveRejected {
        /// Element that attempted to move.
        id: ElementId,
        /// Requested destination.
        to: GridCoordinate,
        /// Reason for the refusal.
        reason: NavigationError,
    },
    /// Confirms that an interaction took place.
    Interacted {
        /// Element initiating the interaction.
        actor: ElementId,
        /// Element interacted with.
        target: ElementId,
    },
    /// Reports that an item was collected by touch and removed from play.
    ItemCollected {
        /// Item collected.
        item: ElementId,
        /// Character that touched the item.
        collector: ElementId,
    },
    /// Reports a change in a character's health.
    HealthChanged {
        /// Character affected.
        id: ElementId,
        /// Health before the change.
        previous: i32,
        /// Health after the change.
        current: i32,
    },
    /// Reports that a character's health reached zero.
    CharacterDefeated {
        /// Character defeated.
        id: ElementId,
    },
    /// Reports experience gained by a character.
    ExperienceGained {
        /// Character affected.
        id: ElementId,
        /// Experience awarded.
        amount: u32,
        /// Experience total after the award.
        total: u32,
    },
    /// Reports a change in a character's mobility.
    MobilityChanged {
        /// Character affected.
        id: ElementId,
        /// New mobility flag.
        can_move: bool,
    },
    /// Reports a change in a character's facing.
    FacingChanged {
        /// Character affected.
        id: ElementId,
        /// New facing.
        facing: ViewDirection,
    },
    /// Reports a change in an element's vision distance.
    VisionChanged {
        /// Element affected.
        id: ElementId,
        /// New vision distance.
        distance: u32,
    },
    /// Reports a change in an obstacle's durability.
    DurabilityChanged {
        /// Obstacle affected.
        id: ElementId,
        /// Durability before the change.
        previous: i32,
        /// Durability after the change.
        current: i32,
    },
    /// Reports that an indestructible obstacle shrugged off damage.
    DamageIgnored {
        /// Obstacle affected.
        id: ElementId,
    },
    /// Reports that an obstacle's durability reached zero and it left the map.
    ObstacleDestroyed {
        /// Obstacle destroyed.
        id: ElementId,
    },
    /// Reports a change in a cell's traversability.
    TraversabilityChanged {
        /// Cell affected.
        at: GridCoordinate,
        /// New traversability.
        traversable: bool,
    },
    /// Reports a change in an item's collectable flag.
    CollectableChanged {
        /// Item affected.
        id: ElementId,
        /// New collectable flag.
        collectable: bool,
    },
    /// Confirms that an item moved from the map into an inventory.
    ItemPickedUp {
        /// Character collecting the item.
        character: ElementId,
        /// Item collected.
        item: ElementId,
        /// Inventory slot filled.
        item_type: ItemType,
    },
    /// Confirms that an inventory item was placed back on the map.
    ItemDropped {
        /// Character dropping the item.
        character: ElementId,
        /// Item dropped.
        item: ElementId,
        /// Inventory slot emptied.
        item_type: ItemType,
        /// Cell the item now occupies.
        at: GridCoordinate,
    },
    /// Confirms that an item changed hands.
    ItemGiven {
        /// Character giving the item.
        from: ElementId,
        /// Character receiving the item.
        to: ElementId,
        /// Item transferred.
        item: ElementId,
        /// Inventory slot transferred.
        item_type: ItemType,
    },
    /// Reports that an inventory operation was refused and nothing changed.
    InventoryRejected {
        /// Character whose request was refused.
        character: ElementId,
        /// Reason for the refusal.
        reason: InventoryError,
    },
    /// Confirms that an attack landed.
    Attacked {
        /// Character attacking.
        attacker: ElementId,
        /// Element struck.
        target: ElementId,
        /// Damage dealt.
        damage: i32,
    },
    /// Reports that an action was refused and nothing changed.
    ActionRejected {
        /// Element whose request was refused.
        actor: ElementId,
        /// Reason for the refusal.
        reason: ActionError,
    },
    /// Confirms that a message was spoken.
    MessageSpoken {
        /// Character speaking.
        speaker: ElementId,
        /// Spoken text.
        message: String,
        /// Characters close enough to hear.
        listeners: Vec<ElementId>,
    },
}

/// Reasons the world may refuse to place or move an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum NavigationError {
    /// The destination lies outside the grid.
    #[error("destination is outside the grid")]
    InvalidCoordinate,
    /// The destination cell is not traversable.
    #[error("destination is not traversable")]
    Blocked,
    /// The element is not registered with the map.
    #[error("element is not on the map")]
    NotRegistered,
    /// The element is a character that cannot currently move.
    #[error("element cannot move")]
    Immobile,
    /// The destination cell already hosts the maximum number of elements.
    #[error("destination cell is full")]
    CellFull,
    /// An element with the same identifier is already registered.
    #[error("element is already on the map")]
    AlreadyRegistered,
}

/// Reasons the world may refuse an inventory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum InventoryError {
    /// The inventory already holds an item of that type.
    #[error("inventory already holds a {0}")]
    SlotOccupied(ItemType),
    /// The inventory holds no item of that type.
    #[error("inventory holds no {0}")]
    MissingItem(ItemType),
    /// The item may not be collected.
    #[error("item cannot be collected")]
    NotCollectable,
    /// The item or receiver is too far away.
    #[error("target is out of range")]
    OutOfRange,
    /// No registered element carries the identifier.
    #[error("element {0} does not exist")]
    UnknownElement(ElementId),
    /// The element is not a character.
    #[error("element {0} is not a character")]
    NotACharacter(ElementId),
    /// The element is not an item.
    #[error("element {0} is not an item")]
    NotAnItem(ElementId),
    /// A character attempted to give an item to itself.
    #[error("cannot give an item to yourself")]
    SelfTarget,
    /// The character's cell has no room for the dropped item.
    #[error("no room to drop the item here")]
    NoRoom,
}

/// Reasons the world may refuse an attack or a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ActionError {
    /// No registered element carries the identifier.
    #[error("element {0} does not exist")]
    UnknownElement(ElementId),
    /// The acting element is not a character.
    #[error("element {0} is not a character")]
    NotACharacter(ElementId),
    /// A character attempted to target itself.
    #[error("cannot target yourself")]
    SelfTarget,
    /// The target is further away than the rules allow.
    #[error("target is out of range")]
    OutOfRange,
    /// The target cannot be attacked.
    #[error("element {0} cannot be attacked")]
    InvalidTarget(ElementId),
    /// The message was empty.
    #[error("message is empty")]
    EmptyMessage,
    /// The acting character has been defeated.
    #[error("character is defeated")]
    Defeated,
}

/// Outcome of a vision query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionResult {
    /// Direction scanned, or `None` for an all-around scan.
    pub direction: Option<ViewDirection>,
    /// Cell the scan originated from.
    pub observer: GridCoordinate,
    /// Maximum distance scanned.
    pub range: u32,
    /// Elements detected, in scan order.
    pub visible_elements: Vec<ElementId>,
    /// Cells inspected, in scan order.
    pub scanned_cells: Vec<GridCoordinate>,
}

impl VisionResult {
    /// Creates an empty result for a scan from `observer`.
    #[must_use]
    pub fn new(direction: Option<ViewDirection>, observer: GridCoordinate, range: u32) -> Self {
        Self {
            direction,
            observer,
            range,
            visible_elements: Vec::new(),
            scanned_cells: Vec::new(),
        }
    }

    /// Reports whether the scan detected anything.
    #[must_use]
    pub fn has_elements(&self) -> bool {
        !self.visible_elements.is_empty()
    }

    /// Number of elements detected.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.visible_elements.len()
    }
}

/// Read-only description of a registered element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Identifier of the element.
    pub id: ElementId,
    /// Kind of the element.
    pub kind: ElementKind,
    /// Human-readable name.
    pub name: String,
    /// Cell the element occupies.
    pub coordinate: GridCoordinate,
    /// Vision distance in cells.
    pub vision_distance: u32,
    /// Short kind-specific status line.
    pub status: String,
}
