//! Map elements: the shared element contract and its three concrete kinds.

use glam::Vec2;
use turngrid_core::{
    CharacterTraits, ElementId, ElementKind, GridCoordinate, ItemTraits, ItemType,
    ObstacleTraits, ObstacleType, ViewDirection,
};

use crate::{context::InteractionContext, inventory::Inventory};

/// Vision distance assigned to characters without an explicit override.
pub const DEFAULT_CHARACTER_VISION: u32 = 5;
/// Vision distance assigned to items without an explicit override.
pub const DEFAULT_ITEM_VISION: u32 = 1;
/// Vision distance assigned to obstacles without an explicit override.
pub const DEFAULT_OBSTACLE_VISION: u32 = 0;

const MIN_MOVEMENT_SPEED: f32 = 0.1;

/// Identity of the element on the other side of an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interactor {
    /// Identifier of the interacting element.
    pub id: ElementId,
    /// Kind of the interacting element.
    pub kind: ElementKind,
    /// Name of the interacting element.
    pub name: String,
}

/// Follow-up the world must perform after an element handled an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionEffect {
    /// Nothing beyond the element's own bookkeeping.
    None,
    /// The element was collected and must leave the map.
    Collected,
}

/// Contract shared by every element that can stand on the map.
pub trait MapElement {
    /// State common to all element kinds.
    fn base(&self) -> &ElementBase;

    /// Mutable access to the common state.
    fn base_mut(&mut self) -> &mut ElementBase;

    /// Kind of the element.
    fn kind(&self) -> ElementKind;

    /// Whether other elements may share the element's cell.
    fn can_be_traversed(&self) -> bool;

    /// Seeds the context with the element's properties once it enters the world.
    fn initialize(&mut self, tick: u64);

    /// Reacts to another element interacting with this one.
    fn on_interaction(&mut self, interactor: &Interactor, tick: u64) -> InteractionEffect;

    /// One-line status suitable for observations and logs.
    fn status(&self) -> String;

    /// Identifier of the element.
    fn id(&self) -> ElementId {
        self.base().id()
    }

    /// Name of the element.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Cell the element currently occupies.
    fn coordinate(&self) -> GridCoordinate {
        self.base().coordinate()
    }

    /// How many cells the element can see.
    fn vision_distance(&self) -> u32 {
        self.base().vision_distance()
    }

    /// Descriptive metadata and history of the element.
    fn context(&self) -> &InteractionContext {
        self.base().context()
    }

    /// Identity snapshot used when this element interacts with another.
    fn as_interactor(&self) -> Interactor {
        Interactor {
            id: self.id(),
            kind: self.kind(),
            name: self.name().to_owned(),
        }
    }
}

/// State shared by all element kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementBase {
    id: ElementId,
    name: String,
    vision_distance: u32,
    configured_index: u32,
    coordinate: GridCoordinate,
    world_position: Vec2,
    context: InteractionContext,
}

impl ElementBase {
    /// Creates unplaced element state.
    #[must_use]
    pub fn new(
        id: ElementId,
        name: impl Into<String>,
        description: impl Into<String>,
        vision_distance: u32,
        configured_index: u32,
        created_at: u64,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            context: InteractionContext::new(name.clone(), description, created_at, Vec2::ZERO),
            name,
            vision_distance,
            configured_index,
            coordinate: GridCoordinate::INVALID,
            world_position: Vec2::ZERO,
        }
    }

    /// Identifier of the element.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Name of the element.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many cells the element can see.
    #[must_use]
    pub const fn vision_distance(&self) -> u32 {
        self.vision_distance
    }

    /// Linear index of the cell the element is placed in when registered.
    #[must_use]
    pub const fn configured_index(&self) -> u32 {
        self.configured_index
    }

    /// Cell the element occupies, or [`GridCoordinate::INVALID`] while unplaced.
    #[must_use]
    pub const fn coordinate(&self) -> GridCoordinate {
        self.coordinate
    }

    /// Presentation position, which may be offset from the cell centre when
    /// the cell is shared.
    #[must_use]
    pub const fn world_position(&self) -> Vec2 {
        self.world_position
    }

    /// Descriptive metadata and history.
    #[must_use]
    pub const fn context(&self) -> &InteractionContext {
        &self.context
    }

    /// Mutable access to metadata and history.
    pub fn context_mut(&mut self) -> &mut InteractionContext {
        &mut self.context
    }

    /// Appends a history entry.
    pub fn record(&mut self, tick: u64, interaction: impl AsRef<str>) {
        self.context.record(tick, interaction);
    }

    pub(crate) fn set_vision_distance(&mut self, distance: u32, tick: u64) {
        self.vision_distance = distance;
        self.context.set_property("visionDistance", distance);
        self.record(tick, format!("Vision distance changed to {distance}"));
    }

    pub(crate) fn place(&mut self, coordinate: GridCoordinate, world_position: Vec2) {
        self.coordinate = coordinate;
        self.world_position = world_position;
        self.record_coordinate(coordinate);
    }

    pub(crate) fn unplace(&mut self) {
        self.coordinate = GridCoordinate::INVALID;
    }

    pub(crate) fn set_world_position(&mut self, world_position: Vec2) {
        self.world_position = world_position;
    }

    pub(crate) fn set_configured_index(&mut self, index: u32) {
        self.configured_index = index;
    }

    fn record_coordinate(&mut self, coordinate: GridCoordinate) {
        self.context.set_property("row", coordinate.row());
        self.context.set_property("column", coordinate.column());
    }
}

/// Health change produced by [`Character::modify_health`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthChange {
    /// Health before the change.
    pub previous: i32,
    /// Health after the change.
    pub current: i32,
    /// Whether the change took the character from alive to defeated.
    pub defeated: bool,
}

/// A player- or agent-controlled actor. Characters never share passable space.
#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    base: ElementBase,
    health: i32,
    max_health: i32,
    movement_speed: f32,
    can_move: bool,
    player_controlled: bool,
    facing: ViewDirection,
    experience: u32,
    inventory: Inventory,
}

impl Character {
    /// Builds a character from its blueprint attributes.
    #[must_use]
    pub fn new(base: ElementBase, traits: &CharacterTraits) -> Self {
        let max_health = traits.max_health.max(0);
        Self {
            base,
            health: traits.health.unwrap_or(max_health).clamp(0, max_health),
            max_health,
            movement_speed: traits.movement_speed.max(MIN_MOVEMENT_SPEED),
            can_move: traits.can_move,
            player_controlled: traits.player_controlled,
            facing: ViewDirection::Right,
            experience: 0,
            inventory: Inventory::new(),
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Upper bound for health.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Cells per second used by presentation layers.
    #[must_use]
    pub const fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    /// Whether the character may currently move.
    #[must_use]
    pub const fn can_move(&self) -> bool {
        self.can_move
    }

    /// Whether a human drives the character.
    #[must_use]
    pub const fn is_player_controlled(&self) -> bool {
        self.player_controlled
    }

    /// Direction the character faces.
    #[must_use]
    pub const fn facing(&self) -> ViewDirection {
        self.facing
    }

    /// Accumulated experience.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Whether health has reached zero.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// Items carried by the character.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub(crate) fn refresh_inventory_context(&mut self) {
        let description = self.inventory.description();
        self.base
            .context_mut()
            .set_property("inventoryDescription", description);
    }

    /// Applies a signed health delta clamped to `[0, max_health]`.
    pub(crate) fn modify_health(&mut self, amount: i32, tick: u64) -> HealthChange {
        let previous = self.health;
        self.health = previous.saturating_add(amount).clamp(0, self.max_health);
        let current = self.health;
        self.base.context_mut().set_property("healthPoints", current);

        if amount > 0 {
            self.base.record(
                tick,
                format!("Healed {amount} HP (was {previous}, now {current})"),
            );
        } else if amount < 0 {
            self.base.record(
                tick,
                format!(
                    "Took {} damage (was {previous}, now {current})",
                    amount.unsigned_abs()
                ),
            );
        }

        let defeated = previous > 0 && current <= 0;
        if defeated {
            self.base.record(tick, "Character was defeated");
            self.can_move = false;
        }

        HealthChange {
            previous,
            current,
            defeated,
        }
    }

    pub(crate) fn add_experience(&mut self, amount: u32, tick: u64) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let total = self.experience;
        self.base.context_mut().set_property("experiencePoints", total);
        self.base
            .record(tick, format!("Gained {amount} experience (total: {total})"));
        total
    }

    pub(crate) fn set_can_move(&mut self, can_move: bool, tick: u64) {
        self.can_move = can_move;
        self.base.context_mut().set_property("canMove", can_move);
        self.base
            .record(tick, format!("Movement ability changed to {can_move}"));
    }

    pub(crate) fn set_facing(&mut self, facing: ViewDirection, tick: u64) {
        self.facing = facing;
        self.base
            .context_mut()
            .set_property("facingDirection", facing.to_string());
        self.base
            .record(tick, format!("Facing direction changed to {facing}"));
    }

    /// Turns toward the horizontal component of a completed move.
    pub(crate) fn face_along(
        &mut self,
        from: GridCoordinate,
        to: GridCoordinate,
    ) -> Option<ViewDirection> {
        let column_delta = to.column() - from.column();
        if column_delta == 0 {
            return None;
        }
        self.facing = if column_delta < 0 {
            ViewDirection::Left
        } else {
            ViewDirection::Right
        };
        self.base
            .context_mut()
            .set_property("facingDirection", self.facing.to_string());
        Some(self.facing)
    }

    pub(crate) fn flip(&mut self, tick: u64) -> ViewDirection {
        self.set_facing(self.facing.flipped(), tick);
        self.facing
    }
}

impl MapElement for Character {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Character
    }

    fn can_be_traversed(&self) -> bool {
        false
    }

    fn initialize(&mut self, tick: u64) {
        let context = self.base.context_mut();
        context.set_property("healthPoints", self.health);
        context.set_property("maxHealthPoints", self.max_health);
        context.set_property("movementSpeed", self.movement_speed);
        context.set_property("canMove", self.can_move);
        context.set_property("isPlayerControlled", self.player_controlled);
        context.set_property("facingDirection", self.facing.to_string());
        self.refresh_inventory_context();
        self.base.record(tick, "Character created and initialized");
    }

    fn on_interaction(&mut self, interactor: &Interactor, tick: u64) -> InteractionEffect {
        self.base.record(
            tick,
            format!("Interacted with by {} ({})", interactor.name, interactor.kind),
        );
        match interactor.kind {
            ElementKind::Character => self
                .base
                .record(tick, format!("Encountered character: {}", interactor.name)),
            ElementKind::Item => self
                .base
                .record(tick, format!("Interacted with item: {}", interactor.name)),
            ElementKind::Obstacle => {}
        }
        InteractionEffect::None
    }

    fn status(&self) -> String {
        let state = if self.is_defeated() { ", defeated" } else { "" };
        format!(
            "HP {}/{}, facing {}{state}",
            self.health, self.max_health, self.facing
        )
    }
}

/// A collectable object. Items never block movement.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    base: ElementBase,
    item_type: ItemType,
    collectable: bool,
    pickup_range: u32,
}

impl Item {
    /// Builds an item from its blueprint attributes.
    #[must_use]
    pub fn new(base: ElementBase, traits: &ItemTraits) -> Self {
        Self {
            base,
            item_type: traits.item_type,
            collectable: traits.collectable,
            pickup_range: traits.pickup_range.max(1),
        }
    }

    /// Inventory slot the item occupies.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Whether characters may pick the item up.
    #[must_use]
    pub const fn is_collectable(&self) -> bool {
        self.collectable
    }

    /// Maximum distance a collector may stand from the item.
    #[must_use]
    pub const fn pickup_range(&self) -> u32 {
        self.pickup_range
    }

    pub(crate) fn set_collectable(&mut self, collectable: bool, tick: u64) {
        self.collectable = collectable;
        self.base
            .context_mut()
            .set_property("isCollectable", collectable);
        self.base
            .record(tick, format!("Collectable status changed to {collectable}"));
    }
}

impl MapElement for Item {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Item
    }

    fn can_be_traversed(&self) -> bool {
        true
    }

    fn initialize(&mut self, tick: u64) {
        let context = self.base.context_mut();
        context.set_property("isCollectable", self.collectable);
        context.set_property("pickupRange", self.pickup_range);
        context.set_property("itemType", self.item_type.to_string());
        self.base.record(tick, "Item created and initialized");
    }

    fn on_interaction(&mut self, interactor: &Interactor, tick: u64) -> InteractionEffect {
        self.base.record(
            tick,
            format!("Interacted with by {} ({})", interactor.name, interactor.kind),
        );
        if self.collectable && interactor.kind == ElementKind::Character {
            self.base
                .record(tick, format!("Collected by {}", interactor.name));
            return InteractionEffect::Collected;
        }
        InteractionEffect::None
    }

    fn status(&self) -> String {
        if self.collectable {
            format!("{} (collectable)", self.item_type)
        } else {
            self.item_type.to_string()
        }
    }
}

/// Outcome of [`Obstacle::take_damage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The obstacle is indestructible and nothing changed.
    Ignored,
    /// Durability dropped but the obstacle still stands.
    Damaged {
        /// Durability before the hit.
        previous: i32,
        /// Durability after the hit.
        current: i32,
    },
    /// Durability reached zero.
    Destroyed {
        /// Durability before the hit.
        previous: i32,
    },
}

/// Static scenery that may block movement or vision.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    base: ElementBase,
    obstacle_type: Option<ObstacleType>,
    blocks_movement: bool,
    blocks_vision: bool,
    destructible: bool,
    durability: i32,
    max_durability: i32,
    destruction_force: f32,
}

impl Obstacle {
    /// Builds an obstacle from its blueprint attributes. A preset type, when
    /// present, overrides the individual blocking flags.
    #[must_use]
    pub fn new(base: ElementBase, traits: &ObstacleTraits) -> Self {
        let max_durability = traits.max_durability.max(0);
        let mut obstacle = Self {
            base,
            obstacle_type: traits.obstacle_type,
            blocks_movement: traits.blocks_movement,
            blocks_vision: traits.blocks_vision,
            destructible: traits.destructible,
            durability: max_durability,
            max_durability,
            destruction_force: traits.destruction_force,
        };
        if let Some(preset) = traits.obstacle_type {
            obstacle.apply_preset(preset);
        }
        obstacle
    }

    /// Preset applied to the obstacle, if any.
    #[must_use]
    pub const fn obstacle_type(&self) -> Option<ObstacleType> {
        self.obstacle_type
    }

    /// Whether the obstacle prevents movement into its cell.
    #[must_use]
    pub const fn blocks_movement(&self) -> bool {
        self.blocks_movement
    }

    /// Whether the obstacle is opaque.
    #[must_use]
    pub const fn blocks_vision(&self) -> bool {
        self.blocks_vision
    }

    /// Whether damage can wear the obstacle down.
    #[must_use]
    pub const fn is_destructible(&self) -> bool {
        self.destructible
    }

    /// Current durability.
    #[must_use]
    pub const fn durability(&self) -> i32 {
        self.durability
    }

    /// Upper bound for durability.
    #[must_use]
    pub const fn max_durability(&self) -> i32 {
        self.max_durability
    }

    /// Force required to shatter the obstacle in one blow.
    #[must_use]
    pub const fn destruction_force(&self) -> f32 {
        self.destruction_force
    }

    /// Durability as a fraction of its maximum.
    #[must_use]
    pub fn durability_percentage(&self) -> f32 {
        if self.max_durability <= 0 {
            return 0.0;
        }
        self.durability as f32 / self.max_durability as f32
    }

    /// Whether a destructible obstacle has been worn down to nothing.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destructible && self.durability <= 0
    }

    pub(crate) fn take_damage(&mut self, damage: i32, tick: u64) -> DamageOutcome {
        if !self.destructible {
            self.base.record(
                tick,
                format!("Received {damage} damage but is indestructible"),
            );
            return DamageOutcome::Ignored;
        }

        let previous = self.durability;
        self.durability = previous.saturating_sub(damage).clamp(0, self.max_durability);
        let current = self.durability;
        self.base.context_mut().set_property("durability", current);
        self.base.record(
            tick,
            format!("Took {damage} damage (was {previous}, now {current})"),
        );

        if current <= 0 {
            self.base.record(tick, "Obstacle was destroyed");
            DamageOutcome::Destroyed { previous }
        } else {
            DamageOutcome::Damaged { previous, current }
        }
    }

    pub(crate) fn repair(&mut self, amount: i32, tick: u64) -> Option<(i32, i32)> {
        if !self.destructible {
            return None;
        }
        let previous = self.durability;
        self.durability = previous.saturating_add(amount).clamp(0, self.max_durability);
        let current = self.durability;
        self.base.context_mut().set_property("durability", current);
        self.base.record(
            tick,
            format!("Repaired {amount} durability (was {previous}, now {current})"),
        );
        Some((previous, current))
    }

    pub(crate) fn set_blocks_movement(&mut self, blocks: bool, tick: u64) {
        self.blocks_movement = blocks;
        self.base
            .context_mut()
            .set_property("blocksMovement", blocks);
        self.base
            .record(tick, format!("Movement blocking changed to {blocks}"));
    }

    pub(crate) fn set_obstacle_type(&mut self, obstacle_type: ObstacleType, tick: u64) {
        self.apply_preset(obstacle_type);
        self.base
            .record(tick, format!("Obstacle type changed to {obstacle_type:?}"));
    }

    fn apply_preset(&mut self, obstacle_type: ObstacleType) {
        self.obstacle_type = Some(obstacle_type);
        let blocks = matches!(obstacle_type, ObstacleType::Wall);
        self.blocks_movement = blocks;
        self.blocks_vision = blocks;
        let context = self.base.context_mut();
        context.set_property("obstacleType", format!("{obstacle_type:?}"));
        context.set_property("blocksMovement", blocks);
        context.set_property("blocksVision", blocks);
    }
}

impl MapElement for Obstacle {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Obstacle
    }

    fn can_be_traversed(&self) -> bool {
        !self.blocks_movement
    }

    fn initialize(&mut self, tick: u64) {
        let context = self.base.context_mut();
        context.set_property("isDestructible", self.destructible);
        context.set_property("durability", self.durability);
        context.set_property("maxDurability", self.max_durability);
        context.set_property("blocksMovement", self.blocks_movement);
        context.set_property("blocksVision", self.blocks_vision);
        context.set_property("destructionForce", self.destruction_force);
        self.base.record(tick, "Obstacle created and initialized");
    }

    fn on_interaction(&mut self, interactor: &Interactor, tick: u64) -> InteractionEffect {
        self.base.record(
            tick,
            format!("Interacted with by {} ({})", interactor.name, interactor.kind),
        );
        if interactor.kind == ElementKind::Character {
            self.base.record(
                tick,
                format!("Character {} interacted with obstacle", interactor.name),
            );
            if self.destructible {
                self.base.record(
                    tick,
                    "Character attempted to interact with destructible obstacle",
                );
            }
        }
        InteractionEffect::None
    }

    fn status(&self) -> String {
        let blocking = if self.blocks_movement {
            "blocking"
        } else {
            "passable"
        };
        if self.destructible {
            format!(
                "{blocking}, durability {}/{}",
                self.durability, self.max_durability
            )
        } else {
            blocking.to_owned()
        }
    }
}

/// Any element that can be registered with the map.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    /// A character.
    Character(Character),
    /// An item.
    Item(Item),
    /// An obstacle.
    Obstacle(Obstacle),
}

impl Element {
    /// The element as a character, if it is one.
    #[must_use]
    pub const fn as_character(&self) -> Option<&Character> {
        match self {
            Element::Character(character) => Some(character),
            _ => None,
        }
    }

    /// The element as an item, if it is one.
    #[must_use]
    pub const fn as_item(&self) -> Option<&Item> {
        match self {
            Element::Item(item) => Some(item),
            _ => None,
        }
    }

    /// The element as an obstacle, if it is one.
    #[must_use]
    pub const fn as_obstacle(&self) -> Option<&Obstacle> {
        match self {
            Element::Obstacle(obstacle) => Some(obstacle),
            _ => None,
        }
    }

    pub(crate) fn as_character_mut(&mut self) -> Option<&mut Character> {
        match self {
            Element::Character(character) => Some(character),
            _ => None,
        }
    }

    pub(crate) fn as_item_mut(&mut self) -> Option<&mut Item> {
        match self {
            Element::Item(item) => Some(item),
            _ => None,
        }
    }

    pub(crate) fn as_obstacle_mut(&mut self) -> Option<&mut Obstacle> {
        match self {
            Element::Obstacle(obstacle) => Some(obstacle),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn MapElement {
        match self {
            Element::Character(character) => character,
            Element::Item(item) => item,
            Element::Obstacle(obstacle) => obstacle,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn MapElement {
        match self {
            Element::Character(character) => character,
            Element::Item(item) => item,
            Element::Obstacle(obstacle) => obstacle,
        }
    }
}

impl MapElement for Element {
    fn base(&self) -> &ElementBase {
        self.inner().base()
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        self.inner_mut().base_mut()
    }

    fn kind(&self) -> ElementKind {
        self.inner().kind()
    }

    fn can_be_traversed(&self) -> bool {
        self.inner().can_be_traversed()
    }

    fn initialize(&mut self, tick: u64) {
        self.inner_mut().initialize(tick);
    }

    fn on_interaction(&mut self, interactor: &Interactor, tick: u64) -> InteractionEffect {
        self.inner_mut().on_interaction(interactor, tick)
    }

    fn status(&self) -> String {
        self.inner().status()
    }
}

impl From<Item> for Element {
    fn from(item: Item) -> Self {
        Element::Item(item)
    }
}
