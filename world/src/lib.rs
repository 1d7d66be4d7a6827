#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for turngrid.
//!
//! The [`World`] owns the cell lattice and the element registry. Every
//! mutation flows through [`apply`], which validates a [`Command`], performs
//! it completely or not at all, and reports what happened as [`Event`]
//! values. Read access goes through the [`query`], [`vision`] and
//! [`navigation`] modules.

mod cell;
mod context;
mod element;
mod grid;
mod inventory;
pub mod navigation;
pub mod vision;

use std::collections::BTreeMap;

use log::{debug, trace};
use turngrid_core::{
    ActionError, Command, ElementBlueprint, ElementId, ElementKind, ElementTraits, Event,
    GameRules, GridConfiguration, GridCoordinate, InventoryError, ItemType, NavigationError,
    MAX_OBJECTS_PER_CELL,
};

pub use cell::{
    MapCell, BASE_TRAVERSAL_COST, CROWDING_COST_PER_OCCUPANT, MIN_TRAVERSAL_COST,
};
pub use context::{InteractionContext, DEFAULT_RECENT_INTERACTIONS};
pub use element::{
    Character, DamageOutcome, Element, ElementBase, HealthChange, InteractionEffect, Interactor,
    Item, MapElement, Obstacle, DEFAULT_CHARACTER_VISION, DEFAULT_ITEM_VISION,
    DEFAULT_OBSTACLE_VISION,
};
pub use grid::GridSystem;
pub use inventory::Inventory;

/// Represents the authoritative turngrid world state.
#[derive(Debug)]
pub struct World {
    grid: GridSystem,
    cells: Vec<MapCell>,
    elements: BTreeMap<ElementId, Element>,
    rules: GameRules,
    clock: u64,
}

impl World {
    /// Creates an empty world on the default 10x10 grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_configuration(GridConfiguration::default())
    }

    /// Creates an empty world on a grid with the provided geometry.
    #[must_use]
    pub fn with_configuration(configuration: GridConfiguration) -> Self {
        let grid = GridSystem::new(configuration);
        Self {
            cells: build_cells(&grid),
            grid,
            elements: BTreeMap::new(),
            rules: GameRules::default(),
            clock: 0,
        }
    }

    fn cell_index(&self, coordinate: GridCoordinate) -> Option<usize> {
        self.grid
            .linear_index(coordinate)
            .filter(|index| *index < self.cells.len())
    }

    fn room_in(&self, coordinate: GridCoordinate) -> Result<usize, NavigationError> {
        let index = self
            .cell_index(coordinate)
            .ok_or(NavigationError::InvalidCoordinate)?;
        if self.cells[index].occupant_count() >= MAX_OBJECTS_PER_CELL {
            return Err(NavigationError::CellFull);
        }
        Ok(index)
    }

    fn record(&mut self, id: ElementId, interaction: impl AsRef<str>) {
        let tick = self.clock;
        if let Some(element) = self.elements.get_mut(&id) {
            element.base_mut().record(tick, interaction);
        }
    }

    fn name_of(&self, id: ElementId) -> String {
        self.elements
            .get(&id)
            .map_or_else(|| id.to_string(), |element| element.name().to_owned())
    }

    fn character_mut(&mut self, id: ElementId) -> Option<&mut Character> {
        self.elements
            .get_mut(&id)
            .and_then(Element::as_character_mut)
    }

    fn obstacle_mut(&mut self, id: ElementId) -> Option<&mut Obstacle> {
        self.elements.get_mut(&id).and_then(Element::as_obstacle_mut)
    }

    /// Places an element into a cell that is known to have room.
    fn insert_at(&mut self, mut element: Element, coordinate: GridCoordinate) {
        let id = element.id();
        let center = self.grid.coordinate_to_world_center(coordinate);
        element.base_mut().place(coordinate, center);
        let previous = self.elements.insert(id, element);
        debug_assert!(previous.is_none(), "{id} was placed twice");

        if let Some(index) = self.cell_index(coordinate) {
            let passable = passable(&self.elements);
            let _ = self.cells[index].add_occupant(id, passable);
        }
        self.arrange_cell(coordinate);
    }

    fn remove_element(&mut self, id: ElementId, out_events: &mut Vec<Event>) -> Option<Element> {
        let mut element = self.elements.remove(&id)?;
        let from = element.coordinate();
        if let Some(index) = self.cell_index(from) {
            let passable = passable(&self.elements);
            let _ = self.cells[index].remove_occupant(id, passable);
        }
        self.arrange_cell(from);
        element.base_mut().unplace();

        debug!("unregistered {} ({id}) from {from}", element.name());
        out_events.push(Event::ElementUnregistered { id, from });
        Some(element)
    }

    /// Spreads the occupants of a cell across its sub-positions.
    fn arrange_cell(&mut self, coordinate: GridCoordinate) {
        let Some(index) = self.cell_index(coordinate) else {
            return;
        };
        let occupants = self.cells[index].occupants().to_vec();
        let positions = self.grid.multi_cell_positions(coordinate, occupants.len());
        for (id, position) in occupants.iter().zip(positions) {
            if let Some(element) = self.elements.get_mut(id) {
                element.base_mut().set_world_position(position);
            }
        }
    }

    fn refresh_cell(&mut self, coordinate: GridCoordinate, out_events: &mut Vec<Event>) {
        let Some(index) = self.cell_index(coordinate) else {
            return;
        };
        let passable = passable(&self.elements);
        let cell = &mut self.cells[index];
        let before = cell.is_traversable();
        cell.refresh(passable);
        if cell.is_traversable() != before {
            out_events.push(Event::TraversabilityChanged {
                at: coordinate,
                traversable: cell.is_traversable(),
            });
        }
    }

    fn configure_grid(&mut self, configuration: GridConfiguration, out_events: &mut Vec<Event>) {
        if !self.elements.is_empty() {
            debug!(
                "discarding {} elements while reconfiguring the grid",
                self.elements.len()
            );
        }
        self.grid = GridSystem::new(configuration);
        self.cells = build_cells(&self.grid);
        self.elements.clear();
        out_events.push(Event::GridConfigured {
            width: configuration.width,
            height: configuration.height,
        });
    }

    /// Whether the identifier belongs to an element, on the map or carried.
    fn is_id_taken(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
            || self
                .elements
                .values()
                .filter_map(Element::as_character)
                .any(|character| character.inventory().contains(id))
    }

    fn register(&mut self, blueprint: ElementBlueprint, out_events: &mut Vec<Event>) {
        let id = blueprint.id;
        if self.is_id_taken(id) {
            debug!("{} ({id}) is already registered", blueprint.name);
            out_events.push(Event::RegistrationRejected {
                id,
                reason: NavigationError::AlreadyRegistered,
            });
            return;
        }

        let coordinate = usize::try_from(blueprint.linear_index).map_or(
            GridCoordinate::INVALID,
            |index| self.grid.coordinate_from_linear_index(index),
        );
        if let Err(reason) = self.room_in(coordinate) {
            debug!("cannot register {} ({id}): {reason}", blueprint.name);
            out_events.push(Event::RegistrationRejected { id, reason });
            return;
        }

        let mut element = build_element(blueprint, self.clock);
        let kind = element.kind();
        element.initialize(self.clock);
        element
            .base_mut()
            .context_mut()
            .set_initial_position(self.grid.coordinate_to_world_center(coordinate));

        debug!("registered {} ({id}) at {coordinate}", element.name());
        self.insert_at(element, coordinate);
        out_events.push(Event::ElementRegistered {
            id,
            kind,
            at: coordinate,
        });
    }

    fn move_element(
        &mut self,
        id: ElementId,
        to: GridCoordinate,
    ) -> Result<GridCoordinate, NavigationError> {
        let element = self
            .elements
            .get(&id)
            .ok_or(NavigationError::NotRegistered)?;
        if element
            .as_character()
            .is_some_and(|character| !character.can_move())
        {
            return Err(NavigationError::Immobile);
        }

        let from = element.coordinate();
        if !navigation::is_navigation_viable(self, from, to) {
            return Err(if self.grid.is_valid(to) {
                NavigationError::Blocked
            } else {
                NavigationError::InvalidCoordinate
            });
        }
        let to_index = self.room_in(to)?;

        if let Some(from_index) = self.cell_index(from) {
            let passable = passable(&self.elements);
            let _ = self.cells[from_index].remove_occupant(id, passable);
        }
        let center = self.grid.coordinate_to_world_center(to);
        if let Some(element) = self.elements.get_mut(&id) {
            element.base_mut().place(to, center);
        }
        let passable = passable(&self.elements);
        let _ = self.cells[to_index].add_occupant(id, passable);

        self.arrange_cell(from);
        self.arrange_cell(to);
        debug!("moved {id} from {from} to {to}");
        Ok(from)
    }

    fn handle_move(&mut self, id: ElementId, to: GridCoordinate, out_events: &mut Vec<Event>) {
        match self.move_element(id, to) {
            Ok(from) => {
                out_events.push(Event::ElementMoved { id, from, to });
                let tick = self.clock;
                if let Some(element) = self.elements.get_mut(&id) {
                    element
                        .base_mut()
                        .record(tick, format!("Moved from {from} to {to}"));
                    if let Some(character) = element.as_character_mut() {
                        if let Some(facing) = character.face_along(from, to) {
                            out_events.push(Event::FacingChanged { id, facing });
                        }
                        character.refresh_inventory_context();
                    }
                }
            }
            Err(reason) => {
                debug!("move of {id} to {to} rejected: {reason}");
                self.record(id, format!("Failed to move to {to} - {reason}"));
                out_events.push(Event::MoveRejected { id, to, reason });
            }
        }
    }

    fn interact(&mut self, actor: ElementId, target: ElementId, out_events: &mut Vec<Event>) {
        if actor == target {
            return;
        }
        let Some(interactor) = self.elements.get(&actor).map(MapElement::as_interactor) else {
            return;
        };
        let tick = self.clock;
        let Some(element) = self.elements.get_mut(&target) else {
            return;
        };

        let effect = element.on_interaction(&interactor, tick);
        out_events.push(Event::Interacted { actor, target });
        if effect == InteractionEffect::Collected && self.remove_element(target, out_events).is_some()
        {
            out_events.push(Event::ItemCollected {
                item: target,
                collector: actor,
            });
        }
    }

    fn modify_health(&mut self, id: ElementId, amount: i32, out_events: &mut Vec<Event>) {
        let tick = self.clock;
        let Some(character) = self.character_mut(id) else {
            return;
        };
        let change = character.modify_health(amount, tick);
        out_events.push(Event::HealthChanged {
            id,
            previous: change.previous,
            current: change.current,
        });
        if change.defeated {
            debug!("{id} was defeated");
            out_events.push(Event::CharacterDefeated { id });
        }
    }

    fn damage_obstacle(&mut self, id: ElementId, amount: i32, out_events: &mut Vec<Event>) {
        let tick = self.clock;
        let Some(obstacle) = self.obstacle_mut(id) else {
            return;
        };
        match obstacle.take_damage(amount, tick) {
            DamageOutcome::Ignored => out_events.push(Event::DamageIgnored { id }),
            DamageOutcome::Damaged { previous, current } => {
                out_events.push(Event::DurabilityChanged {
                    id,
                    previous,
                    current,
                });
            }
            DamageOutcome::Destroyed { previous } => {
                out_events.push(Event::DurabilityChanged {
                    id,
                    previous,
                    current: 0,
                });
                if self.remove_element(id, out_events).is_some() {
                    out_events.push(Event::ObstacleDestroyed { id });
                }
            }
        }
    }

    fn update_obstacle<F>(&mut self, id: ElementId, out_events: &mut Vec<Event>, update: F)
    where
        F: FnOnce(&mut Obstacle, u64),
    {
        let tick = self.clock;
        let Some(obstacle) = self.obstacle_mut(id) else {
            return;
        };
        update(obstacle, tick);
        let coordinate = obstacle.coordinate();
        self.refresh_cell(coordinate, out_events);
    }

    fn attack(&mut self, attacker: ElementId, target: ElementId, out_events: &mut Vec<Event>) {
        let target_kind = match self.validate_attack(attacker, target) {
            Ok(kind) => kind,
            Err(reason) => {
                debug!("attack by {attacker} on {target} rejected: {reason}");
                self.record(attacker, format!("Attack failed: {reason}"));
                out_events.push(Event::ActionRejected {
                    actor: attacker,
                    reason,
                });
                return;
            }
        };

        let damage = self.rules.attack_damage;
        let attacker_name = self.name_of(attacker);
        let target_name = self.name_of(target);
        self.record(
            attacker,
            format!("Attacked {target_name} for {damage} damage"),
        );
        out_events.push(Event::Attacked {
            attacker,
            target,
            damage,
        });

        match target_kind {
            ElementKind::Character => {
                self.modify_health(target, -damage, out_events);
                let health = self
                    .elements
                    .get(&target)
                    .and_then(Element::as_character)
                    .map_or(0, Character::health);
                self.record(
                    target,
                    format!(
                        "{attacker_name} has attacked you for {damage} damage. Your current health: {health}"
                    ),
                );
            }
            _ => self.damage_obstacle(target, damage, out_events),
        }
    }

    fn validate_attack(
        &self,
        attacker: ElementId,
        target: ElementId,
    ) -> Result<ElementKind, ActionError> {
        let source = self
            .elements
            .get(&attacker)
            .ok_or(ActionError::UnknownElement(attacker))?;
        let character = source
            .as_character()
            .ok_or(ActionError::NotACharacter(attacker))?;
        if character.is_defeated() {
            return Err(ActionError::Defeated);
        }
        if attacker == target {
            return Err(ActionError::SelfTarget);
        }
        let victim = self
            .elements
            .get(&target)
            .ok_or(ActionError::UnknownElement(target))?;
        let attackable = match victim {
            Element::Character(_) => true,
            Element::Obstacle(obstacle) => obstacle.is_destructible(),
            Element::Item(_) => false,
        };
        if !attackable {
            return Err(ActionError::InvalidTarget(target));
        }
        if source.coordinate().manhattan_distance(victim.coordinate()) > self.rules.attack_range {
            return Err(ActionError::OutOfRange);
        }
        Ok(victim.kind())
    }

    fn talk(&mut self, speaker: ElementId, message: String, out_events: &mut Vec<Event>) {
        let origin = match self.elements.get(&speaker) {
            None => Err(ActionError::UnknownElement(speaker)),
            Some(element) if element.kind() != ElementKind::Character => {
                Err(ActionError::NotACharacter(speaker))
            }
            Some(_) if message.trim().is_empty() => Err(ActionError::EmptyMessage),
            Some(element) => Ok(element.coordinate()),
        };
        let origin = match origin {
            Ok(origin) => origin,
            Err(reason) => {
                out_events.push(Event::ActionRejected {
                    actor: speaker,
                    reason,
                });
                return;
            }
        };

        let speaker_name = self.name_of(speaker);
        let listeners: Vec<ElementId> =
            query::characters_within(self, origin, self.rules.talk_range)
                .into_iter()
                .filter(|listener| *listener != speaker)
                .collect();

        self.record(speaker, format!("Said: {message}"));
        for listener in &listeners {
            self.record(*listener, format!("{speaker_name} says: {message}"));
        }
        debug!("{speaker} spoke to {} listeners", listeners.len());
        out_events.push(Event::MessageSpoken {
            speaker,
            message,
            listeners,
        });
    }

    fn character_ref(&self, id: ElementId) -> Result<&Character, InventoryError> {
        self.elements
            .get(&id)
            .ok_or(InventoryError::UnknownElement(id))?
            .as_character()
            .ok_or(InventoryError::NotACharacter(id))
    }

    fn world_distance(&self, a: GridCoordinate, b: GridCoordinate) -> f32 {
        self.grid
            .coordinate_to_world_center(a)
            .distance(self.grid.coordinate_to_world_center(b))
    }

    fn pickup(&mut self, character: ElementId, item: ElementId, out_events: &mut Vec<Event>) {
        let item_type = match self.validate_pickup(character, item) {
            Ok(item_type) => item_type,
            Err(reason) => {
                self.reject_inventory(character, reason, out_events);
                return;
            }
        };
        let Some(Element::Item(mut taken)) = self.remove_element(item, out_events) else {
            return;
        };
        let from = taken.coordinate();
        let collector = self.name_of(character);
        taken
            .base_mut()
            .record(self.clock, format!("Collected by {collector}"));

        let rejected = match self.character_mut(character) {
            Some(holder) => holder.inventory_mut().add(taken).err(),
            None => Some(taken),
        };
        if let Some(returned) = rejected {
            self.insert_at(returned.into(), from);
            self.reject_inventory(character, InventoryError::SlotOccupied(item_type), out_events);
            return;
        }

        self.record(character, format!("Picked up {item_type}"));
        if let Some(holder) = self.character_mut(character) {
            holder.refresh_inventory_context();
        }
        out_events.push(Event::ItemPickedUp {
            character,
            item,
            item_type,
        });
    }

    fn validate_pickup(
        &self,
        character: ElementId,
        item: ElementId,
    ) -> Result<ItemType, InventoryError> {
        let holder = self.character_ref(character)?;
        let target = self
            .elements
            .get(&item)
            .ok_or(InventoryError::UnknownElement(item))?
            .as_item()
            .ok_or(InventoryError::NotAnItem(item))?;
        if !target.is_collectable() {
            return Err(InventoryError::NotCollectable);
        }
        let distance = self.world_distance(holder.coordinate(), target.coordinate());
        if distance > target.pickup_range() as f32 {
            return Err(InventoryError::OutOfRange);
        }
        if holder.inventory().has(target.item_type()) {
            return Err(InventoryError::SlotOccupied(target.item_type()));
        }
        Ok(target.item_type())
    }

    fn drop_item(&mut self, character: ElementId, item_type: ItemType, out_events: &mut Vec<Event>) {
        let validated = self.character_ref(character).and_then(|holder| {
            if !holder.inventory().has(item_type) {
                return Err(InventoryError::MissingItem(item_type));
            }
            let at = holder.coordinate();
            let index = self.room_in(at).map_err(|_| InventoryError::NoRoom)?;
            Ok((at, index))
        });
        let (at, index) = match validated {
            Ok(found) => found,
            Err(reason) => {
                self.reject_inventory(character, reason, out_events);
                return;
            }
        };

        let Some(mut dropped) = self
            .character_mut(character)
            .and_then(|holder| holder.inventory_mut().remove(item_type))
        else {
            return;
        };
        if let Some(holder) = self.character_mut(character) {
            holder.refresh_inventory_context();
        }

        let item = dropped.id();
        let dropper = self.name_of(character);
        dropped
            .base_mut()
            .set_configured_index(u32::try_from(index).unwrap_or(u32::MAX));
        dropped
            .base_mut()
            .record(self.clock, format!("Dropped by {dropper}"));
        self.insert_at(dropped.into(), at);
        self.record(character, format!("Dropped {item_type}"));

        out_events.push(Event::ElementRegistered {
            id: item,
            kind: ElementKind::Item,
            at,
        });
        out_events.push(Event::ItemDropped {
            character,
            item,
            item_type,
            at,
        });
    }

    fn give(
        &mut self,
        from: ElementId,
        to: ElementId,
        item_type: ItemType,
        out_events: &mut Vec<Event>,
    ) {
        if let Err(reason) = self.validate_give(from, to, item_type) {
            self.reject_inventory(from, reason, out_events);
            return;
        }

        let Some(item) = self
            .character_mut(from)
            .and_then(|giver| giver.inventory_mut().remove(item_type))
        else {
            return;
        };
        let item_id = item.id();
        let rejected = match self.character_mut(to) {
            Some(receiver) => receiver.inventory_mut().add(item).err(),
            None => Some(item),
        };
        if let Some(returned) = rejected {
            if let Some(giver) = self.character_mut(from) {
                let _ = giver.inventory_mut().add(returned);
            }
            self.reject_inventory(from, InventoryError::SlotOccupied(item_type), out_events);
            return;
        }

        let giver_name = self.name_of(from);
        let receiver_name = self.name_of(to);
        self.record(from, format!("Gave {item_type} to {receiver_name}"));
        self.record(to, format!("Received {item_type} from {giver_name}"));
        for id in [from, to] {
            if let Some(character) = self.character_mut(id) {
                character.refresh_inventory_context();
            }
        }
        out_events.push(Event::ItemGiven {
            from,
            to,
            item: item_id,
            item_type,
        });
    }

    fn validate_give(
        &self,
        from: ElementId,
        to: ElementId,
        item_type: ItemType,
    ) -> Result<(), InventoryError> {
        let giver = self.character_ref(from)?;
        if from == to {
            return Err(InventoryError::SelfTarget);
        }
        let receiver = self.character_ref(to)?;
        let distance = self.world_distance(giver.coordinate(), receiver.coordinate());
        if distance > self.rules.give_range as f32 {
            return Err(InventoryError::OutOfRange);
        }
        if !giver.inventory().has(item_type) {
            return Err(InventoryError::MissingItem(item_type));
        }
        if receiver.inventory().has(item_type) {
            return Err(InventoryError::SlotOccupied(item_type));
        }
        Ok(())
    }

    fn reject_inventory(
        &mut self,
        character: ElementId,
        reason: InventoryError,
        out_events: &mut Vec<Event>,
    ) {
        debug!("inventory request by {character} rejected: {reason}");
        self.record(character, format!("Inventory action failed: {reason}"));
        out_events.push(Event::InventoryRejected { character, reason });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { configuration } => world.configure_grid(configuration, out_events),
        Command::ConfigureRules { rules } => world.rules = rules,
        Command::Tick => {
            world.clock = world.clock.saturating_add(1);
            trace!("clock advanced to {}", world.clock);
            out_events.push(Event::TimeAdvanced { tick: world.clock });
        }
        Command::RegisterElement { blueprint } => world.register(blueprint, out_events),
        Command::UnregisterElement { id } => {
            let _ = world.remove_element(id, out_events);
        }
        Command::MoveElement { id, to } => world.handle_move(id, to, out_events),
        Command::Interact { actor, target } => world.interact(actor, target, out_events),
        Command::ModifyHealth { id, amount } => world.modify_health(id, amount, out_events),
        Command::AddExperience { id, amount } => {
            let tick = world.clock;
            if let Some(character) = world.character_mut(id) {
                let total = character.add_experience(amount, tick);
                out_events.push(Event::ExperienceGained { id, amount, total });
            }
        }
        Command::SetCanMove { id, can_move } => {
            let tick = world.clock;
            if let Some(character) = world.character_mut(id) {
                character.set_can_move(can_move, tick);
                out_events.push(Event::MobilityChanged { id, can_move });
            }
        }
        Command::SetFacing { id, facing } => {
            let tick = world.clock;
            if let Some(character) = world.character_mut(id) {
                character.set_facing(facing, tick);
                out_events.push(Event::FacingChanged { id, facing });
            }
        }
        Command::Flip { id } => {
            let tick = world.clock;
            if let Some(character) = world.character_mut(id) {
                let facing = character.flip(tick);
                out_events.push(Event::FacingChanged { id, facing });
            }
        }
        Command::SetVisionDistance { id, distance } => {
            let tick = world.clock;
            if let Some(element) = world.elements.get_mut(&id) {
                element.base_mut().set_vision_distance(distance, tick);
                out_events.push(Event::VisionChanged { id, distance });
            }
        }
        Command::DamageObstacle { id, amount } => world.damage_obstacle(id, amount, out_events),
        Command::RepairObstacle { id, amount } if amount < 0 => {
            world.damage_obstacle(id, amount.saturating_neg(), out_events);
        }
        Command::RepairObstacle { id, amount } => {
            let tick = world.clock;
            if let Some((previous, current)) = world
                .obstacle_mut(id)
                .and_then(|obstacle| obstacle.repair(amount, tick))
            {
                out_events.push(Event::DurabilityChanged {
                    id,
                    previous,
                    current,
                });
            }
        }
        Command::SetObstacleType { id, obstacle_type } => {
            world.update_obstacle(id, out_events, |obstacle, tick| {
                obstacle.set_obstacle_type(obstacle_type, tick);
            });
        }
        Command::SetBlocksMovement { id, blocks } => {
            world.update_obstacle(id, out_events, |obstacle, tick| {
                obstacle.set_blocks_movement(blocks, tick);
            });
        }
        Command::SetCollectable { id, collectable } => {
            let tick = world.clock;
            if let Some(item) = world.elements.get_mut(&id).and_then(Element::as_item_mut) {
                item.set_collectable(collectable, tick);
                out_events.push(Event::CollectableChanged { id, collectable });
            }
        }
        Command::PickupItem { character, item } => world.pickup(character, item, out_events),
        Command::DropItem {
            character,
            item_type,
        } => world.drop_item(character, item_type, out_events),
        Command::GiveItem {
            from,
            to,
            item_type,
        } => world.give(from, to, item_type, out_events),
        Command::Attack { attacker, target } => world.attack(attacker, target, out_events),
        Command::Talk { speaker, message } => world.talk(speaker, message, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Character, Element, GridSystem, MapCell, MapElement, World};
    use turngrid_core::{
        ElementId, ElementKind, ElementSnapshot, GameRules, GridCoordinate,
    };

    /// Provides read-only access to the grid geometry.
    #[must_use]
    pub fn grid(world: &World) -> &GridSystem {
        &world.grid
    }

    /// Action limits currently in force.
    #[must_use]
    pub fn rules(world: &World) -> &GameRules {
        &world.rules
    }

    /// Current value of the logical clock.
    #[must_use]
    pub fn clock(world: &World) -> u64 {
        world.clock
    }

    /// Cell at the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn cell(world: &World, coordinate: GridCoordinate) -> Option<&MapCell> {
        world.cell_index(coordinate).map(|index| &world.cells[index])
    }

    /// Every cell in row-major order.
    #[must_use]
    pub fn cells(world: &World) -> &[MapCell] {
        &world.cells
    }

    /// Cells that host at least one element.
    pub fn cells_with_elements(world: &World) -> impl Iterator<Item = &MapCell> {
        world.cells.iter().filter(|cell| cell.has_occupants())
    }

    /// Whether movement into the cell is allowed. Invalid cells are never traversable.
    #[must_use]
    pub fn is_cell_traversable(world: &World, coordinate: GridCoordinate) -> bool {
        cell(world, coordinate).is_some_and(MapCell::is_traversable)
    }

    /// Registered element with the identifier.
    #[must_use]
    pub fn element(world: &World, id: ElementId) -> Option<&Element> {
        world.elements.get(&id)
    }

    /// Registered character with the identifier.
    #[must_use]
    pub fn character(world: &World, id: ElementId) -> Option<&Character> {
        element(world, id).and_then(Element::as_character)
    }

    /// Every registered element in identifier order.
    pub fn elements(world: &World) -> impl Iterator<Item = &Element> {
        world.elements.values()
    }

    /// Registered elements of one kind in identifier order.
    pub fn elements_by_kind(world: &World, kind: ElementKind) -> impl Iterator<Item = &Element> {
        elements(world).filter(move |element| element.kind() == kind)
    }

    /// Elements standing in the cell, in arrival order.
    pub fn elements_at(
        world: &World,
        coordinate: GridCoordinate,
    ) -> impl Iterator<Item = &Element> {
        cell(world, coordinate)
            .map(MapCell::occupants)
            .unwrap_or_default()
            .iter()
            .filter_map(move |id| world.elements.get(id))
    }

    /// Number of registered elements.
    #[must_use]
    pub fn element_count(world: &World) -> usize {
        world.elements.len()
    }

    /// Number of registered elements of one kind.
    #[must_use]
    pub fn count_by_kind(world: &World, kind: ElementKind) -> usize {
        elements_by_kind(world, kind).count()
    }

    /// World-space distance between the centres of two elements' cells.
    #[must_use]
    pub fn distance_between_elements(world: &World, a: ElementId, b: ElementId) -> Option<f32> {
        let first = element(world, a)?.coordinate();
        let second = element(world, b)?.coordinate();
        Some(world.world_distance(first, second))
    }

    /// Manhattan distance between two elements' cells.
    #[must_use]
    pub fn grid_distance_between_elements(
        world: &World,
        a: ElementId,
        b: ElementId,
    ) -> Option<u32> {
        let first = element(world, a)?.coordinate();
        let second = element(world, b)?.coordinate();
        Some(first.manhattan_distance(second))
    }

    /// Characters strictly closer than `distance` Manhattan steps to `origin`,
    /// excluding any standing in the origin cell itself.
    #[must_use]
    pub fn characters_within(
        world: &World,
        origin: GridCoordinate,
        distance: u32,
    ) -> Vec<ElementId> {
        elements_by_kind(world, ElementKind::Character)
            .filter(|character| {
                let at = character.coordinate();
                at != origin && at.manhattan_distance(origin) < distance
            })
            .map(MapElement::id)
            .collect()
    }

    /// Read-only descriptions of every registered element.
    #[must_use]
    pub fn element_snapshots(world: &World) -> Vec<ElementSnapshot> {
        elements(world).map(snapshot).collect()
    }

    /// Read-only description of one element.
    #[must_use]
    pub fn snapshot(element: &Element) -> ElementSnapshot {
        ElementSnapshot {
            id: element.id(),
            kind: element.kind(),
            name: element.name().to_owned(),
            coordinate: element.coordinate(),
            vision_distance: element.vision_distance(),
            status: element.status(),
        }
    }
}

fn build_cells(grid: &GridSystem) -> Vec<MapCell> {
    (0..grid.configuration().total_cells())
        .map(|index| {
            let coordinate = grid.coordinate_from_linear_index(index);
            MapCell::new(coordinate, grid.coordinate_to_world_center(coordinate))
        })
        .collect()
}

fn build_element(blueprint: ElementBlueprint, clock: u64) -> Element {
    let ElementBlueprint {
        id,
        name,
        description,
        linear_index,
        vision_distance,
        traits,
    } = blueprint;
    let vision = vision_distance.unwrap_or(match traits.kind() {
        ElementKind::Character => DEFAULT_CHARACTER_VISION,
        ElementKind::Item => DEFAULT_ITEM_VISION,
        ElementKind::Obstacle => DEFAULT_OBSTACLE_VISION,
    });
    let base = ElementBase::new(id, name, description, vision, linear_index, clock);
    match traits {
        ElementTraits::Character(traits) => Element::Character(Character::new(base, &traits)),
        ElementTraits::Item(traits) => Element::Item(Item::new(base, &traits)),
        ElementTraits::Obstacle(traits) => Element::Obstacle(Obstacle::new(base, &traits)),
    }
}

fn passable(elements: &BTreeMap<ElementId, Element>) -> impl Fn(ElementId) -> bool + '_ {
    move |id| {
        elements
            .get(&id)
            .map_or(true, |element| element.can_be_traversed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turngrid_core::{CharacterTraits, ItemTraits, ObstacleTraits};

    fn blueprint(id: u32, linear_index: u32, traits: ElementTraits) -> ElementBlueprint {
        ElementBlueprint {
            id: ElementId::new(id),
            name: format!("element-{id}"),
            description: String::new(),
            linear_index,
            vision_distance: None,
            traits,
        }
    }

    fn register(world: &mut World, blueprint: ElementBlueprint) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::RegisterElement { blueprint }, &mut events);
        events
    }

    #[test]
    fn apply_configures_grid() {
        let mut world = World::new();
        let _ = register(
            &mut world,
            blueprint(1, 0, ElementTraits::Character(CharacterTraits::default())),
        );
        let mut events = Vec::new();
        let configuration = GridConfiguration {
            width: 12,
            height: 8,
            ..GridConfiguration::default()
        };

        apply(
            &mut world,
            Command::ConfigureGrid { configuration },
            &mut events,
        );

        assert_eq!(query::grid(&world).width(), 12);
        assert_eq!(query::cells(&world).len(), 96);
        assert_eq!(query::element_count(&world), 0);
        assert_eq!(
            events,
            vec![Event::GridConfigured {
                width: 12,
                height: 8
            }]
        );
    }

    #[test]
    fn registration_resolves_the_configured_index() {
        let mut world = World::new();
        let events = register(
            &mut world,
            blueprint(1, 34, ElementTraits::Item(ItemTraits::default())),
        );

        let at = GridCoordinate::new(3, 4);
        assert_eq!(
            events,
            vec![Event::ElementRegistered {
                id: ElementId::new(1),
                kind: ElementKind::Item,
                at,
            }]
        );
        let element = query::element(&world, ElementId::new(1)).expect("registered");
        assert_eq!(element.coordinate(), at);
        assert_eq!(element.vision_distance(), DEFAULT_ITEM_VISION);
        assert!(query::cell(&world, at)
            .expect("cell")
            .contains(ElementId::new(1)));
    }

    #[test]
    fn duplicate_and_out_of_range_registrations_are_rejected() {
        let mut world = World::new();
        let _ = register(
            &mut world,
            blueprint(1, 5, ElementTraits::Item(ItemTraits::default())),
        );
        let duplicate = register(
            &mut world,
            blueprint(1, 6, ElementTraits::Item(ItemTraits::default())),
        );
        assert_eq!(
            duplicate,
            vec![Event::RegistrationRejected {
                id: ElementId::new(1),
                reason: NavigationError::AlreadyRegistered,
            }]
        );
        assert_eq!(
            query::element(&world, ElementId::new(1)).map(MapElement::coordinate),
            Some(GridCoordinate::new(0, 5))
        );

        let outside = register(
            &mut world,
            blueprint(2, 100, ElementTraits::Item(ItemTraits::default())),
        );
        assert_eq!(
            outside,
            vec![Event::RegistrationRejected {
                id: ElementId::new(2),
                reason: NavigationError::InvalidCoordinate,
            }]
        );
    }

    #[test]
    fn cells_accept_a_bounded_number_of_occupants() {
        let mut world = World::new();
        for id in 0..MAX_OBJECTS_PER_CELL as u32 {
            let _ = register(
                &mut world,
                blueprint(id, 0, ElementTraits::Item(ItemTraits::default())),
            );
        }
        let overflow = register(
            &mut world,
            blueprint(99, 0, ElementTraits::Item(ItemTraits::default())),
        );
        assert_eq!(
            overflow,
            vec![Event::RegistrationRejected {
                id: ElementId::new(99),
                reason: NavigationError::CellFull,
            }]
        );
    }

    #[test]
    fn shared_cells_spread_their_occupants() {
        let mut world = World::new();
        let _ = register(
            &mut world,
            blueprint(1, 0, ElementTraits::Item(ItemTraits::default())),
        );
        let _ = register(
            &mut world,
            blueprint(2, 0, ElementTraits::Item(ItemTraits::default())),
        );

        let first = query::element(&world, ElementId::new(1)).expect("first");
        let second = query::element(&world, ElementId::new(2)).expect("second");
        assert!(first.base().world_position().x < second.base().world_position().x);
        assert_eq!(first.base().world_position().y, second.base().world_position().y);
    }

    #[test]
    fn wall_preset_blocks_its_cell_until_changed() {
        let mut world = World::new();
        let traits = ObstacleTraits {
            obstacle_type: Some(turngrid_core::ObstacleType::Wall),
            ..ObstacleTraits::default()
        };
        let _ = register(&mut world, blueprint(1, 11, ElementTraits::Obstacle(traits)));
        let at = GridCoordinate::new(1, 1);
        assert!(!query::is_cell_traversable(&world, at));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetObstacleType {
                id: ElementId::new(1),
                obstacle_type: turngrid_core::ObstacleType::Decoration,
            },
            &mut events,
        );
        assert!(query::is_cell_traversable(&world, at));
        assert_eq!(
            events,
            vec![Event::TraversabilityChanged {
                at,
                traversable: true
            }]
        );
    }

    #[test]
    fn tick_advances_the_clock() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Tick, &mut events);
        apply(&mut world, Command::Tick, &mut events);
        assert_eq!(query::clock(&world), 2);
        assert_eq!(events.last(), Some(&Event::TimeAdvanced { tick: 2 }));
    }

    #[test]
    fn snapshots_describe_elements() {
        let mut world = World::new();
        let _ = register(
            &mut world,
            blueprint(3, 12, ElementTraits::Character(CharacterTraits::default())),
        );
        let snapshots = query::element_snapshots(&world);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].coordinate, GridCoordinate::new(1, 2));
        assert_eq!(snapshots[0].vision_distance, DEFAULT_CHARACTER_VISION);
        assert_eq!(snapshots[0].status, "HP 100/100, facing right");
    }
}
