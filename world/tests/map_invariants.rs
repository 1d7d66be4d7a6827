use turngrid_core::{
    CharacterTraits, Command, ElementBlueprint, ElementId, ElementKind, ElementTraits, Event,
    GridCoordinate, ItemTraits, ItemType, NavigationError, ObstacleTraits,
};
use turngrid_world::{self as world, query, vision, MapElement, World};

fn blueprint(id: u32, row: u32, column: u32, traits: ElementTraits) -> ElementBlueprint {
    ElementBlueprint {
        id: ElementId::new(id),
        name: format!("element-{id}"),
        description: String::new(),
        linear_index: row * 10 + column,
        vision_distance: None,
        traits,
    }
}

fn character(id: u32, row: u32, column: u32) -> ElementBlueprint {
    blueprint(
        id,
        row,
        column,
        ElementTraits::Character(CharacterTraits::default()),
    )
}

fn item(id: u32, row: u32, column: u32) -> ElementBlueprint {
    blueprint(
        id,
        row,
        column,
        ElementTraits::Item(ItemTraits {
            item_type: ItemType::Key,
            ..ItemTraits::default()
        }),
    )
}

fn wall(id: u32, row: u32, column: u32) -> ElementBlueprint {
    blueprint(
        id,
        row,
        column,
        ElementTraits::Obstacle(ObstacleTraits::default()),
    )
}

fn register(world: &mut World, blueprint: ElementBlueprint) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::RegisterElement { blueprint }, &mut events);
    events
}

fn move_to(world: &mut World, id: u32, row: i32, column: i32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::MoveElement {
            id: ElementId::new(id),
            to: GridCoordinate::new(row, column),
        },
        &mut events,
    );
    events
}

fn pick_up(world: &mut World, character: u32, item: u32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PickupItem {
            character: ElementId::new(character),
            item: ElementId::new(item),
        },
        &mut events,
    );
    events
}

fn drop_key(world: &mut World, character: u32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::DropItem {
            character: ElementId::new(character),
            item_type: ItemType::Key,
        },
        &mut events,
    );
    events
}

fn coordinate_of(world: &World, id: u32) -> GridCoordinate {
    query::element(world, ElementId::new(id))
        .map(MapElement::coordinate)
        .expect("element should be registered")
}

fn assert_registry_matches_cells(world: &World) {
    for element in query::elements(world) {
        let cell = query::cell(world, element.coordinate()).expect("element must sit on the grid");
        assert!(
            cell.contains(element.id()),
            "cell {} does not list {}",
            cell.coordinate(),
            element.id()
        );
    }
    for cell in query::cells(world) {
        for occupant in cell.occupants() {
            let element = query::element(world, *occupant).expect("occupant must be registered");
            assert_eq!(
                element.coordinate(),
                cell.coordinate(),
                "{} is listed in the wrong cell",
                occupant
            );
        }
        let expected = cell
            .occupants()
            .iter()
            .filter_map(|id| query::element(world, *id))
            .all(|element| element.can_be_traversed());
        assert_eq!(
            cell.is_traversable(),
            expected,
            "traversability of {} is stale",
            cell.coordinate()
        );
    }
}

#[test]
fn mutual_visibility_tracks_movement() {
    let mut world = World::new();
    let _ = register(&mut world, character(1, 0, 0));
    let mut key = item(2, 0, 3);
    key.vision_distance = Some(5);
    let _ = register(&mut world, key);

    assert!(
        vision::can_element_see_element(&world, ElementId::new(1), ElementId::new(2)),
        "distance 3 is within both vision ranges"
    );

    let events = move_to(&mut world, 1, 0, 9);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ElementMoved { .. })));
    assert!(
        !vision::can_element_see_element(&world, ElementId::new(1), ElementId::new(2)),
        "distance 6 exceeds the character's vision"
    );
}

#[test]
fn blocked_move_leaves_everything_unchanged() {
    let mut world = World::new();
    let _ = register(&mut world, wall(1, 2, 2));
    let _ = register(&mut world, character(2, 2, 1));
    let blocked = GridCoordinate::new(2, 2);

    assert!(!query::is_cell_traversable(&world, blocked));

    let events = move_to(&mut world, 2, 2, 2);
    assert_eq!(
        events,
        vec![Event::MoveRejected {
            id: ElementId::new(2),
            to: blocked,
            reason: NavigationError::Blocked,
        }]
    );
    assert_eq!(coordinate_of(&world, 2), GridCoordinate::new(2, 1));
    assert!(query::cell(&world, GridCoordinate::new(2, 1))
        .expect("origin cell")
        .contains(ElementId::new(2)));
    assert!(!query::cell(&world, blocked)
        .expect("blocked cell")
        .contains(ElementId::new(2)));

    let history = query::element(&world, ElementId::new(2))
        .expect("character")
        .context()
        .history();
    assert!(
        history
            .last()
            .is_some_and(|entry| entry.contains("Failed to move to (2, 2)")),
        "the failure is recorded in the character's history"
    );
    assert_registry_matches_cells(&world);
}

#[test]
fn stacked_items_raise_the_cell_cost() {
    let mut world = World::new();
    let _ = register(&mut world, item(1, 4, 4));
    let _ = register(&mut world, item(2, 4, 4));

    let cell = query::cell(&world, GridCoordinate::new(4, 4)).expect("cell");
    assert!((cell.traversal_cost() - 1.2).abs() < 1e-6);
    assert!(cell.is_traversable(), "items never block movement");
    assert_eq!(query::cells_with_elements(&world).count(), 1);
}

#[test]
fn straight_line_on_an_open_row() {
    let world = World::new();
    let line = query::grid(&world)
        .cells_in_line(GridCoordinate::new(0, 0), GridCoordinate::new(0, 5));
    let expected: Vec<_> = (0..=5).map(|column| GridCoordinate::new(0, column)).collect();
    assert_eq!(line, expected);
}

#[test]
fn coordinates_survive_a_world_space_round_trip() {
    let world = World::new();
    let grid = query::grid(&world);
    for cell in query::cells(&world) {
        let center = grid.coordinate_to_world_center(cell.coordinate());
        assert_eq!(grid.world_to_coordinate(center), Some(cell.coordinate()));
    }
}

#[test]
fn unregistering_twice_is_harmless() {
    let mut world = World::new();
    let _ = register(&mut world, item(1, 3, 3));
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::UnregisterElement {
            id: ElementId::new(1),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::UnregisterElement {
            id: ElementId::new(1),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::ElementUnregistered {
            id: ElementId::new(1),
            from: GridCoordinate::new(3, 3),
        }]
    );
    assert_eq!(query::element_count(&world), 0);
    assert!(!query::cell(&world, GridCoordinate::new(3, 3))
        .expect("cell")
        .has_occupants());
}

#[test]
fn moving_unregistered_elements_is_rejected() {
    let mut world = World::new();
    let events = move_to(&mut world, 7, 1, 1);
    assert_eq!(
        events,
        vec![Event::MoveRejected {
            id: ElementId::new(7),
            to: GridCoordinate::new(1, 1),
            reason: NavigationError::NotRegistered,
        }]
    );
}

#[test]
fn immobile_characters_stay_put() {
    let mut world = World::new();
    let _ = register(&mut world, character(1, 0, 0));
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetCanMove {
            id: ElementId::new(1),
            can_move: false,
        },
        &mut events,
    );

    let events = move_to(&mut world, 1, 0, 1);
    assert!(matches!(
        events.as_slice(),
        [Event::MoveRejected {
            reason: NavigationError::Immobile,
            ..
        }]
    ));
    assert_eq!(coordinate_of(&world, 1), GridCoordinate::new(0, 0));
}

#[test]
fn moves_update_facing_and_shared_cells() {
    let mut world = World::new();
    let _ = register(&mut world, character(1, 5, 5));
    let _ = register(&mut world, item(2, 5, 2));

    let events = move_to(&mut world, 1, 5, 2);
    assert!(events.contains(&Event::FacingChanged {
        id: ElementId::new(1),
        facing: turngrid_core::ViewDirection::Left,
    }));

    let cell = query::cell(&world, GridCoordinate::new(5, 2)).expect("cell");
    assert_eq!(cell.occupants(), &[ElementId::new(2), ElementId::new(1)]);
    assert!(!cell.is_traversable(), "a character now stands in the cell");
    assert_eq!(
        query::count_by_kind(&world, ElementKind::Character),
        1,
        "moving never duplicates elements"
    );
    assert_registry_matches_cells(&world);
}

#[test]
fn registry_and_cells_agree_after_mixed_traffic() {
    let mut world = World::new();
    let _ = register(&mut world, character(1, 0, 0));
    let _ = register(&mut world, character(2, 9, 9));
    let _ = register(&mut world, wall(3, 4, 4));
    let _ = register(&mut world, item(4, 1, 1));

    let _ = move_to(&mut world, 1, 1, 1);
    let _ = move_to(&mut world, 2, 4, 4);
    let _ = move_to(&mut world, 2, 0, 0);
    let _ = move_to(&mut world, 1, 0, 0);
    let _ = move_to(&mut world, 1, 3, 4);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::UnregisterElement {
            id: ElementId::new(3),
        },
        &mut events,
    );
    let _ = move_to(&mut world, 2, 4, 4);

    assert_eq!(coordinate_of(&world, 1), GridCoordinate::new(3, 4));
    assert_eq!(coordinate_of(&world, 2), GridCoordinate::new(4, 4));
    assert_registry_matches_cells(&world);

    let _ = move_to(&mut world, 1, 1, 1);
    let picked = pick_up(&mut world, 1, 4);
    assert!(picked
        .iter()
        .any(|event| matches!(event, Event::ItemPickedUp { .. })));
    assert_registry_matches_cells(&world);

    let collision = register(&mut world, wall(4, 5, 5));
    assert!(matches!(
        collision.as_slice(),
        [Event::RegistrationRejected {
            reason: NavigationError::AlreadyRegistered,
            ..
        }]
    ));
    let _ = register(&mut world, wall(5, 5, 5));
    let _ = move_to(&mut world, 1, 2, 2);
    let dropped = drop_key(&mut world, 1);
    assert!(dropped
        .iter()
        .any(|event| matches!(event, Event::ItemDropped { .. })));

    assert_eq!(coordinate_of(&world, 4), GridCoordinate::new(2, 2));
    assert_eq!(coordinate_of(&world, 5), GridCoordinate::new(5, 5));
    assert_registry_matches_cells(&world);
}

#[test]
fn carried_items_keep_their_identifier_reserved() {
    let mut world = World::new();
    let _ = register(&mut world, character(1, 0, 0));
    let _ = register(&mut world, item(5, 0, 0));
    let _ = pick_up(&mut world, 1, 5);
    assert!(query::element(&world, ElementId::new(5)).is_none());

    let events = register(&mut world, wall(5, 5, 5));
    assert_eq!(
        events,
        vec![Event::RegistrationRejected {
            id: ElementId::new(5),
            reason: NavigationError::AlreadyRegistered,
        }]
    );
    let cell = query::cell(&world, GridCoordinate::new(5, 5)).expect("cell");
    assert!(!cell.has_occupants());
    assert!(cell.is_traversable());

    let _ = drop_key(&mut world, 1);
    let key = query::element(&world, ElementId::new(5)).expect("dropped key");
    assert_eq!(key.kind(), ElementKind::Item);
    assert_eq!(key.coordinate(), GridCoordinate::new(0, 0));
    assert_registry_matches_cells(&world);
}

#[test]
fn obstacle_durability_stays_between_zero_and_max() {
    let mut world = World::new();
    let _ = register(
        &mut world,
        blueprint(
            1,
            6,
            6,
            ElementTraits::Obstacle(ObstacleTraits {
                destructible: true,
                max_durability: 100,
                ..ObstacleTraits::default()
            }),
        ),
    );
    let durability = |world: &World| {
        query::element(world, ElementId::new(1))
            .and_then(|element| element.as_obstacle())
            .map(|obstacle| obstacle.durability())
    };

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::DamageObstacle {
            id: ElementId::new(1),
            amount: -50,
        },
        &mut events,
    );
    assert_eq!(durability(&world), Some(100));

    world::apply(
        &mut world,
        Command::RepairObstacle {
            id: ElementId::new(1),
            amount: -250,
        },
        &mut events,
    );
    assert_eq!(durability(&world), None, "worn down to nothing");
    assert!(events.contains(&Event::ObstacleDestroyed {
        id: ElementId::new(1)
    }));
    assert!(query::is_cell_traversable(
        &world,
        GridCoordinate::new(6, 6)
    ));
    assert_registry_matches_cells(&world);
}

#[test]
fn blueprints_load_from_toml() {
    let source = r#"
        [[elements]]
        id = 1
        name = "Ana"
        kind = "character"
        linear_index = 12
        vision_distance = 4
        max_health = 80

        [[elements]]
        id = 2
        name = "old key"
        kind = "item"
        linear_index = 13
        item_type = "Key"

        [[elements]]
        id = 3
        name = "hedge"
        kind = "obstacle"
        linear_index = 14
        obstacle_type = "Wall"
    "#;

    #[derive(serde::Deserialize)]
    struct Layout {
        elements: Vec<ElementBlueprint>,
    }

    let layout: Layout = toml::from_str(source).expect("layout should parse");
    let mut world = World::new();
    for blueprint in layout.elements {
        let events = register(&mut world, blueprint);
        assert!(
            matches!(events.as_slice(), [Event::ElementRegistered { .. }]),
            "unexpected events {events:?}"
        );
    }

    let ana = query::character(&world, ElementId::new(1)).expect("character");
    assert_eq!(ana.max_health(), 80);
    assert_eq!(ana.vision_distance(), 4);
    assert_eq!(
        query::element(&world, ElementId::new(2))
            .and_then(|element| element.as_item())
            .map(|key| key.item_type()),
        Some(ItemType::Key)
    );
    assert!(!query::is_cell_traversable(
        &world,
        GridCoordinate::new(1, 4)
    ));
}
