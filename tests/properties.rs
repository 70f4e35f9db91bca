use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hexgrove::{
    availability::AvailabilityService,
    composition::{TileComposition, MAX_LEVEL},
    deck::{TileDeck, TileGroup, TileType},
    economy::CostCurve,
    grid::{FlatSurface, GridBounds, HexGrid},
    runtime::{TemplateHandle, TileRuntimeStore},
    SimEvent,
};

fn grid(rows: u32, cols: u32) -> HexGrid {
    let mut grid = HexGrid::new();
    grid.build(rows, cols, GridBounds::default(), &FlatSurface);
    grid
}

proptest! {
    #[test]
    fn neighbors_are_symmetric(rows in 1u32..12, cols in 1u32..12) {
        let grid = grid(rows, cols);
        for tile in grid.tiles() {
            let neighbors: Vec<_> = grid.neighbors(tile.id).collect();
            prop_assert!(neighbors.len() <= 6);
            for neighbor in neighbors {
                prop_assert_ne!(neighbor, tile.id);
                prop_assert!(grid.neighbors(neighbor).any(|back| back == tile.id));
            }
        }
    }

    #[test]
    fn validate_keeps_levels_in_range(
        grass in any::<i32>(),
        bush in any::<i32>(),
        tree in any::<i32>(),
    ) {
        let mut composition = TileComposition { grass_level: grass, bush_level: bush, tree_level: tree };
        composition.validate();
        for level in [composition.grass_level, composition.bush_level, composition.tree_level] {
            prop_assert!((0..=MAX_LEVEL).contains(&level));
        }
        if (0..=MAX_LEVEL).contains(&grass) {
            prop_assert_eq!(composition.grass_level, grass);
        }
    }

    #[test]
    fn frontier_touches_occupied_tiles_only(
        rows in 1u32..9,
        cols in 1u32..9,
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..10),
    ) {
        let grid = grid(rows, cols);
        let mut store = TileRuntimeStore::for_grid(&grid);
        for pick in &picks {
            let tile = grid.tiles()[pick.index(grid.len())].id;
            store.mark_occupied(tile, None, None, None);
        }

        let frontier: Vec<_> = AvailabilityService::new().available(&grid, &mut store).collect();
        for tile in &frontier {
            prop_assert!(!store.is_occupied(*tile));
            prop_assert!(grid.neighbors(*tile).any(|n| store.is_occupied(n)));
        }
        for tile in grid.tiles() {
            let expected = !store.is_occupied(tile.id)
                && grid.neighbors(tile.id).any(|n| store.is_occupied(n));
            prop_assert_eq!(frontier.contains(&tile.id), expected);
        }
    }

    #[test]
    fn occupied_count_tracks_runtimes(
        ops in proptest::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..40),
    ) {
        let grid = grid(5, 5);
        let mut store = TileRuntimeStore::for_grid(&grid);
        for (pick, occupy) in ops {
            let tile = grid.tiles()[pick.index(grid.len())].id;
            if occupy {
                store.mark_occupied(tile, None, None, None);
            } else {
                store.free(tile);
            }
        }
        let counted = store.iter().filter(|(_, runtime)| runtime.occupied).count();
        prop_assert_eq!(store.occupied_count(), counted);
    }

    #[test]
    fn cost_curve_is_monotone(start in 0.0f64..1_000.0, multiplier in 1.0f64..4.0, count in 0u32..40) {
        let curve = CostCurve::new(start, multiplier);
        prop_assert_eq!(curve.cost_for_next(0), start);
        prop_assert!(curve.cost_for_next(count + 1) >= curve.cost_for_next(count));
    }

    #[test]
    fn deck_drains_exactly_its_target(target in 0usize..40, seed in any::<u64>()) {
        let mut deck = TileDeck::new(vec![
            TileGroup {
                tile_type: TileType::Field,
                templates: vec![TemplateHandle(1), TemplateHandle(2)],
                display_name: None,
            },
            TileGroup {
                tile_type: TileType::Rocks,
                templates: vec![TemplateHandle(3)],
                display_name: None,
            },
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        deck.rebuild(target, &mut rng);

        let mut drawn = 0;
        while deck.draw_tile().is_some() {
            drawn += 1;
        }
        prop_assert!(deck.draw_tile().is_none());
        prop_assert_eq!(drawn, target);

        let emptied = deck
            .outbox()
            .drain()
            .filter(|e| matches!(e, SimEvent::DeckEmptied))
            .count();
        prop_assert_eq!(emptied, 1);
    }
}
