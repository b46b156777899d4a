use crate::game::constants::{
    GRID_SIZE, MAX_OBSTACLE_ATTEMPTS, MAX_WALL_LENGTH, MIN_WALL_LENGTH, OBSTACLE_WALL_COUNT,
    SPAWN_EXCLUSION_RADIUS,
};
use crate::game::types::{DifficultySettings, Point};
use rand::Rng;
use std::collections::HashSet;

/// Scatters straight wall segments over the board, keeping the spawn area clear.
pub fn generate_obstacles<R: Rng + ?Sized>(
    settings: &DifficultySettings,
    rng: &mut R,
) -> HashSet<Point> {
    let mut cells = HashSet::new();
    if !settings.has_obstacles {
        return cells;
    }

    let target = OBSTACLE_WALL_COUNT * MIN_WALL_LENGTH;
    let mut attempts = 0;
    while cells.len() < target && attempts < MAX_OBSTACLE_ATTEMPTS {
        attempts += 1;
        let length = rng.gen_range(MIN_WALL_LENGTH..=MAX_WALL_LENGTH) as i32;
        let horizontal = rng.gen_bool(0.5);
        let (span_x, span_y) = if horizontal { (length, 1) } else { (1, length) };
        let anchor = Point::new(
            rng.gen_range(0..=GRID_SIZE - span_x),
            rng.gen_range(0..=GRID_SIZE - span_y),
        );

        let segment: Vec<Point> = (0..length)
            .map(|offset| {
                if horizontal {
                    Point::new(anchor.x + offset, anchor.y)
                } else {
                    Point::new(anchor.x, anchor.y + offset)
                }
            })
            .collect();

        if segment
            .iter()
            .any(|cell| in_spawn_zone(*cell) || cells.contains(cell))
        {
            continue;
        }
        cells.extend(segment);
    }

    if cells.len() < target {
        tracing::debug!(
            placed = cells.len(),
            target,
            attempts,
            "obstacle placement ran out of attempts"
        );
    }
    cells
}

pub fn in_spawn_zone(cell: Point) -> bool {
    let center = GRID_SIZE / 2;
    (cell.x - center).abs() < SPAWN_EXCLUSION_RADIUS
        && (cell.y - center).abs() < SPAWN_EXCLUSION_RADIUS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Difficulty;
    use proptest::prelude::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn difficulties_without_obstacles_get_an_empty_set() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(generate_obstacles(&Difficulty::Easy.settings(), &mut rng).is_empty());
        assert!(generate_obstacles(&Difficulty::Medium.settings(), &mut rng).is_empty());
    }

    #[test]
    fn spawn_zone_covers_the_center_square() {
        assert!(in_spawn_zone(Point::new(10, 10)));
        assert!(in_spawn_zone(Point::new(6, 14)));
        assert!(!in_spawn_zone(Point::new(5, 10)));
        assert!(!in_spawn_zone(Point::new(10, 15)));
    }

    #[test]
    fn exhausted_attempts_keep_the_partial_set() {
        // A constant source proposes the same corner wall every time.
        let mut rng = StepRng::new(0, 0);
        let cells = generate_obstacles(&Difficulty::Hard.settings(), &mut rng);
        assert!(!cells.is_empty());
        assert!(cells.len() < OBSTACLE_WALL_COUNT * MIN_WALL_LENGTH);
        for cell in &cells {
            assert!(cell.in_bounds());
            assert!(!in_spawn_zone(*cell));
        }
    }

    proptest! {
        #[test]
        fn hard_obstacles_stay_on_board_and_out_of_spawn(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let cells = generate_obstacles(&Difficulty::Hard.settings(), &mut rng);
            prop_assert!(!cells.is_empty());
            prop_assert!(cells.len() < OBSTACLE_WALL_COUNT * MIN_WALL_LENGTH + MAX_WALL_LENGTH);
            for cell in &cells {
                prop_assert!(cell.in_bounds());
                prop_assert!(!in_spawn_zone(*cell));
            }
        }
    }
}
