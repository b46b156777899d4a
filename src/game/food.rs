use crate::game::constants::{FOOD_SPAWN_RANDOM_ATTEMPTS, GRID_SIZE};
use crate::game::types::{Direction, GameState, Point};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

fn is_free(cell: Point, snake: &VecDeque<Point>, obstacles: &HashSet<Point>) -> bool {
    !obstacles.contains(&cell) && !snake.contains(&cell)
}

/// Picks a uniformly random free cell. Returns `None` only when the board is full.
pub fn spawn_food<R: Rng + ?Sized>(
    snake: &VecDeque<Point>,
    obstacles: &HashSet<Point>,
    rng: &mut R,
) -> Option<Point> {
    for _ in 0..FOOD_SPAWN_RANDOM_ATTEMPTS {
        let cell = Point::new(rng.gen_range(0..GRID_SIZE), rng.gen_range(0..GRID_SIZE));
        if is_free(cell, snake, obstacles) {
            return Some(cell);
        }
    }

    // Crowded board: fall back to scanning so the pick stays uniform and terminates.
    let free: Vec<Point> = (0..GRID_SIZE)
        .flat_map(|y| (0..GRID_SIZE).map(move |x| Point::new(x, y)))
        .filter(|cell| is_free(*cell, snake, obstacles))
        .collect();
    free.choose(rng).copied()
}

/// Moves the food one cell, keeping its drift direction when that is still legal.
/// The food stays put when the chosen cell holds the snake. Returns whether it moved.
pub fn drift_food<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) -> bool {
    let legal: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|direction| {
            let next = state.food.step(*direction);
            next.in_bounds() && !state.obstacles.contains(&next)
        })
        .collect();

    if !legal.contains(&state.food_direction) {
        let Some(direction) = legal.choose(rng) else {
            return false;
        };
        state.food_direction = *direction;
    }

    let next = state.food.step(state.food_direction);
    if state.snake.contains(&next) {
        return false;
    }
    state.food = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::obstacles::generate_obstacles;
    use crate::game::types::Difficulty;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_state(food: Point, food_direction: Direction, snake: &[Point]) -> GameState {
        GameState {
            snake: snake.iter().copied().collect(),
            food,
            food_direction,
            direction: Direction::Right,
            next_direction: Direction::Right,
            speed: 150.0,
            obstacles: HashSet::new(),
        }
    }

    #[test]
    fn drift_keeps_previous_direction_when_legal() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = make_state(Point::new(4, 4), Direction::Down, &[Point::new(10, 10)]);
        assert!(drift_food(&mut state, &mut rng));
        assert_eq!(state.food, Point::new(4, 5));
        assert_eq!(state.food_direction, Direction::Down);
    }

    #[test]
    fn drift_turns_away_from_the_edge() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = make_state(Point::new(19, 4), Direction::Right, &[Point::new(10, 10)]);
        assert!(drift_food(&mut state, &mut rng));
        assert_ne!(state.food_direction, Direction::Right);
        assert!(state.food.in_bounds());
    }

    #[test]
    fn drift_avoids_obstacles() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = make_state(Point::new(4, 4), Direction::Right, &[Point::new(10, 10)]);
        state.obstacles.insert(Point::new(5, 4));
        assert!(drift_food(&mut state, &mut rng));
        assert_ne!(state.food, Point::new(5, 4));
    }

    #[test]
    fn drift_into_the_snake_leaves_food_in_place() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = make_state(
            Point::new(4, 4),
            Direction::Right,
            &[Point::new(5, 4), Point::new(6, 4)],
        );
        assert!(!drift_food(&mut state, &mut rng));
        assert_eq!(state.food, Point::new(4, 4));
    }

    #[test]
    fn spawn_finds_the_last_free_cell() {
        let mut rng = StdRng::seed_from_u64(5);
        let snake: VecDeque<Point> = (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| Point::new(x, y)))
            .filter(|cell| *cell != Point::new(13, 2))
            .collect();
        assert_eq!(spawn_food(&snake, &HashSet::new(), &mut rng), Some(Point::new(13, 2)));
    }

    #[test]
    fn spawn_on_a_full_board_gives_up() {
        let mut rng = StdRng::seed_from_u64(6);
        let snake: VecDeque<Point> = (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| Point::new(x, y)))
            .collect();
        assert_eq!(spawn_food(&snake, &HashSet::new(), &mut rng), None);
    }

    proptest! {
        #[test]
        fn spawned_food_is_never_on_snake_or_obstacle(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let obstacles = generate_obstacles(&Difficulty::Hard.settings(), &mut rng);
            let snake: VecDeque<Point> = (3..12).map(|x| Point::new(x, 10)).collect();
            for _ in 0..50 {
                let food = spawn_food(&snake, &obstacles, &mut rng);
                prop_assert!(food.is_some());
                let food = food.unwrap();
                prop_assert!(food.in_bounds());
                prop_assert!(!snake.contains(&food));
                prop_assert!(!obstacles.contains(&food));
            }
        }
    }
}
