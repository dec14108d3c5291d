use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use quadrant::abilities::AbilityRegistry;
use quadrant::board::{standard_board, BoardState, Faction, Order, ALL_FACTIONS};
use quadrant::config::{AbilityConfig, GameConfig};
use quadrant::game::Game;
use quadrant::movegen::movement::legal_orders;
use quadrant::movegen::random_orders;
use quadrant::resolve::{NoModifiers, Resolver};

fn opening() -> BoardState {
    BoardState::initial(&standard_board(), 2370, &ALL_FACTIONS)
}

fn all_holds(state: &BoardState) -> Vec<(Order, Faction)> {
    state
        .units()
        .map(|u| (Order::Hold { unit: u.territory }, u.faction))
        .collect()
}

/// One random legal order set per faction, fixed by seed.
fn random_order_set(state: &BoardState, seed: u64) -> Vec<(Order, Faction)> {
    let board = standard_board();
    let mut rng = SmallRng::seed_from_u64(seed);
    ALL_FACTIONS
        .iter()
        .flat_map(|&f| {
            random_orders(&board, f, state, &mut rng)
                .into_iter()
                .map(move |o| (o, f))
        })
        .collect()
}

fn bench_resolve_holds(c: &mut Criterion) {
    let state = opening();
    let orders = all_holds(&state);
    c.bench_function("resolve_21_holds", |b| {
        let mut resolver = Resolver::new(32);
        b.iter(|| resolver.resolve(black_box(&orders), black_box(&state), &NoModifiers))
    });
}

fn bench_resolve_random(c: &mut Criterion) {
    let state = opening();
    let orders = random_order_set(&state, 7);
    let hooks = AbilityRegistry::new(&AbilityConfig::default());
    c.bench_function("resolve_random_with_ability_hooks", |b| {
        let mut resolver = Resolver::new(32);
        b.iter(|| resolver.resolve(black_box(&orders), black_box(&state), &hooks))
    });
}

fn bench_movegen(c: &mut Criterion) {
    let board = standard_board();
    let state = opening();
    c.bench_function("legal_orders_all_units", |b| {
        b.iter(|| {
            state
                .units()
                .map(|u| legal_orders(&board, black_box(&state), u.territory).len())
                .sum::<usize>()
        })
    });
}

fn bench_full_turn(c: &mut Criterion) {
    let state = opening();
    let orders = random_order_set(&state, 11);
    c.bench_function("game_submit_and_resolve_turn", |b| {
        b.iter_batched(
            || Game::new(GameConfig::default(), &ALL_FACTIONS).unwrap(),
            |mut game| {
                let phase = game.phase_id();
                for f in ALL_FACTIONS {
                    let own: Vec<Order> =
                        orders.iter().filter(|(_, o)| *o == f).map(|(o, _)| *o).collect();
                    game.submit_orders(f, phase, &own).unwrap();
                }
                game.resolve().unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_board_state_clone(c: &mut Criterion) {
    let state = opening();
    c.bench_function("board_state_clone", |b| b.iter(|| black_box(&state).clone()));
}

criterion_group!(
    benches,
    bench_resolve_holds,
    bench_resolve_random,
    bench_movegen,
    bench_full_turn,
    bench_board_state_clone,
);
criterion_main!(benches);
