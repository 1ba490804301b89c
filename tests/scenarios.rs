use gutflora::config::Config;
use gutflora::engine::Engine;
use gutflora::model::{Action, Outcome, Phase, SimulationState};
use gutflora::rng::RandomSource;
use gutflora::session::Session;
use rmp_serde::{decode, encode};

const SEED: u64 = 42;

fn make_engine() -> Engine {
    Engine::new(Config::default())
}

fn start(engine: &Engine, seed: u64) -> SimulationState {
    engine.create_initial_state(&mut RandomSource::new(seed), seed)
}

fn tick(engine: &Engine, state: &SimulationState) -> SimulationState {
    let mut rng = RandomSource::for_tick(state.seed, state.tick);
    engine.tick(state, &mut rng)
}

fn run(engine: &Engine, mut state: SimulationState, ticks: u64) -> SimulationState {
    for _ in 0..ticks {
        state = tick(engine, &state);
    }
    state
}

fn act(engine: &Engine, state: &SimulationState, action: Action) -> SimulationState {
    let mut rng = RandomSource::for_action(state.seed, state.tick);
    engine.apply_action(state, action, &mut rng)
}

fn assert_within_capacity(state: &SimulationState, capacity: f64) {
    let occupied = state.commensal_total() + state.pathogen.total();
    assert!(
        occupied <= capacity + 1e-9,
        "tick {}: occupied {occupied}",
        state.tick
    );
}

fn assert_non_negative(state: &SimulationState) {
    assert!(state.pathogen.spores >= 0.0);
    assert!(state.pathogen.vegetative >= 0.0);
    assert!((0.0..=1.0).contains(&state.pathogen.toxin_level));
    assert!((0.0..=100.0).contains(&state.health_score));
    for sp in &state.species {
        assert!(sp.abundance >= 0.0, "{} has abundance {}", sp.name, sp.abundance);
    }
}

#[test]
fn untreated_gut_stays_healthy() {
    let engine = make_engine();
    let state = run(&engine, start(&engine, SEED), 10);

    assert!(state.total_commensal_abundance > 0.7);
    assert!(state.pathogen.vegetative < 0.05);
    assert_eq!(state.phase, Phase::HealthyBaseline);
    assert_eq!(state.outcome, None);
}

#[test]
fn antibiotics_wipe_out_commensals_but_spare_spores() {
    let engine = make_engine();
    let state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);
    let state = run(&engine, state, 10);

    assert!(state.total_commensal_abundance < 0.1);
    assert!(state.pathogen.spores > 0.0);
    assert!(!state.antibiotic.active);
}

#[test]
fn therapeutic_after_antibiotics_cures() {
    let engine = make_engine();
    let state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);
    let state = run(&engine, state, 15);
    let state = act(&engine, &state, Action::AdministerTherapeutic);
    let state = run(&engine, state, 80);

    assert_eq!(state.outcome, Some(Outcome::DurableCure));
    assert_eq!(state.phase, Phase::Resolved);
    assert!(state.total_commensal_abundance > 0.5);
    assert!(state.pathogen.vegetative < 0.1);
}

#[test]
fn session_matches_engine_driven_run() {
    let engine = make_engine();
    let state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);
    let state = run(&engine, state, 15);
    let state = act(&engine, &state, Action::AdministerTherapeutic);
    let state = run(&engine, state, 80);

    let mut session = Session::new(Config::default(), SEED);
    session.act(Action::AdministerAntibiotics).unwrap();
    session.advance(14).unwrap();
    session.act(Action::AdministerTherapeutic).unwrap();
    session.advance(79).unwrap();

    let session_state = session.state();
    assert_eq!(session_state.outcome, Some(Outcome::DurableCure));
    assert!(session_state.tick <= state.tick);
    let n_entries = session_state.history.len();
    assert_eq!(session_state.history[..], state.history[..n_entries]);
    assert!(session.advance(1).is_err());
}

#[test]
fn same_seed_is_bit_identical() {
    let engine = make_engine();
    let run_a = run(&engine, start(&engine, SEED), 30);
    let run_b = run(&engine, start(&engine, SEED), 30);
    assert_eq!(run_a, run_b);

    let run_c = run(&engine, start(&engine, SEED + 1), 30);
    assert_ne!(run_a, run_c);
}

#[test]
fn any_tick_replays_from_its_seed_and_tick() {
    let engine = make_engine();
    let state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);
    let midway = run(&engine, state, 12);
    let expected = run(&engine, midway.clone(), 8);

    // A snapshot restored from disk carries only its seed and tick forward.
    let bytes = encode::to_vec(&midway).unwrap();
    let restored: SimulationState = decode::from_slice(&bytes).unwrap();
    assert_eq!(restored.seed, SEED);
    assert_eq!(restored.tick, 12);

    let replayed = run(&engine, restored, 8);
    assert_eq!(replayed, expected);
}

#[test]
fn recurrences_count_each_crossing_once() {
    let engine = make_engine();
    let bloom = engine.cfg().pathogen.bloom_threshold;
    let mut state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);

    let mut crossings = 0;
    for _ in 0..50 {
        let next = tick(&engine, &state);
        if state.pathogen.vegetative < bloom && next.pathogen.vegetative >= bloom {
            crossings += 1;
        }
        state = next;
    }

    assert!(crossings >= 1);
    assert_eq!(state.recurrence_count, crossings);
}

#[test]
fn second_course_springs_the_trap() {
    let engine = make_engine();
    let state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);
    let state = run(&engine, state, 12);
    let state = act(&engine, &state, Action::AdministerAntibiotics);

    assert_eq!(state.antibiotic.courses_given, 2);
    assert_eq!(state.phase, Phase::AntibioticTrap);

    let state = run(&engine, state, 3);
    assert_eq!(state.phase, Phase::AntibioticTrap);
}

#[test]
fn populations_stay_non_negative_and_within_capacity() {
    let engine = make_engine();
    let capacity = engine.cfg().ecosystem.carrying_capacity;
    for seed in 0..5 {
        let mut state = start(&engine, seed);
        let plan = [
            (Action::AdministerAntibiotics, 20),
            (Action::AdministerTherapeutic, 5),
            (Action::AdministerTherapeutic, 20),
            (Action::AdministerAntibiotics, 30),
            (Action::WaitAndMonitor, 10),
        ];
        for (action, ticks) in plan {
            state = act(&engine, &state, action);
            assert_non_negative(&state);
            assert_within_capacity(&state, capacity);
            for _ in 0..ticks {
                state = tick(&engine, &state);
                assert_non_negative(&state);
                assert_within_capacity(&state, capacity);
            }
        }
    }
}

#[test]
fn recovering_gut_never_overfills() {
    let engine = make_engine();
    let capacity = engine.cfg().ecosystem.carrying_capacity;
    for seed in 0..100 {
        let state = act(&engine, &start(&engine, seed), Action::AdministerAntibiotics);
        let state = run(&engine, state, 12);
        let mut state = act(&engine, &state, Action::AdministerTherapeutic);
        for _ in 0..150 {
            state = tick(&engine, &state);
            assert_within_capacity(&state, capacity);
        }
    }
}

#[test]
fn severe_strain_hurts_more() {
    let run_with = |virulence| {
        let mut cfg = Config::default();
        cfg.pathogen.virulence = virulence;
        let engine = Engine::new(cfg);
        let state = act(&engine, &start(&engine, SEED), Action::AdministerAntibiotics);
        run(&engine, state, 30)
    };
    let mild = run_with(1);
    let severe = run_with(10);

    let peak_toxin = |state: &SimulationState| {
        state
            .history
            .iter()
            .map(|entry| entry.toxin_level)
            .fold(0.0, f64::max)
    };
    assert!(peak_toxin(&severe) > peak_toxin(&mild));
    assert!(severe.health_score < mild.health_score);
}
