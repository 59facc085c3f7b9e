use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;

use ti4_companion::catalog::{self, FACTIONS};
use ti4_companion::clock::{Clock, ManualClock};
use ti4_companion::game::{potential_winners, turn_order};
use ti4_companion::{ActionKind, Command, GameState, Phase};

#[derive(Parser)]
#[command(name = "simulate")]
#[command(about = "Play seeded random sessions and check the session invariants")]
struct Args {
    /// Number of sessions to simulate
    #[arg(short = 'n', long, default_value_t = 1)]
    num_sessions: u32,

    /// Players per session (3-8)
    #[arg(short, long, default_value_t = 6)]
    players: u8,

    /// Base seed; session i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Run with turn timers enabled
    #[arg(long)]
    timed: bool,

    /// Give up on a session after this many rounds
    #[arg(long, default_value_t = 12)]
    max_rounds: u32,

    /// Print every applied command
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct SessionReport {
    seed: u64,
    winner: Option<String>,
    rounds: u32,
    applied: u32,
    refused: u32,
    auto_actions: u32,
    violations: Vec<String>,
}

struct Simulation {
    state: GameState,
    clock: ManualClock,
    rng: XorShiftRng,
    report: SessionReport,
    verbose: bool,
}

impl Simulation {
    fn new(seed: u64, timed: bool, verbose: bool) -> Self {
        let mut state = GameState::new();
        state.time_limit_mode = timed;
        Self {
            state,
            clock: ManualClock::new(1_700_000_000_000),
            rng: XorShiftRng::seed_from_u64(seed),
            report: SessionReport {
                seed,
                ..SessionReport::default()
            },
            verbose,
        }
    }

    fn apply(&mut self, command: Command) -> bool {
        let now = self.clock.now_ms();
        let outcome = self.state.apply_command(&command, now);
        if outcome.is_applied() {
            self.report.applied += 1;
            if self.verbose {
                println!("   ✅ {:?}", command);
            }
        } else {
            self.report.refused += 1;
        }
        self.check(&format!("{:?}", command));
        outcome.is_applied()
    }

    fn wait(&mut self, ms: u64) {
        let now = self.clock.advance(ms);
        let events = self.state.tick(now);
        self.report.auto_actions += events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    ti4_companion::GameEvent::ActionRecorded {
                        kind: ActionKind::TacticalAuto,
                        ..
                    }
                )
            })
            .count() as u32;
        self.check("tick");
    }

    fn check(&mut self, after: &str) {
        for violation in self.state.violations() {
            self.report
                .violations
                .push(format!("after {}: {}", after, violation));
        }
    }

    fn setup(&mut self, players: u8) {
        self.apply(Command::InitializePlayers { count: players });
        let mut factions: Vec<&str> = FACTIONS.iter().map(|f| f.id).collect();
        factions.shuffle(&mut self.rng);
        for (i, faction) in factions.into_iter().take(players as usize).enumerate() {
            self.apply(Command::SelectFaction {
                player_id: format!("player-{}", i),
                faction_id: Some(faction.to_string()),
            });
        }
        let speaker = self.rng.gen_range(0..players);
        self.apply(Command::SetSpeaker {
            player_id: format!("player-{}", speaker),
        });
        self.apply(Command::AdvancePhase);
    }

    fn strategy_phase(&mut self) {
        while let Some(picker) = turn_order::current_picker(&self.state.players).map(|p| p.id.clone()) {
            let taken: Vec<u8> = self
                .state
                .players
                .iter()
                .filter_map(|p| p.strategy_card.map(|c| c.id))
                .collect();
            let free: Vec<u8> = catalog::STRATEGY_CARDS
                .iter()
                .map(|c| c.id)
                .filter(|id| !taken.contains(id))
                .collect();
            let Some(&card_id) = free.choose(&mut self.rng) else {
                break;
            };
            self.apply(Command::SelectStrategyCard {
                player_id: picker,
                card_id,
            });
        }
        self.apply(Command::AdvancePhase);
    }

    fn action_phase(&mut self) {
        const MAX_STEPS: u32 = 400;
        if self.state.time_limit_mode && self.rng.gen_bool(0.5) {
            self.apply(Command::StartEarly);
        }

        for _ in 0..MAX_STEPS {
            if turn_order::first_unpassed(&self.state.players, &self.state.passed_players).is_none() {
                break;
            }
            let Some(actor) = self
                .state
                .acting_player_id()
                .or(self.state.current_turn_player_id.as_deref())
                .map(str::to_string)
            else {
                self.wait(1_000);
                continue;
            };

            let roll = self.rng.gen_range(0..100);
            match roll {
                0..=34 => {
                    self.apply(Command::RecordAction {
                        player_id: actor,
                        kind: ActionKind::Tactical,
                    });
                }
                35..=59 => {
                    self.apply(Command::RecordAction {
                        player_id: actor,
                        kind: ActionKind::Strategic,
                    });
                }
                60..=79 => {
                    self.apply(Command::RecordPass { player_id: actor });
                }
                80..=84 => {
                    self.apply(Command::Undo);
                }
                85..=87 => {
                    self.apply(Command::Extend { player_id: actor });
                }
                88..=89 => {
                    self.apply(Command::TogglePause);
                }
                _ => {
                    let wait = self.rng.gen_range(1..=120) * 1_000;
                    self.wait(wait);
                }
            }
            self.apply(Command::FinishResolve);
        }
        self.apply(Command::AdvancePhase);
    }

    fn scoring(&mut self) {
        for i in 0..self.state.players.len() {
            let delta = self.rng.gen_range(0..=2);
            self.apply(Command::AdjustVp {
                player_id: format!("player-{}", i),
                delta,
            });
        }
    }

    fn run(mut self, players: u8, max_rounds: u32) -> SessionReport {
        self.setup(players);
        while self.state.round <= max_rounds && !self.state.is_finished() {
            self.strategy_phase();
            self.action_phase();
            self.scoring();
            // status -> agenda -> results
            for _ in 0..3 {
                self.apply(Command::AdvancePhase);
            }

            let winners: Vec<String> = potential_winners(&self.state)
                .into_iter()
                .map(|p| p.id.clone())
                .collect();
            if let Some(winner) = winners.choose(&mut self.rng).cloned() {
                self.apply(Command::ConfirmVictory { player_id: winner });
                break;
            }
            self.apply(Command::AdvancePhase);
        }

        self.report.rounds = self.state.round;
        self.report.winner = self.state.winner.clone();
        if self.state.phase != Phase::Results && !self.state.is_finished() {
            log::debug!("Session {} stopped in {}", self.report.seed, self.state.phase);
        }
        self.report
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !(3..=8).contains(&args.players) {
        eprintln!("❌ --players must be between 3 and 8");
        std::process::exit(2);
    }

    println!("🎮 Session Simulation");
    println!("=====================");
    println!("Configuration:");
    println!("  - Players: {}", args.players);
    println!("  - Sessions: {}", args.num_sessions);
    println!("  - Timed: {}", args.timed);
    println!("  - Seed: {}", args.seed);

    let reports: Vec<SessionReport> = (0..args.num_sessions)
        .into_par_iter()
        .map(|i| {
            Simulation::new(args.seed + u64::from(i), args.timed, args.verbose)
                .run(args.players, args.max_rounds)
        })
        .collect();

    let mut failed = 0;
    for report in &reports {
        println!(
            "  Seed {}: {} after {} rounds ({} applied, {} refused, {} auto actions)",
            report.seed,
            report.winner.as_deref().unwrap_or("no winner"),
            report.rounds,
            report.applied,
            report.refused,
            report.auto_actions
        );
        if !report.violations.is_empty() {
            failed += 1;
            for violation in report.violations.iter().take(5) {
                println!("    ❌ {}", violation);
            }
        }
    }

    let finished = reports.iter().filter(|r| r.winner.is_some()).count();
    println!("\n📊 Results:");
    println!("Finished sessions: {}/{}", finished, reports.len());
    println!("Sessions with invariant violations: {}", failed);
    if failed > 0 {
        std::process::exit(1);
    }
}
