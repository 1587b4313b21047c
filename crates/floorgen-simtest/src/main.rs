//! FloorGen Headless Generation Harness
//!
//! Sweeps seeds over the bundled station catalog and validates every floor
//! in-process: determinism, exit reachability, overlap rules, credit
//! conservation, cache replay and save/load.
//!
//! Usage:
//!   cargo run -p floorgen-simtest
//!   cargo run -p floorgen-simtest -- --verbose --seed 12345 --budget 20 --seeds 50
//!   cargo run -p floorgen-simtest -- --json

use floorgen_core::catalog::{RoomCatalog, RoomCategory};
use floorgen_core::config::GeneratorConfig;
use floorgen_core::generator::{GenerationReport, LayoutGenerator};
use floorgen_core::cache::MemoryFloorStore;
use floorgen_core::hooks::RecordingHooks;
use floorgen_core::persistence::{load_floors, save_floors};
use floorgen_core::validate::{validate_layout, Severity};
use serde::Serialize;

// ── Station catalog (same JSON the tests use) ───────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/station_catalog.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    json: bool,
    seed: u64,
    budget: u32,
    seeds: u64,
}

impl Options {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(&args)
    }

    fn parse(args: &[String]) -> Self {
        let value = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
        };
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
            json: args.iter().any(|a| a == "--json"),
            seed: value("--seed").and_then(|v| v.parse().ok()).unwrap_or(12345),
            budget: value("--budget").and_then(|v| v.parse().ok()).unwrap_or(20),
            seeds: value("--seeds").and_then(|v| v.parse().ok()).unwrap_or(25),
        }
    }

    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            door_budget: self.budget,
            cache_layouts: false,
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct Summary {
    passed: usize,
    failed: usize,
    total: usize,
    floors: Vec<GenerationReport>,
}

fn main() {
    let opts = Options::from_args();
    if !opts.json {
        println!("=== FloorGen Generation Harness ===\n");
    }

    let catalog = match RoomCatalog::from_json(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ catalog_parse: {}", e);
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();
    let mut floors = Vec::new();

    // 1. Catalog consistency
    results.extend(validate_catalog(&catalog, &opts));

    // 2. Determinism across identical seeds
    results.extend(validate_determinism(&catalog, &opts));

    // 3. Layout invariants over a seed sweep
    let (sweep, reports) = validate_seed_sweep(&catalog, &opts);
    results.extend(sweep);
    floors.extend(reports);

    // 4. Cache replay
    results.extend(validate_replay(&catalog, &opts));

    // 5. Save/load of floor bookkeeping
    results.extend(validate_persistence(&catalog, &opts));

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    if opts.json {
        let summary = Summary {
            passed,
            failed,
            total,
            floors,
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("{{\"error\": \"{}\"}}", e),
        }
    } else {
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || opts.verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn section(opts: &Options, title: &str) {
    if !opts.json {
        println!("--- {} ---", title);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &RoomCatalog, opts: &Options) -> Vec<TestResult> {
    section(opts, "Catalog");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "catalog_not_empty".into(),
        passed: !catalog.is_empty(),
        detail: format!("{} templates loaded", catalog.len()),
    });

    for category in [RoomCategory::EntryElevator, RoomCategory::ExitElevator] {
        let found = catalog.by_category(category, false).len();
        results.push(TestResult {
            name: format!("catalog_has_{:?}", category).to_lowercase(),
            passed: found > 0,
            detail: format!("{} enabled {:?} templates", found, category),
        });
    }

    let unsealable: Vec<_> = catalog
        .templates()
        .iter()
        .filter(|t| t.geometry.sockets.iter().any(|s| s.blockades.is_empty()))
        .map(|t| t.id.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_sockets_sealable".into(),
        passed: unsealable.is_empty(),
        detail: if unsealable.is_empty() {
            "every socket has a blockade template".into()
        } else {
            format!("sockets without blockades: {}", unsealable.join(", "))
        },
    });

    let inconsistent: Vec<_> = catalog
        .templates()
        .iter()
        .filter(|t| t.socket_count != t.geometry.sockets.len())
        .map(|t| t.id.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_socket_inventory".into(),
        passed: inconsistent.is_empty(),
        detail: format!("{} templates with stale socket counts", inconsistent.len()),
    });

    results
}

// ── 2. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(catalog: &RoomCatalog, opts: &Options) -> Vec<TestResult> {
    section(opts, "Determinism");
    let mut results = Vec::new();

    let mut a = LayoutGenerator::new(catalog.clone(), opts.config(), MemoryFloorStore::new(opts.seed));
    let mut b = LayoutGenerator::new(catalog.clone(), opts.config(), MemoryFloorStore::new(opts.seed));
    let same = match (a.generate(0), b.generate(0)) {
        (Ok(_), Ok(_)) => a.placements() == b.placements(),
        _ => false,
    };
    results.push(TestResult {
        name: "determinism_two_generators".into(),
        passed: same,
        detail: format!("seed {}: {} rooms", opts.seed, a.placements().len()),
    });

    let first = a.placements();
    a.clear();
    let rerun = a.generate(0).is_ok() && a.placements() == first;
    results.push(TestResult {
        name: "determinism_after_clear".into(),
        passed: rerun,
        detail: "regenerating after clear() reproduces the floor".into(),
    });

    results
}

// ── 3. Seed sweep ───────────────────────────────────────────────────────

fn validate_seed_sweep(catalog: &RoomCatalog, opts: &Options) -> (Vec<TestResult>, Vec<GenerationReport>) {
    section(opts, "Seed Sweep");
    let mut results = Vec::new();
    let mut reports = Vec::new();

    let mut failures = Vec::new();
    let mut invalid = Vec::new();
    let mut conservation = Vec::new();
    let mut under_budget = 0;
    let mut nav_rebuilds = 0;

    for offset in 0..opts.seeds {
        let seed = opts.seed.wrapping_add(offset * 7919);
        let mut generator = LayoutGenerator::new(catalog.clone(), opts.config(), MemoryFloorStore::new(seed))
            .with_hooks(RecordingHooks::default());

        let report = match generator.generate(0) {
            Ok(r) => r,
            Err(e) => {
                failures.push(format!("seed {}: {}", seed, e));
                continue;
            }
        };

        if report.connections_made + report.credits_remaining != opts.budget {
            conservation.push(seed);
        }
        if report.under_budget {
            under_budget += 1;
        }
        nav_rebuilds += generator.hooks().navigation_rebuilds.len();

        if let Some(start) = generator.start_room() {
            let errors: Vec<_> =
                validate_layout(&generator.world, start, generator.config().max_overlap_fraction)
                    .into_iter()
                    .filter(|e| e.severity == Severity::Error)
                    .collect();
            if !errors.is_empty() {
                invalid.push(format!("seed {}: {}", seed, errors[0].message));
            }
        }

        if opts.verbose && !opts.json {
            println!(
                "    seed {:>12}: {:>2} rooms, {:>2}/{} connections, attempts {}",
                seed, report.room_count, report.connections_made, opts.budget, report.attempts
            );
        }
        reports.push(report);
    }

    results.push(TestResult {
        name: "sweep_exit_placed".into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            format!("{} floors generated", opts.seeds)
        } else {
            failures.join("; ")
        },
    });
    results.push(TestResult {
        name: "sweep_layouts_valid".into(),
        passed: invalid.is_empty(),
        detail: if invalid.is_empty() {
            "no illegal overlap, sockets symmetric, exit reachable".into()
        } else {
            invalid.join("; ")
        },
    });
    results.push(TestResult {
        name: "sweep_credit_conservation".into(),
        passed: conservation.is_empty(),
        detail: format!("{} floors violate connections + credits == budget", conservation.len()),
    });
    results.push(TestResult {
        name: "sweep_navigation_rebuilt".into(),
        passed: nav_rebuilds == reports.len(),
        detail: format!("{} rebuilds for {} floors", nav_rebuilds, reports.len()),
    });
    results.push(TestResult {
        name: "sweep_budget_usage".into(),
        passed: true,
        detail: format!("{} of {} floors accepted under budget", under_budget, reports.len()),
    });

    (results, reports)
}

// ── 4. Replay ───────────────────────────────────────────────────────────

fn validate_replay(catalog: &RoomCatalog, opts: &Options) -> Vec<TestResult> {
    section(opts, "Replay");
    let mut results = Vec::new();

    let config = GeneratorConfig {
        cache_layouts: true,
        ..opts.config()
    };
    let mut generator = LayoutGenerator::new(catalog.clone(), config, MemoryFloorStore::new(opts.seed));

    let original = generator.generate(4).ok().map(|_| generator.placements());
    let replayed = generator.generate(4);

    let (passed, detail) = match (original, replayed) {
        (Some(original), Ok(report)) => {
            let same = generator.placements() == original;
            let draws = generator.rng().draws();
            (
                report.replayed && same && draws == 0,
                format!(
                    "replayed={} identical={} rng_draws={}",
                    report.replayed, same, draws
                ),
            )
        }
        (_, Err(e)) => (false, format!("revisit failed: {}", e)),
        (None, _) => (false, "first visit failed".into()),
    };
    results.push(TestResult {
        name: "replay_fidelity".into(),
        passed,
        detail,
    });

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(catalog: &RoomCatalog, opts: &Options) -> Vec<TestResult> {
    section(opts, "Persistence");
    let mut results = Vec::new();

    let config = GeneratorConfig {
        cache_layouts: true,
        ..opts.config()
    };
    let mut generator = LayoutGenerator::new(catalog.clone(), config.clone(), MemoryFloorStore::new(opts.seed));
    let original = match generator.generate(1) {
        Ok(_) => generator.placements(),
        Err(e) => {
            results.push(TestResult {
                name: "persistence_generate".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let mut buffer = Vec::new();
    let saved = save_floors(&mut buffer, generator.store());
    results.push(TestResult {
        name: "persistence_save".into(),
        passed: saved.is_ok(),
        detail: format!("{} bytes", buffer.len()),
    });

    match load_floors(&buffer[..]) {
        Ok(store) => {
            let mut restored = LayoutGenerator::new(catalog.clone(), config, store);
            let same = restored.generate(1).map(|r| r.replayed).unwrap_or(false)
                && restored.placements() == original;
            results.push(TestResult {
                name: "persistence_load_replays".into(),
                passed: same,
                detail: "loaded floor replays the saved layout".into(),
            });
        }
        Err(e) => results.push(TestResult {
            name: "persistence_load_replays".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    results
}
