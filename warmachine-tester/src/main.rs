mod common;
mod logic;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::{parse_seeds, parse_strategies, run_label, write_export};
use logic::{DelveRecord, SimulationConfig, pregen_party, run_delve};
use warmachine_game::{
    AppState, DelveConfig, FileStorage, MemoryStorage, StatePatch, StateStorage, Store,
};

#[derive(Debug, Parser)]
#[command(name = "warmachine-tester", version = "0.1.0")]
#[command(about = "Automated delve runner for the War Machine engine")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Consecutive seeds to run from each listed seed
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Delve policies to run (comma-separated: cautious, bold)
    #[arg(long, default_value = "cautious,bold")]
    policy: String,

    /// Maximum actions per delve
    #[arg(long, default_value_t = 60)]
    max_actions: u32,

    /// Dungeon level to delve
    #[arg(long, default_value_t = 1)]
    depth: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist each run's state under this directory (one subdirectory per run)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// JSON file with delve rule overrides
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Write an export envelope for each finished run into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Start every run from this export envelope instead of the pregenerated party
    #[arg(long)]
    import: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let seeds = expand_seeds(&parse_seeds(&args.seeds)?, args.iterations);
    let strategies = parse_strategies(&args.policy)?;
    let rules = load_rules(args.rules.as_deref())?;
    let import = args
        .import
        .as_ref()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        })
        .transpose()?;

    let mut records = Vec::new();
    for &strategy in &strategies {
        for &seed in &seeds {
            if args.verbose {
                println!(
                    "🧪 Delving: {} (seed: {seed}, depth: {})",
                    strategy.label().bright_white(),
                    args.depth
                );
            }
            let config = SimulationConfig::new(strategy, seed)
                .with_max_actions(args.max_actions)
                .with_depth(args.depth)
                .with_rules(rules.clone());
            records.push(run_one(&args, &config, import.as_deref())?);
        }
    }

    write_reports(&args, &records, start_time)?;

    if records.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🏰 War Machine Delve Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
    println!("Started {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
}

fn expand_seeds(seeds: &[u64], iterations: usize) -> Vec<u64> {
    seeds
        .iter()
        .flat_map(|&seed| {
            let count = u64::try_from(iterations.max(1)).unwrap_or(1);
            (0..count).map(move |offset| seed.wrapping_add(offset))
        })
        .collect()
}

fn load_rules(path: Option<&Path>) -> Result<DelveConfig> {
    let Some(path) = path else {
        return Ok(DelveConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    DelveConfig::from_json(&raw).with_context(|| format!("invalid rules in {}", path.display()))
}

fn run_one(args: &Args, config: &SimulationConfig, import: Option<&str>) -> Result<DelveRecord> {
    let label = run_label(config.strategy, config.seed);
    if let Some(dir) = &args.state_dir {
        let store = Store::open(FileStorage::new(dir.join(&label)));
        execute(&store, config, import, args.export.as_deref(), &label)
    } else {
        let store = Store::with_initial(AppState::default(), MemoryStorage::new());
        execute(&store, config, import, args.export.as_deref(), &label)
    }
}

fn execute<S: StateStorage>(
    store: &Store<S>,
    config: &SimulationConfig,
    import: Option<&str>,
    export_dir: Option<&Path>,
    label: &str,
) -> Result<DelveRecord> {
    prepare_store(store, import)?;
    let record = run_delve(store, config).context("delve rules rejected")?;
    if let Some(dir) = export_dir {
        let path = write_export(dir, label, &store.export_state()?)?;
        log::info!("exported {label} to {}", path.display());
    }
    Ok(record)
}

/// Imports replace whatever was there; otherwise a persisted party is
/// resumed and an empty roster gets the pregenerated one.
fn prepare_store<S: StateStorage>(store: &Store<S>, import: Option<&str>) -> Result<()> {
    if let Some(raw) = import {
        store.import_state(raw).context("import rejected")?;
    } else if store.read(|state| state.party.roster.is_empty()) {
        store.reset();
        store.set_state(StatePatch {
            party: Some(pregen_party()),
            ..StatePatch::default()
        });
    }
    Ok(())
}

fn write_reports(args: &Args, records: &[DelveRecord], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, records)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, records)?,
        _ => {
            if records.is_empty() {
                writeln!(&mut output_target, "No delves executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    records,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::DelveStrategy;

    fn base_args() -> Args {
        Args {
            seeds: "1337".to_string(),
            iterations: 1,
            policy: "cautious,bold".to_string(),
            max_actions: 30,
            depth: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            state_dir: None,
            rules: None,
            export: None,
            import: None,
        }
    }

    #[test]
    fn seeds_expand_by_iterations() {
        assert_eq!(expand_seeds(&[10, 50], 3), vec![10, 11, 12, 50, 51, 52]);
        assert_eq!(expand_seeds(&[7], 0), vec![7]);
    }

    #[test]
    fn rules_default_without_a_file() {
        assert_eq!(load_rules(None).unwrap(), DelveConfig::default());
    }

    #[test]
    fn rules_file_overrides_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, r#"{ "searchChance": 0.9, "torchesPerTurn": 2 }"#).unwrap();
        let rules = load_rules(Some(&path)).unwrap();
        assert!((rules.search_chance - 0.9).abs() < f64::EPSILON);
        assert_eq!(rules.torches_per_turn, 2);

        fs::write(&path, r#"{ "hostileChance": 3 }"#).unwrap();
        assert!(load_rules(Some(&path)).is_err());
    }

    #[test]
    fn empty_store_gets_the_pregenerated_party() {
        let store = Store::with_initial(AppState::default(), MemoryStorage::new());
        prepare_store(&store, None).unwrap();
        assert_eq!(store.read(|state| state.party.roster.len()), 4);
    }

    #[test]
    fn persisted_party_is_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimulationConfig::new(DelveStrategy::Bold, 5).with_max_actions(10);
        let first = {
            let store = Store::open(FileStorage::new(dir.path()));
            execute(&store, &config, None, None, "bold-seed-5").unwrap();
            store.get_state()
        };
        let store = Store::open(FileStorage::new(dir.path()));
        prepare_store(&store, None).unwrap();
        let resumed = store.get_state();
        assert_eq!(resumed.dungeon.turn, first.dungeon.turn);
        assert_eq!(resumed.party.total_hp(), first.party.total_hp());
    }

    #[test]
    fn import_replaces_the_roster() {
        let source = Store::with_initial(AppState::default(), MemoryStorage::new());
        source.set_state(StatePatch {
            party: Some(warmachine_game::PartyState::with_roster(vec![
                warmachine_game::Character::new("Solo", "Fighter", 3, 20, 2, 17),
            ])),
            ..StatePatch::default()
        });
        let envelope = source.export_state().unwrap();

        let store = Store::with_initial(AppState::default(), MemoryStorage::new());
        prepare_store(&store, None).unwrap();
        prepare_store(&store, Some(&envelope)).unwrap();
        let roster = store.read(|state| state.party.roster.clone());
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Solo");

        assert!(prepare_store(&store, Some("{\"state\": 3}")).is_err());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        let config = SimulationConfig::new(DelveStrategy::Cautious, 1).with_max_actions(20);
        let record = run_one(&args, &config, None).unwrap();
        write_reports(&args, &[record], Instant::now()).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed[0]["policy"], "cautious");
        assert_eq!(parsed[0]["seed"], 1);
    }

    #[test]
    fn export_dir_receives_an_envelope_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            export: Some(dir.path().join("exports")),
            ..base_args()
        };
        let config = SimulationConfig::new(DelveStrategy::Bold, 2).with_max_actions(15);
        run_one(&args, &config, None).unwrap();

        let raw = fs::read_to_string(dir.path().join("exports/bold-seed-2.json")).unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope["schemaVersion"], warmachine_game::constants::STATE_VERSION);
        assert_eq!(envelope["state"]["party"]["roster"].as_array().unwrap().len(), 4);
    }
}
