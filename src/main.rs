//! Binary entrypoint for the Lumenforge CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and create the character store
//! - `create <name>` / `list` / `show <id>` / `delete <id>` - manage characters
//! - `skills [--category <c>]` - print the skill catalog
//! - `unlock <id> <skill> [--dev]` / `refund <id> <skill>` - spend and recover lumens
//! - `race <id> <race>` / `monster <id> on|off` - set character type
//! - `upgrade <id> <stat>` / `grant <id> <amount>` - stats and rewards
//!
//! See the library crate docs for module-level details: `lumenforge::`.
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use lumenforge::config::Config;
use lumenforge::progression::{
    Character, ElementalAffinities, ProgressionEngine, SkillCategory, SledCharacterStore,
    StatKind,
};

#[derive(Parser)]
#[command(name = "lumenforge")]
#[command(about = "Character progression: skill unlocks, cascading refunds and lumens")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the character store
    Init,
    /// Create a new character
    Create { name: String },
    /// List stored character ids
    List,
    /// Show a character and its progression summary
    Show { id: String },
    /// Print the skill catalog
    Skills {
        /// Only this category (weapon, magic, profession, monster, fusion, ultimate, racial)
        #[arg(long)]
        category: Option<String>,
    },
    /// Unlock a skill
    Unlock {
        id: String,
        skill: String,
        /// Skip eligibility checks (funds are still required)
        #[arg(long)]
        dev: bool,
    },
    /// Refund a skill and everything unlocked that depends on it
    Refund { id: String, skill: String },
    /// Assign a race (once)
    Race { id: String, race: String },
    /// Switch monster status on or off
    Monster { id: String, state: Toggle },
    /// Buy one point of a stat
    Upgrade { id: String, stat: String },
    /// Grant lumens
    Grant { id: String, amount: u64 },
    /// Delete a character
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        return run_init(&cli.config).await;
    }

    let config = if std::path::Path::new(&cli.config).exists() {
        Some(Config::load(&cli.config).await?)
    } else {
        None
    };
    init_logging(&config, cli.verbose);
    let config = config.unwrap_or_else(|| {
        warn!("config file {} not found, using defaults", cli.config);
        Config::default()
    });

    let skills = config.skill_catalog()?;
    let races = config.race_catalog()?;

    if let Commands::Skills { category } = &cli.command {
        let filter = match category {
            Some(name) => Some(name.parse::<SkillCategory>()?),
            None => None,
        };
        for (cat, subcategory, skill) in skills.iter() {
            if filter.is_some_and(|wanted| wanted != cat) {
                continue;
            }
            println!(
                "{}/{}  {:<24} tier {}  cost {:>3}  {:?}",
                cat.as_str(),
                subcategory,
                skill.id,
                skill.tier,
                skill.cost,
                skill.prerequisite
            );
        }
        return Ok(());
    }

    let store = SledCharacterStore::open(&config.storage.data_dir)?;
    let elemental = ElementalAffinities::from_catalog(&skills);
    let engine = ProgressionEngine::new(store, skills, races, Box::new(elemental));

    match cli.command {
        Commands::Init | Commands::Skills { .. } => {}
        Commands::Create { name } => {
            let character = engine.create_character(&name)?;
            println!("{}", character.id);
        }
        Commands::List => {
            for id in engine.list_characters()? {
                let character = engine.load_character(&id)?;
                println!("{}  {}", id, character.name);
            }
        }
        Commands::Show { id } => {
            let character = engine.load_character(&id)?;
            print_character(&engine, &character);
        }
        Commands::Unlock { id, skill, dev } => {
            let dev_mode = dev || config.progression.dev_mode;
            let character = engine.unlock_skill(&id, &skill, dev_mode)?;
            println!("unlocked {} ({} lumens left)", skill, character.lumens);
        }
        Commands::Refund { id, skill } => {
            let outcome = engine.refund_skill(&id, &skill)?;
            println!(
                "refunded {} for {} lumens ({} lumens now)",
                outcome.refunded_skill_ids.join(", "),
                outcome.total_refund,
                outcome.character.lumens
            );
        }
        Commands::Race { id, race } => {
            let character = engine.set_character_race(&id, &race)?;
            print_character(&engine, &character);
        }
        Commands::Monster { id, state } => {
            let character = engine.set_monster(&id, matches!(state, Toggle::On))?;
            print_character(&engine, &character);
        }
        Commands::Upgrade { id, stat } => {
            let stat: StatKind = stat.parse()?;
            let character = engine.upgrade_stat(&id, stat)?;
            println!(
                "{} is now {} ({} lumens left)",
                stat,
                character.stats.get(stat),
                character.lumens
            );
        }
        Commands::Grant { id, amount } => {
            let character = engine.grant_lumens(&id, amount)?;
            println!("{} lumens", character.lumens);
        }
        Commands::Delete { id } => {
            engine.delete_character(&id)?;
            println!("deleted {}", id);
        }
    }

    Ok(())
}

async fn run_init(path: &str) -> Result<()> {
    info!("Initializing new Lumenforge configuration");
    if std::path::Path::new(path).exists() {
        warn!("{} already exists, leaving it untouched", path);
    } else {
        Config::create_default(path).await?;
        info!("Configuration file created at {}", path);
    }
    let config = Config::load(path).await?;
    tokio::fs::create_dir_all(&config.storage.data_dir).await?;
    let store = SledCharacterStore::open(&config.storage.data_dir)?;
    drop(store);
    info!("Character store ready at {}", config.storage.data_dir);
    println!("Edit {} to point at custom catalogs if needed.", path);
    Ok(())
}

fn print_character<S>(engine: &ProgressionEngine<S>, character: &Character)
where
    S: lumenforge::progression::CharacterStore,
{
    let summary = engine.summarize(character);
    println!("{} ({})", character.name, character.id);
    println!("  kind: {:?}", summary.kind);
    println!(
        "  lumens: {}  spent: {}  gil: {}",
        character.lumens, character.total_lumens_spent, character.gil
    );
    println!(
        "  level {} (tier points {}, stat points {}), investment {}",
        summary.level, summary.tier_points, summary.stat_points, summary.investment_value
    );
    println!(
        "  hp {}/{}  stamina {}/{}",
        character.vitals.current_hp,
        character.vitals.max_hp,
        character.vitals.current_stamina,
        character.vitals.max_stamina
    );
    for stat in StatKind::ALL {
        println!("  {:<16} {}", stat.as_str(), character.stats.get(stat));
    }
    if !character.abilities.is_empty() {
        let abilities: Vec<&str> = character.abilities.iter().map(String::as_str).collect();
        println!("  abilities: {}", abilities.join(", "));
    }
    if let Some(text) = &character.passive_trait {
        println!("  passive: {}", text);
    }
    for (bucket, ids) in character.unlocked.buckets() {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        println!("  [{}] {}", bucket, ids.join(", "));
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(Config::log_level)
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            // Piped output stays clean for scripting; the file has everything.
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
