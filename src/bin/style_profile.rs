use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use stylebase::profiles::{ProfileError, ProfileStore};
use stylebase::records::load_records;
use stylebase::workspace::{config_file_path, load_or_default, save};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        let code = match err.downcast_ref::<ProfileError>() {
            Some(ProfileError::InsufficientData) => 2,
            Some(ProfileError::ProfileNotFound(_)) => 3,
            Some(_) => 4,
            None => 1,
        };
        eprintln!("error: {err:#}");
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let mut config = load_or_default()?;
    if let Some(dir) = args.profiles_dir.clone() {
        config.storage.profiles_dir = Some(dir);
    }
    if let Command::Init = args.command {
        save(&config)?;
        println!("Configuration recorded at {}", config_file_path()?.display());
        return Ok(());
    }
    let store = ProfileStore::from_config(&config)?;

    match args.command {
        Command::Create {
            identity,
            records,
            clusters,
        } => {
            let records = load_records(&records)?;
            let profile = store.create(&identity, &records, clusters)?;
            println!("{}", profile.summary_message());
            print_profile(&profile, args.json)?;
        }
        Command::Update { identity, records } => {
            let records = load_records(&records)?;
            let profile = store.update(&identity, &records)?;
            println!("Profile updated, now with {} total records", profile.n_records);
            print_profile(&profile, args.json)?;
        }
        Command::Show { identity } => {
            let profile = store.require(&identity)?;
            print_profile(&profile, args.json)?;
        }
        Command::Init => {}
    }
    Ok(())
}

fn print_profile(profile: &stylebase::StyleProfile, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(profile).context("Failed rendering profile as JSON")?;
        println!("{rendered}");
    } else {
        println!("{}", profile.describe());
    }
    Ok(())
}

enum Command {
    Create {
        identity: String,
        records: PathBuf,
        clusters: Option<usize>,
    },
    Update {
        identity: String,
        records: PathBuf,
    },
    Show {
        identity: String,
    },
    Init,
}

struct CliArgs {
    command: Command,
    profiles_dir: Option<PathBuf>,
    json: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut positional = Vec::new();
        let mut clusters = None;
        let mut profiles_dir = None;
        let mut json = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--clusters" | "-k" => {
                    let value = args
                        .next()
                        .context("Expected a number after --clusters")?;
                    let parsed = value
                        .parse::<usize>()
                        .with_context(|| format!("Invalid cluster count '{value}'"))?;
                    clusters = Some(parsed);
                }
                "--profiles-dir" => {
                    let value = args
                        .next()
                        .context("Expected a directory after --profiles-dir")?;
                    profiles_dir = Some(PathBuf::from(value));
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    return Err(anyhow!(
                        "Unknown argument '{other}'. Run with --help for usage instructions."
                    ));
                }
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let verb = positional
            .next()
            .context("Expected a command: init, create, update or show")?;
        if verb == "init" {
            if let Some(extra) = positional.next() {
                return Err(anyhow!("Unexpected argument '{extra}'"));
            }
            return Ok(Self {
                command: Command::Init,
                profiles_dir,
                json,
            });
        }
        let identity = positional
            .next()
            .context("Expected an identity after the command")?;
        let command = match verb.as_str() {
            "create" => Command::Create {
                identity,
                records: positional
                    .next()
                    .map(PathBuf::from)
                    .context("create needs a records JSON file")?,
                clusters,
            },
            "update" => Command::Update {
                identity,
                records: positional
                    .next()
                    .map(PathBuf::from)
                    .context("update needs a records JSON file")?,
            },
            "show" => Command::Show { identity },
            other => return Err(anyhow!("Unknown command '{other}'")),
        };
        if let Some(extra) = positional.next() {
            return Err(anyhow!("Unexpected argument '{extra}'"));
        }
        Ok(Self {
            command,
            profiles_dir,
            json,
        })
    }
}

fn print_usage() {
    println!("StyleBase style profiles");
    println!("Usage: cargo run --bin style_profile -- <command> <identity> [records.json] [options]");
    println!("Commands:");
    println!("  init                               Write config.toml with current settings");
    println!("  create <identity> <records.json>   Fit a new profile from a batch of records");
    println!("  update <identity> <records.json>   Fold new records into an existing profile");
    println!("  show <identity>                    Print the stored profile");
    println!("Options:");
    println!("  --clusters <n>        Requested style modes for create (default from config)");
    println!("  --profiles-dir <dir>  Override where profiles are stored");
    println!("  --json                Print the profile as JSON");
}
