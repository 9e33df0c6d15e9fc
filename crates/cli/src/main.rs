// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use bookdeck_catalog::{CatalogPanel, SymphoniaProbe};
use bookdeck_cli::{settings, view, Command, Event, Reply, Session};
use bookdeck_config::{Config, ConfigManager};
use bookdeck_core::{BookId, Catalog, ChapterId, SignalBus};
use bookdeck_playback::{report_channel, ClockTransport};
use clap::{Arg, ArgMatches, Command as Cli};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn build_cli() -> Cli {
    Cli::new("bookdeck")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Bookdeck Contributors")
        .about("Audiobook player with a chapter catalog")
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("FILE")
                .help("JSON catalog to load instead of the sample books")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Cli::new("books").about("List every book in the catalog"))
        .subcommand(
            Cli::new("chapters")
                .about("List a book's chapters with their measured lengths")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Book id")),
        )
        .subcommand(
            Cli::new("play")
                .about("Start an interactive player session")
                .arg(Arg::new("id").value_name("BOOK_ID").help("Book to start with")),
        )
        .subcommand(
            Cli::new("config")
                .about("Inspect or change settings")
                .subcommand_required(true)
                .subcommand(Cli::new("show").about("Print the effective settings"))
                .subcommand(Cli::new("keys").about("List setting keys and their variables"))
                .subcommand(
                    Cli::new("get")
                        .about("Print one effective setting")
                        .arg(Arg::new("key").required(true).value_name("KEY")),
                )
                .subcommand(
                    Cli::new("set")
                        .about("Write one setting to config.toml")
                        .arg(Arg::new("key").required(true).value_name("KEY"))
                        .arg(Arg::new("value").required(true).value_name("VALUE")),
                )
                .subcommand(Cli::new("init").about("Create config.toml with defaults"))
                .subcommand(Cli::new("reset").about("Overwrite config.toml with defaults")),
        )
}

fn open_config(matches: &ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<PathBuf>("config") {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to open config directory")
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let manager = open_config(matches)?;
    manager
        .load_effective()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))
}

fn run_config(matches: &ArgMatches, sub_matches: &ArgMatches) -> Result<()> {
    let manager = open_config(matches)?;
    let arg = |name: &str| {
        sub_matches
            .subcommand()
            .and_then(|(_, m)| m.get_one::<String>(name))
            .map(String::as_str)
            .ok_or_else(|| anyhow::anyhow!("Missing {}", name))
    };

    let out = match sub_matches.subcommand_name() {
        Some("show") => settings::show(&manager)?,
        Some("keys") => settings::keys(),
        Some("get") => settings::get(&manager, arg("key")?)?,
        Some("set") => settings::set(&manager, arg("key")?, arg("value")?)?,
        Some("init") => settings::init(&manager)?,
        Some("reset") => settings::reset(&manager)?,
        _ => anyhow::bail!("Unknown config action"),
    };
    println!("{}", out.trim_end());
    Ok(())
}

fn load_catalog(matches: &ArgMatches) -> Result<Arc<Catalog>> {
    let catalog = match matches.get_one::<PathBuf>("catalog") {
        Some(path) => Catalog::from_json_file(path)
            .inspect_err(|e| eprintln!("{} {}", style("✗").red().bold(), e.user_message()))
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::sample(),
    };
    Ok(Arc::new(catalog))
}

async fn show_chapters(catalog: Arc<Catalog>, config: &Config, id: &str) -> Result<()> {
    let probe = Arc::new(SymphoniaProbe::new().context("Failed to create metadata probe")?);
    let (mut panel, mut probes) =
        CatalogPanel::new(SignalBus::default(), catalog, probe, &config.catalog)?;

    panel.select_book(&BookId::new(id))?;
    panel.refresh_durations();

    println!("Measuring {} chapters...", panel.visible_chapters().len());
    while panel.pending_probes() > 0 {
        match probes.recv().await {
            Some(outcome) => panel.handle_probe_outcome(outcome),
            None => break,
        }
    }

    print!("{}", view::chapter_list(&panel));
    Ok(())
}

async fn run_player(catalog: Arc<Catalog>, config: &Config, book: Option<&String>) -> Result<()> {
    let (reports_tx, reports) = report_channel();
    let transport = ClockTransport::spawn(reports_tx);
    let probe = Arc::new(SymphoniaProbe::new().context("Failed to create metadata probe")?);

    let mut session = Session::new(catalog, config, Box::new(transport), reports, probe)?;
    if let Some(id) = book {
        session.apply(Command::Book(BookId::new(id.as_str())))?;
    }

    println!("{}", style("Bookdeck").bold().cyan());
    println!("Type 'help' for commands.\n");
    println!("{}", view::status_line(session.now_playing()));

    let mut shown: (ChapterId, bool) = {
        let state = session.now_playing();
        (state.chapter.id.clone(), state.playing)
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(command) => match session.apply(command) {
                        Ok(Reply::Quit) => break,
                        Ok(Reply::Text(text)) => println!("{}", text),
                        Ok(Reply::Done) => {}
                        Err(e) => eprintln!("{} {:#}", style("✗").red().bold(), e),
                    },
                    Err(e) => eprintln!("{} {}", style("✗").red().bold(), e),
                }
            }
            event = session.next_event() => {
                let Some(event) = event else {
                    break;
                };
                let changed = matches!(
                    &event,
                    Event::NowPlaying(state) if state.chapter.id != shown.0 || state.playing != shown.1
                );
                session.dispatch(event);

                if changed {
                    let state = session.now_playing();
                    shown = (state.chapter.id.clone(), state.playing);
                    println!("{}", view::status_line(state));
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config = load_config(&matches);
    let level = config
        .as_ref()
        .map(|c| c.app.log_level.to_string())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = config.unwrap_or_else(|e| {
        log::warn!("{:#}; using default settings", e);
        Config::default()
    });
    if let Some(("config", sub_matches)) = matches.subcommand() {
        return run_config(&matches, sub_matches);
    }
    let catalog = load_catalog(&matches)?;

    match matches.subcommand() {
        Some(("books", _)) => {
            print!("{}", view::book_list(&catalog));
            Ok(())
        }
        Some(("chapters", sub_matches)) => {
            let id = sub_matches
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("Book ID is required"))?;
            show_chapters(catalog, &config, id).await
        }
        Some(("play", sub_matches)) => {
            run_player(catalog, &config, sub_matches.get_one::<String>("id")).await
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
