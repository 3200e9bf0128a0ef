mod catalog;
mod category;
mod config;
mod executor;
mod files;
mod locale;
mod matcher;
mod model;
mod pinned;
mod sources;
mod state;

use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop::channel::{Event, Sender};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use crate::catalog::Catalog;
use crate::config::{Config, load_config};
use crate::executor::{Launcher, ProcessLauncher};
use crate::files::{FileBatch, FileRequest, PathLookup, WalkLookup, spawn_lookup};
use crate::locale::Locale;
use crate::pinned::{PinnedStore, default_pin_path};
use crate::sources::{app_dirs, desktop::DesktopSource};
use crate::state::{AppState, SearchResult};

#[derive(Parser, Debug)]
#[command(author, version, about = "Application menu with categories, pins and search", long_about = None)]
struct Args {
    /// Force a language, e.g. "en" or "pl_PL"
    #[arg(short, long, global = true)]
    lang: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pinned list file to use instead of the shared cache file
    #[arg(long, global = true)]
    pin_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print pinned entries and the category view
    List {
        #[arg(long)]
        json: bool,
    },
    /// Run one query and print its results
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },
    Pin { id: String },
    Unpin { id: String },
    /// Set the order of pinned entries; must name every pinned id once
    Reorder { ids: Vec<String> },
    /// Launch an entry by desktop id
    Launch { id: String },
    /// Read queries from stdin, one per line (default)
    Interactive,
}

enum Input {
    Line(String),
    Eof,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    let lang = args.lang.clone().or_else(|| config.general.lang.clone());
    let locale = match &lang {
        Some(tag) => Locale::parse(tag),
        None => Locale::from_env(),
    };
    log::info!("lang: {:?}", locale);

    let roots = app_dirs(&config.sources.app_dirs);
    let source = DesktopSource::new(roots, locale);
    let catalog = Arc::new(Catalog::build(&source)?);
    if catalog.is_empty() {
        log::warn!("No applications found");
    }

    let pin_path = match args.pin_file.clone().or_else(default_pin_path) {
        Some(p) => p,
        None => anyhow::bail!("Couldn't determine cache directory location"),
    };
    let pinned = PinnedStore::load(pin_path);
    let mut app = AppState::new(config, catalog, pinned);

    match args.command.unwrap_or(Cmd::Interactive) {
        Cmd::List { json } => print_browse(&app, json)?,
        Cmd::Search { query, json } => {
            let lookup = walk_lookup(&app.config);
            if let Some(request) = app.update_query(&query) {
                let batch = run_lookup_blocking(request, lookup)?;
                app.accept_file_batch(batch);
            }
            print_results(&app, json)?;
        }
        Cmd::Pin { id } => {
            let id = id.trim();
            if app.catalog().get(id).is_none() {
                log::warn!("{} is not in the catalog, pinning anyway", id);
            }
            app.pin(id)?;
            log::info!("Pinned {} in {}", id, app.pinned().path().display());
        }
        Cmd::Unpin { id } => app.unpin(&id)?,
        Cmd::Reorder { ids } => app.reorder_pinned(&ids)?,
        Cmd::Launch { id } => {
            let cmd = app
                .command_for_entry(&id)
                .with_context(|| format!("nothing to launch for {}", id))?;
            ProcessLauncher.launch(&cmd)?;
        }
        Cmd::Interactive => run_interactive(app, source)?,
    }

    Ok(())
}

fn walk_lookup(config: &Config) -> Arc<dyn PathLookup> {
    Arc::new(WalkLookup {
        max_depth: config.search.max_depth,
        max_results: config.search.max_results,
    })
}

fn run_lookup_blocking(request: FileRequest, lookup: Arc<dyn PathLookup>) -> Result<FileBatch> {
    let (tx, rx) = calloop::channel::channel();
    let token = request.token;
    let mut event_loop: EventLoop<Option<FileBatch>> = EventLoop::try_new()?;
    event_loop
        .handle()
        .insert_source(rx, move |event, _, out: &mut Option<FileBatch>| match event {
            Event::Msg(batch) => *out = Some(batch),
            // the lookup thread died without answering
            Event::Closed => {
                if out.is_none() {
                    log::warn!("File search ended without a batch");
                    *out = Some(FileBatch { token, paths: Vec::new() });
                }
            }
        })
        .map_err(|e| anyhow::anyhow!("cannot watch file search channel: {}", e.error))?;

    spawn_lookup(request, lookup, tx);
    let mut out = None;
    while out.is_none() {
        event_loop.dispatch(None, &mut out)?;
    }
    out.context("file search ended without results")
}

struct Session {
    app: AppState,
    source: DesktopSource,
    lookup: Arc<dyn PathLookup>,
    files_tx: Sender<FileBatch>,
    should_exit: bool,
}

impl Session {
    fn submit(&mut self, query: &str) {
        if let Some(request) = self.app.update_query(query) {
            spawn_lookup(request, self.lookup.clone(), self.files_tx.clone());
        }
        let _ = print_results(&self.app, false);
    }

    fn command(&mut self, line: &str) {
        let mut parts = line.split_whitespace();
        let outcome: Result<()> = match (parts.next(), parts.next()) {
            (Some(":q") | Some(":quit"), _) => {
                self.should_exit = true;
                Ok(())
            }
            (Some(":pin"), Some(id)) => self.app.pin(id).map_err(Into::into),
            (Some(":unpin"), Some(id)) => self.app.unpin(id).map_err(Into::into),
            (Some(":reorder"), Some(first)) => {
                let order: Vec<String> = std::iter::once(first)
                    .chain(parts)
                    .map(str::to_string)
                    .collect();
                self.app.reorder_pinned(&order).map_err(Into::into)
            }
            (Some(":list"), _) => print_browse(&self.app, false),
            (Some(":rebuild"), _) => self.rebuild(),
            (Some(":launch"), Some(n)) => self.launch(n),
            (Some(":open"), Some(n)) => self.open(n),
            _ => Err(anyhow::anyhow!("unknown command {:?}", line)),
        };
        if let Err(e) = outcome {
            eprintln!("{:#}", e);
        }
    }

    /// Rescans the descriptor roots and swaps the new catalog in.
    fn rebuild(&mut self) -> Result<()> {
        let catalog = Catalog::build(&self.source)?;
        log::info!("Rebuilt catalog: {} entries", catalog.len());
        if let Some(request) = self.app.set_catalog(Arc::new(catalog)) {
            spawn_lookup(request, self.lookup.clone(), self.files_tx.clone());
        }
        if self.app.is_searching() {
            print_results(&self.app, false)
        } else {
            print_browse(&self.app, false)
        }
    }

    fn open(&self, n: &str) -> Result<()> {
        let n: usize = n.parse().context("expected a place number")?;
        let cmd = n
            .checked_sub(1)
            .and_then(|i| self.app.command_for_user_dir(i))
            .with_context(|| format!("no place {}", n))?;
        ProcessLauncher.launch(&cmd)
    }

    fn launch(&self, n: &str) -> Result<()> {
        let n: usize = n.parse().context("expected a result number")?;
        let results = self.app.results();
        let result = n
            .checked_sub(1)
            .and_then(|i| results.get(i))
            .with_context(|| format!("no result {}", n))?;
        let cmd = self
            .app
            .command_for(result)
            .context("result has nothing to launch")?;
        ProcessLauncher.launch(&cmd)
    }
}

fn run_interactive(app: AppState, source: DesktopSource) -> Result<()> {
    let mut event_loop: EventLoop<Session> = EventLoop::try_new()?;
    let (files_tx, files_rx) = calloop::channel::channel::<FileBatch>();
    let (input_tx, input_rx) = calloop::channel::channel::<Input>();

    // Blocking stdin reads stay off the loop thread
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if input_tx.send(Input::Line(l)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = input_tx.send(Input::Eof);
    });

    event_loop
        .handle()
        .insert_source(files_rx, |event, _, session: &mut Session| {
            if let Event::Msg(batch) = event {
                if session.app.accept_file_batch(batch) {
                    let _ = print_results(&session.app, false);
                }
            }
        })
        .map_err(|e| anyhow::anyhow!("cannot watch file search channel: {}", e.error))?;

    event_loop
        .handle()
        .insert_source(input_rx, |event, _, session: &mut Session| match event {
            Event::Msg(Input::Line(line)) if line.starts_with(':') => session.command(&line),
            Event::Msg(Input::Line(line)) => session.submit(&line),
            Event::Msg(Input::Eof) | Event::Closed => session.should_exit = true,
        })
        .map_err(|e| anyhow::anyhow!("cannot watch stdin channel: {}", e.error))?;

    let lookup = walk_lookup(&app.config);
    let mut session = Session {
        app,
        source,
        lookup,
        files_tx,
        should_exit: false,
    };
    print_browse(&session.app, false)?;

    loop {
        if session.should_exit {
            break;
        }
        event_loop.dispatch(Some(Duration::from_millis(250)), &mut session)?;
    }

    Ok(())
}

fn print_browse(app: &AppState, json: bool) -> Result<()> {
    if json {
        let pinned = app.pinned_entries();
        let categories: Vec<serde_json::Value> = app
            .browse()
            .into_iter()
            .map(|(cat, entries)| {
                serde_json::json!({
                    "category": cat.name(),
                    "label": cat.label(),
                    "icon": cat.icon(),
                    "entries": entries,
                })
            })
            .collect();
        let out = serde_json::json!({
            "pinned": pinned,
            "pinned_ids": app.pinned().ids(),
            "categories": categories,
            "user_dirs": app.user_dirs(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let pinned = app.pinned_entries();
    if !pinned.is_empty() {
        println!("Pinned");
        for e in pinned {
            println!("  {:<32} {}", e.name_loc, e.id);
        }
    }
    for (cat, entries) in app.browse() {
        println!("{} ({})", cat.label(), entries.len());
        for e in entries {
            println!("  {:<32} {}", e.name_loc, e.comment_loc);
        }
    }
    let home = files::home_dir();
    if !app.user_dirs().is_empty() {
        println!("Places");
        for (i, dir) in app.user_dirs().iter().enumerate() {
            let shown = files::display_label(&dir.path, home.as_deref());
            println!("{:>3}. {:<29} {}", i + 1, dir.label, shown);
        }
    }
    Ok(())
}

fn print_results(app: &AppState, json: bool) -> Result<()> {
    let results = app.results();
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if !app.is_searching() {
        return Ok(());
    }
    if results.is_empty() {
        println!("no results for {:?}", app.query);
    }
    for (i, result) in results.iter().enumerate() {
        match result {
            SearchResult::App(m) => {
                let (name, comment) = app
                    .catalog()
                    .get(&m.id)
                    .map(|e| (e.name_loc.as_str(), e.comment_loc.as_str()))
                    .unwrap_or_default();
                println!("{:>3}. {:<32} {}", i + 1, name, comment);
            }
            SearchResult::Path(p) => println!("{:>3}. {}", i + 1, p.label),
        }
    }
    Ok(())
}
