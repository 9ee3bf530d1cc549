//! Line-oriented terminal front end over the [`Controller`].

use crate::config::Config;
use crate::controller::{Controller, Intent, Tab, ViewMode};
use crate::favorites::FavoritesStore;
use crate::models::MovieSummary;
use crate::storage::FileSlot;
use crate::tmdb::{backdrop_url, poster_url, TmdbApi, TmdbClient};
use crate::utils::{
    format_rating, format_runtime, format_usd, release_date_long, release_year,
};
use anyhow::Result;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

const HELP: &str = "commands: search <text> | type <text> | clear | open <n> | fav [n] | back | tab search|favorites | list | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Type(String),
    Clear,
    Open(usize),
    /// Toggle item `n` of the visible list, or the open movie when `None`.
    Fav(Option<usize>),
    Back,
    Tab(Tab),
    List,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let index = |raw: &str| -> Result<usize, String> {
        raw.parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("expected a result number, got '{raw}'"))
    };
    match word.to_lowercase().as_str() {
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "type" | "t" => Ok(Command::Type(rest.to_string())),
        "clear" => Ok(Command::Clear),
        "open" | "o" => index(rest).map(Command::Open),
        "fav" | "f" if rest.is_empty() => Ok(Command::Fav(None)),
        "fav" | "f" => index(rest).map(|n| Command::Fav(Some(n))),
        "back" | "b" => Ok(Command::Back),
        "tab" => match rest.to_lowercase().as_str() {
            "search" => Ok(Command::Tab(Tab::Search)),
            "favorites" | "favs" => Ok(Command::Tab(Tab::Favorites)),
            other => Err(format!("unknown tab '{other}'")),
        },
        "list" | "l" | "" => Ok(Command::List),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

/// List the user is currently looking at, numbered from 1 on screen.
fn visible_list(controller: &Controller) -> &[MovieSummary] {
    match controller.view() {
        ViewMode::Search => controller.movies().data.as_slice(),
        ViewMode::Favorites => controller.favorites(),
        ViewMode::Details => &[],
    }
}

/// Maps a command to the controller intent it stands for. `None` for
/// commands that only affect the terminal or point at nothing.
pub fn command_intent(controller: &Controller, command: Command) -> Option<Intent> {
    let pick = |n: usize| {
        n.checked_sub(1)
            .and_then(|i| visible_list(controller).get(i))
            .cloned()
    };
    match command {
        Command::Search(text) => Some(Intent::SubmitSearch(text)),
        Command::Type(text) => Some(Intent::InputChanged(text)),
        Command::Clear => Some(Intent::ClearSearch),
        Command::Open(n) => pick(n).map(Intent::Select),
        Command::Fav(Some(n)) => pick(n).map(Intent::ToggleFavorite),
        Command::Fav(None) => controller
            .details()
            .data
            .as_ref()
            .map(|d| Intent::ToggleFavorite(d.to_summary())),
        Command::Back => Some(Intent::Back),
        Command::Tab(tab) => Some(Intent::ShowTab(tab)),
        Command::List | Command::Help | Command::Quit => None,
    }
}

fn heart(controller: &Controller, id: i64) -> &'static str {
    if controller.is_favorite(id) {
        "♥"
    } else {
        " "
    }
}

fn render_list(out: &mut String, controller: &Controller, movies: &[MovieSummary]) {
    for (i, movie) in movies.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} {} ({}) ★ {} · {} votes",
            i + 1,
            heart(controller, movie.id),
            movie.title,
            release_year(&movie.release_date),
            format_rating(movie.vote_average),
            movie.vote_count
        );
    }
}

pub fn render(controller: &Controller) -> String {
    let mut out = String::new();
    let tab = |active: bool, label: &str| {
        if active {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        }
    };
    let _ = writeln!(
        out,
        "── {} {} ──",
        tab(controller.view() == ViewMode::Search, "Search"),
        tab(
            controller.view() == ViewMode::Favorites,
            &format!("Favorites ({})", controller.favorites_count())
        )
    );

    match controller.view() {
        ViewMode::Search => {
            let movies = controller.movies();
            if movies.loading {
                let _ = writeln!(out, "Searching…");
            }
            if let Some(err) = &movies.error {
                let _ = writeln!(out, "{err}");
            } else if movies.data.is_empty() && !controller.query().is_empty() && !movies.loading
            {
                let _ = writeln!(out, "No results for \"{}\"", controller.query());
            } else if !movies.data.is_empty() {
                let _ = writeln!(
                    out,
                    "Results for \"{}\" ({} movies)",
                    controller.query(),
                    movies.data.len()
                );
                render_list(&mut out, controller, &movies.data);
            }
        }
        ViewMode::Favorites => {
            if controller.favorites_count() == 0 {
                let _ = writeln!(out, "No favorites yet.");
            } else {
                render_list(&mut out, controller, controller.favorites());
            }
        }
        ViewMode::Details => {
            let details = controller.details();
            if details.loading {
                let _ = writeln!(out, "Loading details…");
            }
            if let Some(err) = &details.error {
                let _ = writeln!(out, "{err}");
            }
            if let Some(movie) = &details.data {
                let _ = writeln!(
                    out,
                    "{} {} ({})",
                    heart(controller, movie.id),
                    movie.title,
                    release_year(&movie.release_date)
                );
                if !movie.tagline.is_empty() {
                    let _ = writeln!(out, "  \"{}\"", movie.tagline);
                }
                let _ = writeln!(
                    out,
                    "  ★ {} ({} votes) · {} · released {} · {}",
                    format_rating(movie.vote_average),
                    movie.vote_count,
                    format_runtime(movie.runtime),
                    release_date_long(&movie.release_date),
                    movie.status
                );
                if !movie.genres.is_empty() {
                    let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
                    let _ = writeln!(out, "  Genres: {}", genres.join(", "));
                }
                if movie.budget > 0 || movie.revenue > 0 {
                    let _ = writeln!(
                        out,
                        "  Budget: {} · Revenue: {}",
                        format_usd(movie.budget),
                        format_usd(movie.revenue)
                    );
                }
                if !movie.production_companies.is_empty() {
                    let names: Vec<&str> = movie
                        .production_companies
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect();
                    let _ = writeln!(out, "  Studios: {}", names.join(", "));
                }
                if let Some(url) = poster_url(movie.poster_path.as_deref()) {
                    let _ = writeln!(out, "  Poster: {url}");
                }
                if let Some(url) = backdrop_url(movie.backdrop_path.as_deref()) {
                    let _ = writeln!(out, "  Backdrop: {url}");
                }
                if !movie.overview.is_empty() {
                    let _ = writeln!(out, "\n{}", movie.overview);
                }
            }
        }
    }
    out
}

async fn print(stdout: &mut tokio::io::Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn run(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_config(&config)?);
    info!("Favorites stored under {:?}", config.data_dir);
    let favorites = FavoritesStore::load(Box::new(FileSlot::new(config.data_dir.clone())));
    let mut controller = Controller::new(tmdb, favorites, config.debounce);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    print(&mut stdout, &format!("{HELP}\n{}", render(&controller))).await?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(c) => c,
                    Err(msg) => {
                        print(&mut stdout, &format!("{msg}\n")).await?;
                        continue;
                    }
                };
                match command {
                    Command::Quit => break,
                    Command::Help => {
                        print(&mut stdout, &format!("{HELP}\n")).await?;
                        continue;
                    }
                    command => {
                        match command_intent(&controller, command) {
                            Some(intent) => controller.dispatch(intent),
                            None => warn!("Nothing to act on"),
                        }
                    }
                }
                print(&mut stdout, &render(&controller)).await?;
            }
            Some(completion) = controller.next_completion() => {
                controller.apply(completion);
                print(&mut stdout, &format!("\n{}", render(&controller))).await?;
            }
            _ = &mut shutdown => break,
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received (Ctrl+C)");
}
