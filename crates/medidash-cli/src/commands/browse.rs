//! Interactive table over stdin.
//!
//! Plain lines are search keystrokes and go through the debouncer; lines
//! starting with `:` are commands applied immediately. The table is redrawn
//! whenever the settled state changes, and whenever a new result for the
//! browsed resource is committed to the cache. `:refresh` runs in the
//! background so the prompt stays usable while it loads.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use medidash_core::model::{APPOINTMENT_COLUMNS, Column, PATIENT_COLUMNS};
use medidash_core::{
    Appointment, Categorized, Dashboard, FetchError, FetchStatus, PageSize, Patient, QueryState,
    Searchable, StatusFilter, Subscription, TableState, ViewComposer,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::cli::BrowseTarget;
use crate::output::{print_fetch_error, print_page, print_section_error};

const HELP: &str = "\
type text to search, empty line clears
:status <all|scheduled|confirmed|completed|cancelled>
:page <n>   :next   :prev   :size <10|25|100>
:refresh    :help   :quit";

trait Browsable: Searchable + Categorized + Send + Sync + Sized + 'static {
    const NOUN: &'static str;

    fn columns() -> &'static [Column<Self>];

    async fn load(dashboard: &Dashboard) -> QueryState<Vec<Self>>;

    fn subscribe(dashboard: &Dashboard) -> Subscription<Vec<Self>>;

    /// Starts a forced refetch; the result arrives through [`Self::subscribe`].
    fn spawn_refresh(dashboard: &Dashboard);
}

impl Browsable for Patient {
    const NOUN: &'static str = "patients";

    fn columns() -> &'static [Column<Self>] {
        PATIENT_COLUMNS
    }

    async fn load(dashboard: &Dashboard) -> QueryState<Vec<Self>> {
        dashboard.patients(None).await
    }

    fn subscribe(dashboard: &Dashboard) -> Subscription<Vec<Self>> {
        dashboard.subscribe_patients(None)
    }

    fn spawn_refresh(dashboard: &Dashboard) {
        let dashboard = dashboard.clone();
        tokio::spawn(async move {
            dashboard.refresh_patients(None).await;
        });
    }
}

impl Browsable for Appointment {
    const NOUN: &'static str = "appointments";

    fn columns() -> &'static [Column<Self>] {
        APPOINTMENT_COLUMNS
    }

    async fn load(dashboard: &Dashboard) -> QueryState<Vec<Self>> {
        dashboard.appointments(None).await
    }

    fn subscribe(dashboard: &Dashboard) -> Subscription<Vec<Self>> {
        dashboard.subscribe_appointments(None)
    }

    fn spawn_refresh(dashboard: &Dashboard) {
        let dashboard = dashboard.clone();
        tokio::spawn(async move {
            dashboard.refresh_appointments(None).await;
        });
    }
}

#[derive(Debug, PartialEq)]
enum Input {
    Search(String),
    Status(StatusFilter),
    Page(usize),
    Next,
    Prev,
    Size(PageSize),
    Refresh,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input> {
    let Some(directive) = line.trim().strip_prefix(':') else {
        return Ok(Input::Search(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let mut parts = directive.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    let input = match (command, arg) {
        ("status", Some(name)) => Input::Status(name.parse()?),
        ("page", Some(n)) => {
            let n: usize = n.parse().with_context(|| format!("Invalid page number: {n}"))?;
            Input::Page(n.saturating_sub(1))
        }
        ("next", None) => Input::Next,
        ("prev", None) => Input::Prev,
        ("size", Some(n)) => {
            let n: usize = n.parse().with_context(|| format!("Invalid page size: {n}"))?;
            Input::Size(PageSize::new(n)?)
        }
        ("refresh", None) => Input::Refresh,
        ("help", None) => Input::Help,
        ("quit" | "q", None) => Input::Quit,
        _ => anyhow::bail!("Unknown command :{directive}. Type :help"),
    };
    Ok(input)
}

pub async fn browse(
    dashboard: &Dashboard,
    target: BrowseTarget,
    debounce: Duration,
    page_size: PageSize,
) -> Result<()> {
    match target {
        BrowseTarget::Patients => run::<Patient>(dashboard, debounce, page_size).await,
        BrowseTarget::Appointments => run::<Appointment>(dashboard, debounce, page_size).await,
    }
}

async fn load<R: Browsable>(dashboard: &Dashboard) -> Result<Arc<Vec<R>>> {
    let state = R::load(dashboard).await;
    match (state.data, state.error) {
        (Some(data), _) => Ok(data),
        (None, Some(err)) => {
            anyhow::bail!("Failed to load {} ({}): {err}", R::NOUN, err.category())
        }
        (None, None) => anyhow::bail!("Failed to load {}: no data", R::NOUN),
    }
}

/// What a committed cache update means for the screen.
enum Update<R> {
    Replace(Arc<Vec<R>>),
    Failed(FetchError),
    Ignore,
}

fn classify<R>(state: QueryState<Vec<R>>, shown: &Arc<Vec<R>>) -> Update<R> {
    match state.status {
        FetchStatus::Success => match state.data {
            Some(data) if !Arc::ptr_eq(&data, shown) => Update::Replace(data),
            _ => Update::Ignore,
        },
        // Failed refresh: keep showing what we had.
        FetchStatus::Error => state.error.map_or(Update::Ignore, Update::Failed),
        FetchStatus::Idle | FetchStatus::Loading => Update::Ignore,
    }
}

struct Screen<R> {
    state: TableState,
    composer: ViewComposer<R>,
    page_count: usize,
}

impl<R: Browsable> Screen<R> {
    fn render(&mut self, data: &Arc<Vec<R>>) {
        let page = self.composer.compose(data, &self.state);
        self.page_count = page.page_count;

        let search = self.state.search_term();
        println!(
            "\n{} {}  {} {}",
            "search:".dimmed(),
            if search.is_empty() { "-" } else { search },
            "status:".dimmed(),
            self.state.category(),
        );
        print_page(R::columns(), &page, &format!("No {} found", R::NOUN));
    }
}

fn prompt() {
    print!("{} ", ">".cyan());
    let _ = std::io::stdout().flush();
}

async fn run<R: Browsable>(
    dashboard: &Dashboard,
    debounce: Duration,
    page_size: PageSize,
) -> Result<()> {
    let mut data = load::<R>(dashboard).await?;
    let mut updates = R::subscribe(dashboard);
    let mut screen = Screen {
        state: TableState::with_debounce(debounce),
        composer: ViewComposer::new(),
        page_count: 0,
    };
    screen.state.set_page_size(page_size);

    println!("{}", HELP.dimmed());
    screen.render(&data);
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = screen.state.search_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let input = match parse_input(&line) {
                    Ok(input) => input,
                    Err(e) => {
                        print_section_error("Input", &format!("{e:#}"));
                        prompt();
                        continue;
                    }
                };
                let redraw = match input {
                    Input::Search(text) => {
                        screen.state.type_search(text, Instant::now());
                        false
                    }
                    Input::Status(filter) => screen.state.set_category(filter),
                    Input::Page(index) => {
                        screen.state.set_page(index);
                        true
                    }
                    Input::Next => {
                        screen.state.next_page(screen.page_count);
                        true
                    }
                    Input::Prev => {
                        screen.state.prev_page();
                        true
                    }
                    Input::Size(size) => {
                        screen.state.set_page_size(size);
                        true
                    }
                    Input::Refresh => {
                        R::spawn_refresh(dashboard);
                        println!("{}", format!("Refreshing {}...", R::NOUN).dimmed());
                        false
                    }
                    Input::Help => {
                        println!("{}", HELP.dimmed());
                        false
                    }
                    Input::Quit => break,
                };
                if redraw {
                    screen.render(&data);
                }
                prompt();
            }
            _ = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                if screen.state.settle(Instant::now()) {
                    screen.render(&data);
                    prompt();
                }
            }
            alive = updates.changed() => {
                if !alive {
                    // Entry was removed from the cache; watch the fresh one.
                    updates = R::subscribe(dashboard);
                    continue;
                }
                match classify(updates.current(), &data) {
                    Update::Replace(fresh) => {
                        data = fresh;
                        screen.render(&data);
                        prompt();
                    }
                    Update::Failed(err) => {
                        print_fetch_error("Refresh failed", &err);
                        prompt();
                    }
                    Update::Ignore => {}
                }
            }
        }
    }

    tracing::debug!(
        filter_passes = screen.composer.computations(),
        "Browse session finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_search() {
        assert_eq!(parse_input("smith").unwrap(), Input::Search("smith".into()));
        assert_eq!(parse_input("").unwrap(), Input::Search(String::new()));
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            parse_input(":status Completed").unwrap(),
            Input::Status(StatusFilter::Completed)
        );
        assert_eq!(parse_input(":page 3").unwrap(), Input::Page(2));
        assert_eq!(parse_input(" :next ").unwrap(), Input::Next);
        assert_eq!(parse_input(":prev").unwrap(), Input::Prev);
        assert_eq!(
            parse_input(":size 25").unwrap(),
            Input::Size(PageSize::new(25).unwrap())
        );
        assert_eq!(parse_input(":refresh").unwrap(), Input::Refresh);
        assert_eq!(parse_input(":q").unwrap(), Input::Quit);
    }

    fn rows(values: &[&str]) -> Arc<Vec<Appointment>> {
        Arc::new(
            values
                .iter()
                .map(|name| Appointment {
                    patient_name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn state_of(
        status: FetchStatus,
        data: Option<Arc<Vec<Appointment>>>,
        error: Option<FetchError>,
    ) -> QueryState<Vec<Appointment>> {
        QueryState {
            data,
            status,
            error,
            updated_at: None,
            is_stale: false,
        }
    }

    #[test]
    fn test_committed_rows_replace_the_table() {
        let shown = rows(&["Ann"]);
        let fresh = rows(&["Ann", "Bo"]);

        let update = classify(state_of(FetchStatus::Success, Some(fresh.clone()), None), &shown);
        assert!(matches!(update, Update::Replace(data) if Arc::ptr_eq(&data, &fresh)));

        // Same Arc as on screen: nothing to redraw.
        let update = classify(state_of(FetchStatus::Success, Some(shown.clone()), None), &shown);
        assert!(matches!(update, Update::Ignore));

        let update = classify(state_of(FetchStatus::Loading, Some(shown.clone()), None), &shown);
        assert!(matches!(update, Update::Ignore));
    }

    #[test]
    fn test_failed_refresh_keeps_rows() {
        let shown = rows(&["Ann"]);
        let update = classify(
            state_of(
                FetchStatus::Error,
                Some(shown.clone()),
                Some(FetchError::Network("refused".into())),
            ),
            &shown,
        );
        assert!(matches!(update, Update::Failed(FetchError::Network(_))));
    }

    #[test]
    fn test_bad_directives() {
        assert!(parse_input(":status pending").is_err());
        assert!(parse_input(":size 20").is_err());
        assert!(parse_input(":page x").is_err());
        assert!(parse_input(":jump").is_err());
        assert!(parse_input(":next 2").is_err());
    }
}
