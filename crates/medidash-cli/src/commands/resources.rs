use anyhow::{Context, Result};
use medidash_core::model::{APPOINTMENT_COLUMNS, PATIENT_COLUMNS};
use medidash_core::{Dashboard, PageSize, QueryState, StatusFilter, ViewPage, compose_view};
use serde::Serialize;
use serde_json::json;

use crate::cli::{AppointmentsArgs, OutputFormat, PageArgs, PatientsArgs};
use crate::output::{print_json, print_page};

pub async fn patients(
    dashboard: &Dashboard,
    args: &PatientsArgs,
    default_page_size: PageSize,
    format: OutputFormat,
) -> Result<()> {
    let category: StatusFilter = args.status.parse()?;
    let page_size = page_size(&args.page, default_page_size)?;

    let state = dashboard.patients(args.page.limit).await;
    let rows = require_data(&state, "patients")?;
    let page = compose_view(rows, "", category, args.page.page_index(), page_size);

    match format {
        OutputFormat::Json => print_page_json(&page)?,
        OutputFormat::Table => print_page(PATIENT_COLUMNS, &page, "No patients found"),
    }
    Ok(())
}

pub async fn appointments(
    dashboard: &Dashboard,
    args: &AppointmentsArgs,
    default_page_size: PageSize,
    format: OutputFormat,
) -> Result<()> {
    let page_size = page_size(&args.page, default_page_size)?;
    let term = args.search.as_deref().unwrap_or_default();

    let state = dashboard.appointments(args.page.limit).await;
    let rows = require_data(&state, "appointments")?;
    let page = compose_view(rows, term, StatusFilter::All, args.page.page_index(), page_size);

    match format {
        OutputFormat::Json => print_page_json(&page)?,
        OutputFormat::Table => print_page(APPOINTMENT_COLUMNS, &page, "No appointments found"),
    }
    Ok(())
}

fn page_size(args: &PageArgs, default: PageSize) -> Result<PageSize> {
    match args.page_size {
        Some(size) => PageSize::new(size).context("Invalid --page-size"),
        None => Ok(default),
    }
}

pub(crate) fn require_data<'a, T>(state: &'a QueryState<Vec<T>>, what: &str) -> Result<&'a [T]> {
    match &state.data {
        Some(rows) => Ok(rows.as_slice()),
        None => anyhow::bail!(
            "Failed to load {what}: {}",
            state.error_message().unwrap_or_else(|| "no data".to_string())
        ),
    }
}

fn print_page_json<R: Serialize>(page: &ViewPage<'_, R>) -> Result<()> {
    let rows: Vec<&R> = page.rows.iter().map(|(_, row)| *row).collect();
    print_json(&json!({
        "rows": rows,
        "totalMatches": page.total_matches,
        "pageIndex": page.page_index,
        "pageSize": page.page_size.get(),
        "pageCount": page.page_count,
    }))
}
