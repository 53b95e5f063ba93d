use anyhow::Result;
use colored::Colorize;
use medidash_core::model::APPOINTMENT_COLUMNS;
use medidash_core::{Dashboard, PageSize, StatusFilter, compose_view};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::output::{
    patient_card, print_charts, print_fetch_error, print_heading, print_json, print_metric_cards,
    print_page,
};

pub async fn overview(dashboard: &Dashboard, format: OutputFormat) -> Result<()> {
    let overview = dashboard.overview().await;

    if matches!(format, OutputFormat::Json) {
        let errors: serde_json::Map<_, _> = overview
            .errors()
            .into_iter()
            .map(|(resource, error)| (resource.to_string(), json!(error.to_string())))
            .collect();
        return print_json(&json!({
            "metrics": overview.metrics.data.as_deref(),
            "charts": overview.charts.data.as_deref(),
            "recentAppointments": overview.appointments.data.as_deref(),
            "recentPatients": overview.patients.data.as_deref(),
            "errors": errors,
        }));
    }

    println!("{}", "Dashboard Overview".cyan().bold());

    print_heading("Metrics");
    match (&overview.metrics.data, &overview.metrics.error) {
        (Some(metrics), _) => print_metric_cards(&metrics.cards()),
        (None, Some(err)) => print_fetch_error("Metrics", err),
        (None, None) => println!("{}", "Loading...".dimmed()),
    }

    print_heading("Charts");
    match (&overview.charts.data, &overview.charts.error) {
        (Some(charts), _) => print_charts(charts),
        (None, Some(err)) => print_fetch_error("Charts", err),
        (None, None) => println!("{}", "Loading...".dimmed()),
    }

    print_heading("Recent Appointments");
    match (&overview.appointments.data, &overview.appointments.error) {
        (Some(rows), _) => {
            let page = compose_view(rows.as_slice(), "", StatusFilter::All, 0, PageSize::default());
            print_page(APPOINTMENT_COLUMNS, &page, "No appointments found");
        }
        (None, Some(err)) => print_fetch_error("Appointments", err),
        (None, None) => println!("{}", "Loading...".dimmed()),
    }

    print_heading("Recent Patients");
    match (&overview.patients.data, &overview.patients.error) {
        (Some(patients), _) if patients.is_empty() => {
            println!("{}", "No patients found".dimmed());
        }
        (Some(patients), _) => {
            for patient in patients.iter() {
                println!("  {}", patient_card(patient));
            }
        }
        (None, Some(err)) => print_fetch_error("Patients", err),
        (None, None) => println!("{}", "Loading...".dimmed()),
    }

    Ok(())
}

pub async fn metrics(dashboard: &Dashboard, format: OutputFormat) -> Result<()> {
    let state = dashboard.metrics().await;
    let Some(metrics) = state.data.clone() else {
        match &state.error {
            Some(err) => anyhow::bail!("Failed to load metrics ({}): {err}", err.category()),
            None => anyhow::bail!("Failed to load metrics"),
        }
    };
    match format {
        OutputFormat::Json => print_json(metrics.as_ref())?,
        OutputFormat::Table => print_metric_cards(&metrics.cards()),
    }
    Ok(())
}

pub async fn charts(dashboard: &Dashboard, format: OutputFormat) -> Result<()> {
    let state = dashboard.charts().await;
    let Some(charts) = state.data.clone() else {
        match &state.error {
            Some(err) => anyhow::bail!("Failed to load charts ({}): {err}", err.category()),
            None => anyhow::bail!("Failed to load charts"),
        }
    };
    match format {
        OutputFormat::Json => print_json(charts.as_ref())?,
        OutputFormat::Table => print_charts(&charts),
    }
    Ok(())
}
