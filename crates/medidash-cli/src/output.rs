use anyhow::Result;
use colored::{ColoredString, Colorize};
use medidash_core::model::{Align, Column};
use medidash_core::{
    ChartData, ErrorCategory, FetchError, MetricCard, Patient, StatusTone, ViewPage,
};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

const BAR_WIDTH: usize = 30;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Inline error for one section; the rest of the output keeps rendering.
pub fn print_section_error(section: &str, msg: &str) {
    println!("{} {}: {}", "✗".red(), section.bold(), msg.red());
}

/// One-line rendering of a failed fetch, tagged with its category so a
/// connectivity problem reads differently from a bad response.
pub fn fetch_error_line(section: &str, error: &FetchError) -> String {
    let category = error.category();
    let tag = match category {
        ErrorCategory::Network => format!("[{category}]").yellow(),
        ErrorCategory::Response => format!("[{category}]").magenta(),
    };
    let hint = match category {
        ErrorCategory::Network => "check the server address or your connection",
        ErrorCategory::Response => "the data source sent something unexpected",
    };
    format!(
        "{} {} {}: {} {}",
        "✗".red(),
        section.bold(),
        tag,
        error.to_string().red(),
        format!("({hint})").dimmed()
    )
}

pub fn print_fetch_error(section: &str, error: &FetchError) {
    println!("{}", fetch_error_line(section, error));
}

pub fn print_heading(title: &str) {
    println!("\n{}", title.cyan().bold());
}

pub fn paint(text: &str, tone: StatusTone) -> ColoredString {
    match tone {
        StatusTone::Primary => text.blue(),
        StatusTone::Success => text.green(),
        StatusTone::Destructive => text.red(),
        StatusTone::Muted => text.dimmed(),
    }
}

/// Renders the rows of `page` with the given column table.
pub fn render_table<R>(columns: &[Column<R>], page: &ViewPage<'_, R>) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.label.to_string()));
    for (_, row) in &page.rows {
        builder.push_record(columns.iter().map(|column| {
            let text = column.render(row);
            match column.tone_of(row) {
                Some(tone) => paint(&text, tone).to_string(),
                None => text,
            }
        }));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    for (index, column) in columns.iter().enumerate() {
        if column.align == Align::Center {
            table.with(Modify::new(Columns::single(index)).with(Alignment::center()));
        }
    }
    table.to_string()
}

pub fn print_page<R>(columns: &[Column<R>], page: &ViewPage<'_, R>, empty_message: &str) {
    if page.total_matches == 0 {
        println!("{}", empty_message.dimmed());
        return;
    }
    println!("{}", render_table(columns, page));
    println!("{}", page_footer(page));
}

pub fn page_footer<R>(page: &ViewPage<'_, R>) -> String {
    format!(
        "{}  {}  {}",
        page.range_label(),
        format!("page {}/{}", page.page_index + 1, page.page_count.max(1)).dimmed(),
        format!("rows per page: {}", page.page_size).dimmed(),
    )
}

pub fn print_metric_cards(cards: &[MetricCard]) {
    let mut builder = Builder::default();
    builder.push_record(cards.iter().map(|card| card.title.to_string()));
    builder.push_record(cards.iter().map(|card| card.value.to_string()));
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

/// `████░░░░` scaled so `max` fills `width`.
pub fn bar(value: u64, max: u64, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((value as f64 / max as f64) * width as f64).round() as usize
    };
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn print_charts(charts: &ChartData) {
    println!("{}", "Weekly Appointments".bold());
    if charts.weekly_trend.is_empty() {
        println!("{}", "No data".dimmed());
    }
    let max = charts
        .weekly_trend
        .iter()
        .map(|d| d.appointments)
        .max()
        .unwrap_or(0);
    for day in &charts.weekly_trend {
        println!(
            "  {:<10} {} {}",
            day.day,
            bar(day.appointments, max, BAR_WIDTH).blue(),
            day.appointments
        );
    }
    if let Some(busiest) = charts.busiest_day() {
        println!(
            "  {} {} ({}), total {}",
            "Busiest:".dimmed(),
            busiest.day,
            busiest.appointments,
            charts.total_weekly_appointments()
        );
    }

    println!("{}", "Patients by Department".bold());
    if charts.department_distribution.is_empty() {
        println!("{}", "No data".dimmed());
    }
    let max = charts
        .department_distribution
        .iter()
        .map(|d| d.patients)
        .max()
        .unwrap_or(0);
    for (dept, (_, share)) in charts
        .department_distribution
        .iter()
        .zip(charts.department_shares())
    {
        println!(
            "  {:<16} {} {} ({share:.1}%)",
            dept.department,
            bar(dept.patients, max, BAR_WIDTH).green(),
            dept.patients
        );
    }
}

pub fn patient_card(patient: &Patient) -> String {
    let status = patient.appointment_status.as_str();
    format!(
        "({}) {}  {}  Room {}  {}",
        patient.initial().to_string().bold(),
        patient.display_name(),
        patient.age_and_gender().dimmed(),
        patient.room_number,
        paint(status, patient.appointment_status.tone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use medidash_core::model::APPOINTMENT_COLUMNS;
    use medidash_core::{Appointment, PageSize, Status, StatusFilter, compose_view};

    #[test]
    fn test_bar_scales_to_width() {
        assert_eq!(bar(0, 0, 4), "░░░░");
        assert_eq!(bar(5, 10, 4), "██░░");
        assert_eq!(bar(10, 10, 4), "████");
        assert_eq!(bar(20, 10, 4), "████");
    }

    #[test]
    fn test_render_table_has_headers_and_cells() {
        let rows = vec![Appointment {
            patient_name: "Jane Roe".into(),
            appointment_time: "09:30 AM".into(),
            doctor_name: "Dr. Wu".into(),
            department: "Radiology".into(),
            status: Status::Confirmed,
        }];
        let page = compose_view(&rows, "", StatusFilter::All, 0, PageSize::default());
        let table = render_table(APPOINTMENT_COLUMNS, &page);

        for label in ["Patient Name", "Doctor Name", "Department", "Time", "Status"] {
            assert!(table.contains(label), "missing header {label}");
        }
        assert!(table.contains("Jane Roe"));
        assert!(table.contains("Radiology"));
        assert!(table.contains("Confirmed"));
        assert!(page_footer(&page).contains("1–1 of 1"));
    }

    #[test]
    fn test_fetch_error_line_names_category() {
        colored::control::set_override(false);

        let network = fetch_error_line("Metrics", &FetchError::Network("refused".into()));
        assert!(network.starts_with("✗ Metrics [network]: Network error: refused"));
        assert!(network.contains("check the server address"));

        let response = fetch_error_line(
            "Patients",
            &FetchError::Status {
                status: 500,
                body: "boom".into(),
            },
        );
        assert!(response.starts_with("✗ Patients [response]: "));
        assert!(response.contains("sent something unexpected"));
    }
}
