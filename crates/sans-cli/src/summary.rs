use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sans_model::ValidationError;
use sans_state::{ALL_STATES, AllStates, SECTIONS, State, registrations};

use crate::commands::Outcome;

pub fn print_outcome(outcome: &Outcome) {
    println!(
        "Run: {} ({})",
        outcome.states.data.sample_scatter.as_deref().unwrap_or("-"),
        outcome.states.data.instrument
    );
    println!("{}", state_table(&outcome.states, outcome.validation.as_ref().err()));
    if let Err(error) = &outcome.validation {
        println!();
        println!("Issues:");
        println!("{}", issue_table(error));
    }
}

/// One row per property-bag section with its state type and issue count.
pub fn state_table(states: &AllStates, error: Option<&ValidationError>) -> Table {
    let names: [&str; 8] = [
        states.data.state_name(),
        states.move_state.state_name(),
        states.reduction.state_name(),
        states.convert_to_q.state_name(),
        states.normalize_to_monitor.state_name(),
        states.wavelength.state_name(),
        states.mask.state_name(),
        states.slice_event.state_name(),
    ];
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Section"),
        header_cell("State"),
        header_cell("Issues"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let count_for = |state: &str| {
        error
            .and_then(|error| error.report(state))
            .map_or(0, |report| report.len())
    };
    for (section, state) in SECTIONS.iter().zip(names) {
        table.add_row(vec![
            Cell::new(section)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(state),
            count_cell(count_for(state)),
        ]);
    }
    table.add_row(vec![
        Cell::new("cross-state")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(ALL_STATES),
        count_cell(count_for(ALL_STATES)),
    ]);
    table
}

pub fn issue_table(error: &ValidationError) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("State"),
        header_cell("Rule"),
        header_cell("Fields"),
        header_cell("Message"),
    ]);
    apply_summary_table_style(&mut table);
    for (state, issue) in error.issues() {
        table.add_row(vec![
            Cell::new(state).fg(Color::Blue),
            Cell::new(&issue.rule).fg(Color::Red),
            Cell::new(issue.fields().join(", ")),
            Cell::new(issue.message()),
        ]);
    }
    table
}

/// Supported facility/instrument pairs and the variants they select.
pub fn instruments_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Facility",
        "Instrument",
        "Move",
        "Normalize to monitor",
        "Incident monitor",
        "HAB",
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    for entry in registrations() {
        table.add_row(vec![
            Cell::new(entry.facility),
            Cell::new(entry.instrument),
            Cell::new(entry.move_state_type),
            Cell::new(entry.normalize_state_type),
            Cell::new(entry.default_incident_monitor),
            Cell::new(if entry.instrument.has_hab() { "yes" } else { "no" }),
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
