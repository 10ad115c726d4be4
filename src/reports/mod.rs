use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use replanforge::config::ReplanConfig;
use replanforge::coordinator::IterationStats;
use replanforge::core_types::{LocationId, TimeBin};
use replanforge::corridor::Corridor;
use replanforge::selector::admission_count;
use replanforge::stepsize::StepSizeSchedule;
use std::collections::HashMap;

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{:.4}", x),
        None => "-".to_string(),
    }
}

fn align_right(table: &mut Table, from: usize, to: usize) {
    for i in from..=to {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn print_config_table(config: &ReplanConfig) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Parameter").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let rows = [
        ("maxMemory", config.max_memory.to_string()),
        ("smoothingInertia", config.smoothing_inertia.to_string()),
        ("stepControl", config.step_control.to_string()),
        ("initialStepSizeFactor", config.initial_step_size_factor.to_string()),
        (
            "replanningRateIterationExponent",
            config.replanning_rate_iteration_exponent.to_string(),
        ),
        ("replannerIdentifier", config.replanner_identifier.to_string()),
        ("isUsingThreshold", config.is_using_threshold.to_string()),
        ("iterations", format!("{}..={}", config.first_iteration, config.last_iteration)),
        ("seed", config.seed.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value).fg(Color::Cyan)]);
    }
    align_right(&mut table, 1, 1);
    println!("{}", table);
}

/// Every `every`-th cycle plus the last one.
pub fn print_iteration_table(stats: &[IterationStats], population: usize, every: usize) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Iter").add_attribute(Attribute::Bold),
        Cell::new("Mem"),
        Cell::new("Step"),
        Cell::new("Target"),
        Cell::new("Realized").fg(Color::Cyan),
        Cell::new("Replans"),
        Cell::new("Threshold"),
        Cell::new("Raw gap").fg(Color::Red),
        Cell::new("W. gap").fg(Color::Green),
        Cell::new("Mu*"),
        Cell::new("Mu"),
    ]);

    let last = stats.len().saturating_sub(1);
    for (idx, s) in stats.iter().enumerate() {
        if idx % every != 0 && idx != last {
            continue;
        }
        table.add_row(vec![
            Cell::new(s.iteration).add_attribute(Attribute::Bold),
            Cell::new(s.memorized_snapshots),
            Cell::new(format!("{:.1}", s.step_size)),
            Cell::new(format!("{:.3}", s.replanning_rate)),
            Cell::new(format!("{:.3}", s.realized_rate(population))).fg(Color::Cyan),
            Cell::new(s.replanner_count),
            Cell::new(format!("{:.4}", s.gap_threshold)),
            Cell::new(format!("{:.4}", s.raw_gap)).fg(Color::Red),
            Cell::new(format!("{:.4}", s.weighted_gap)).fg(Color::Green),
            Cell::new(fmt_opt(s.optimal_bandwidth)),
            Cell::new(fmt_opt(s.smoothed_bandwidth)),
        ]);
    }
    align_right(&mut table, 1, 10);
    println!("{}", table);
}

pub fn print_schedule_table(config: &ReplanConfig, schedule: &StepSizeSchedule, population: usize) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Iter").add_attribute(Attribute::Bold),
        Cell::new("Step size"),
        Cell::new("Rate").fg(Color::Cyan),
        Cell::new("Agents"),
    ]);

    let span = config.last_iteration - config.first_iteration;
    let stride = (span / 10).max(1);
    let mut it = config.first_iteration;
    loop {
        let rate = schedule.replanning_rate(it, population);
        table.add_row(vec![
            Cell::new(it),
            Cell::new(format!("{:.2}", schedule.step_size(it))),
            Cell::new(format!("{:.4}", rate)),
            Cell::new(admission_count(rate, population)),
        ]);
        if it >= config.last_iteration {
            break;
        }
        it = (it + stride).min(config.last_iteration);
    }
    align_right(&mut table, 1, 3);
    println!("\n{}", table);
}

pub fn print_route_shares(corridor: &Corridor, flows: &HashMap<(LocationId, TimeBin), f64>) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    let mut header = vec![Cell::new("Route").add_attribute(Attribute::Bold)];
    header.extend((0..corridor.time_bins).map(|b| Cell::new(format!("b{}", b))));
    header.push(Cell::new("Total").fg(Color::Cyan));
    table.set_header(header);

    for route in 0..corridor.route_count() as LocationId {
        let mut row = vec![Cell::new(route)];
        let mut total = 0.0;
        for bin in 0..corridor.time_bins {
            let flow = flows.get(&(route, bin)).copied().unwrap_or(0.0);
            total += flow;
            row.push(Cell::new(format!("{:.0}", flow)));
        }
        row.push(Cell::new(format!("{:.0}", total)).fg(Color::Cyan));
        table.add_row(row);
    }
    align_right(&mut table, 1, corridor.time_bins as usize + 1);
    println!("\n{}", table);
}
