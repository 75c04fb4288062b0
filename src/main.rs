use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;

use rowflow::dram::{InterleavedMapping, MappingConfig};
use rowflow::sched::{RowOpenScheduler, SchedulerConfig};
use rowflow::sim::config::{Config, SimConfig};
use rowflow::traffic::{TrafficConfig, TrafficDriver};

#[derive(Parser)]
#[command(version, about)]
struct RowflowArgs {
    /// Toml file with [sim], [scheduler], [mapping] and [traffic] sections.
    config: Option<PathBuf>,

    #[arg(long)]
    cycles: Option<u64>,
    #[arg(long)]
    capacity: Option<usize>,
    #[arg(long)]
    budget: Option<usize>,
}

pub fn main() {
    env_logger::init();
    let argv = RowflowArgs::parse();

    let table = match &argv.config {
        Some(path) => fs::read_to_string(path)
            .expect("cannot read config file")
            .parse::<toml::Table>()
            .expect("cannot parse config file"),
        None => toml::Table::new(),
    };

    let sim_config = SimConfig::from_section(table.get("sim"));
    let mut scheduler_config = SchedulerConfig::from_section(table.get("scheduler"));
    let mapping_config = MappingConfig::from_section(table.get("mapping"));
    let mut traffic_config = TrafficConfig::from_section(table.get("traffic"));

    if let Some(capacity) = argv.capacity {
        scheduler_config.capacity = capacity;
    }
    if let Some(budget) = argv.budget {
        traffic_config.budget_per_tick = budget;
    }
    let cycles = argv.cycles.unwrap_or(sim_config.cycles);

    let mapping = Arc::new(InterleavedMapping::new(mapping_config));
    let mut scheduler = RowOpenScheduler::new(Arc::new(scheduler_config), mapping);
    let mut driver = TrafficDriver::new(&traffic_config);

    driver.run(&mut scheduler, cycles);

    let stats = scheduler.stats();
    info!(
        "{} added, {} issued ({:.1}% of attempts), {} pruned, {} still queued, mean delay {:.2} cycles",
        stats.requests_added(),
        stats.issued_success(),
        100.0 * stats.issue_success_rate(),
        stats.pruned_expired(),
        scheduler.size(),
        stats.average_delay(),
    );

    println!(
        "{}",
        serde_json::to_string_pretty(stats).expect("cannot serialize stats")
    );
    if sim_config.print_histograms {
        println!(
            "{}",
            serde_json::to_string_pretty(&scheduler.row_histograms())
                .expect("cannot serialize histograms")
        );
    }
}
