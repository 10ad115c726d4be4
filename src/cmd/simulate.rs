use crate::reports;
use clap::Args;
use replanforge::config::ReplanConfig;
use replanforge::coordinator::{IterationStats, ReplanCoordinator, StatsWriter};
use replanforge::corridor::{
    initial_population, Corridor, CorridorEvaluator, CorridorGenerator, CorridorSimulation,
};
use replanforge::driver;
use replanforge::error::{ReplanError, RpResult};

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: ReplanConfig,

    #[arg(short = 'n', long, default_value_t = 200)]
    pub agents: usize,

    #[arg(short = 'r', long, default_value_t = 3)]
    pub routes: usize,

    #[arg(short = 'b', long, default_value_t = 6)]
    pub bins: u32,

    /// Candidate plans generated per agent and iteration.
    #[arg(long, default_value_t = 4)]
    pub candidates: usize,

    #[arg(long, default_value_t = 1.0)]
    pub schedule_delay_weight: f64,

    /// Write one CSV row per replanning cycle to this file.
    #[arg(long)]
    pub stats: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub report_every: usize,
}

pub fn run(args: &SimulateArgs, config: ReplanConfig) -> RpResult<()> {
    if args.agents == 0 {
        return Err(ReplanError::config("--agents must be at least 1"));
    }
    config.validate()?;

    println!(
        "\n🚦 Corridor: {} routes x {} bins, {} agents",
        args.routes, args.bins, args.agents
    );
    reports::print_config_table(&config);

    let corridor = Corridor::standard(args.routes, args.bins, args.agents)?;
    let preferred_bin = args.bins / 2;
    let mut agents = initial_population(args.agents, preferred_bin);

    let generator = CorridorGenerator::new(&corridor, args.candidates, config.seed);
    let evaluator =
        CorridorEvaluator::new(corridor.clone(), preferred_bin, args.schedule_delay_weight);
    let mut coordinator = ReplanCoordinator::new(config, generator, evaluator)?;
    if let Some(path) = &args.stats {
        println!("📝 Writing statistics to {}", path);
        coordinator = coordinator.with_stats_writer(StatsWriter::create(path)?);
    }
    let mut simulation = CorridorSimulation::new(corridor.clone());

    let every = args.report_every.max(1);
    let progress = move |stats: &IterationStats| {
        if stats.iteration % every == 0 {
            println!(
                "It {:4} | Rate: {:.3} | Replans: {:5} | Gap: {:.4}",
                stats.iteration, stats.replanning_rate, stats.replanner_count, stats.weighted_gap
            );
        }
        true
    };

    let summary = driver::run(&mut coordinator, &mut simulation, &mut agents, progress)?;

    println!("\n=== 🏁 RUN SUMMARY ===");
    reports::print_iteration_table(&summary.iterations, args.agents, every);
    reports::print_route_shares(&corridor, &simulation.flows(&agents)?);
    println!(
        "Cycles: {} | Replans: {} | Aborted: {} | Time: {:.2}s",
        summary.iterations.len(),
        summary.total_replans(),
        summary.aborted_cycles,
        summary.elapsed_secs
    );
    Ok(())
}
