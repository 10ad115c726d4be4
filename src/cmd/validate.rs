use crate::reports;
use clap::Args;
use replanforge::config::ReplanConfig;
use replanforge::error::RpResult;
use replanforge::stepsize::StepSizeSchedule;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ReplanConfig,

    /// Also preview the step size schedule for a population of this size.
    #[arg(short, long)]
    pub population: Option<usize>,

    /// Save the resolved configuration as JSON.
    #[arg(short, long)]
    pub write: Option<String>,
}

pub fn run(args: &ValidateArgs, config: ReplanConfig) -> RpResult<()> {
    config.validate()?;
    reports::print_config_table(&config);

    if let Some(n) = args.population {
        let schedule = StepSizeSchedule::from_config(&config, n)?;
        reports::print_schedule_table(&config, &schedule, n);
    }

    if let Some(path) = &args.write {
        config.save_to_file(path)?;
        println!("💾 Saved configuration to {}", path);
    }

    println!("✅ Configuration is valid");
    Ok(())
}
