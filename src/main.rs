use std::error::Error;
use tiered_subnet_planner::config::AppConfig;
use tiered_subnet_planner::input::PlanFile;
use tiered_subnet_planner::output::print_network;
use tiered_subnet_planner::plan_from_file;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let config = AppConfig::from_env(std::env::args().nth(1));
    log4rs::init_file(&config.log_config, Default::default())
        .map_err(|e| format!("Error initializing log4rs from {}: {e}", config.log_config))?;
    log::info!("#Start main() plan={}", config.plan_file);

    let plan = PlanFile::load(&config.plan_file)?;
    let (allocation, network) = plan_from_file(&plan)?;
    print_network(&allocation, &network);

    Ok(())
}
