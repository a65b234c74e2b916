use sim_lib::flags::ApexSim;
use sim_lib::run_wrapper;
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let flags = ApexSim::from_env_or_exit();

    let default_level = if flags.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run_wrapper::run(&flags.program, flags.cycles, flags.policy())?;

    Ok(())
}
