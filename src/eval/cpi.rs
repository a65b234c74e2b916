use std::path::Path;
use std::process;

use sim_lib::cpu::CPUPolicy;
use sim_lib::error::SimulatorError;
use sim_lib::error::SimulatorResult;
use sim_lib::loader;
use sim_lib::pipelined::Pipeline;
use sim_lib::run_wrapper::run_pipeline;
use sim_lib::run_wrapper::RunStats;

const CYCLE_BUDGET: u64 = 10_000;

fn main() {
    if let Err(e) = run_eval() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn csv_error(context: &str, e: csv::Error) -> SimulatorError {
    SimulatorError::IoError(std::io::Error::other(format!("{}: {}", context, e)))
}

/// Runs one program until it drains
fn evaluate(program_path: &Path) -> SimulatorResult<RunStats> {
    let store = loader::load_program(program_path)?;
    let policy = CPUPolicy { drain: true, ..CPUPolicy::default() };
    let mut pipe = Pipeline::new(store, policy)?;
    run_pipeline(&mut pipe, CYCLE_BUDGET)
}

fn run_eval() -> SimulatorResult<()> {
    std::fs::create_dir_all("eval")?;
    let output_path = "eval/apex_eval.csv".to_string();
    let mut writer = csv::Writer::from_path(&output_path).map_err(|e| {
        csv_error(&format!("Failed to create CSV file '{}'", output_path), e)
    })?;

    writer
        .write_record([
            "Program",
            "Cycles",
            "Instructions",
            "CPI",
            "Stall cycles",
            "Taken branches",
            "Flushed",
        ])
        .map_err(|e| csv_error("Failed to write header to CSV", e))?;

    let programs = ["arithmetic", "hazard", "branch", "loop"];

    for program in programs {
        let program_path = format!("programs/{}.asm", program);
        eprintln!("Running program: {}", program_path);

        match evaluate(Path::new(&program_path)) {
            Ok(stats) => {
                writer
                    .write_record([
                        program,
                        &stats.cycles.to_string(),
                        &stats.instructions.to_string(),
                        &format!("{:.3}", stats.cpi),
                        &stats.stalls.to_string(),
                        &stats.branches_taken.to_string(),
                        &stats.flushed.to_string(),
                    ])
                    .map_err(|e| csv_error("Failed to write record to CSV", e))?;
            }
            Err(e) => {
                eprintln!("Warning: Failed to run program '{}': {}", program, e);
                writer
                    .write_record([program, "Error", "Error", "Error", "Error", "Error", "Error"])
                    .map_err(|e| csv_error("Failed to write record to CSV", e))?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}
