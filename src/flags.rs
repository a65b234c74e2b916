use std::path::PathBuf;
use std::str::FromStr;

use crate::cpu::CPUPolicy;

xflags::xflags! {
    /// APEX seven-stage pipeline simulator.
    cmd apex-sim {
        /// Path to the APEX program file.
        required program: PathBuf

        /// Run mode.
        /// simulate: run quietly and dump state at the end
        /// display: also print every stage latch each cycle
        required mode: ModeArg

        /// Number of clock cycles to simulate.
        required cycles: u64

        /// Enables history module, printing cycle and instruction counts after simulation.
        optional --history

        /// Stops before the cycle budget once the pipeline has drained.
        optional --drain

        /// Data memory size in words.
        optional --memory words: usize

        /// Ticks a BZ waits behind an ADD/SUB/MUL.
        optional --branch-delay ticks: u64

        /// Enables debug logging.
        optional -v, --verbose
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeArg {
    Simulate,
    Display,
}

impl FromStr for ModeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulate" => Ok(ModeArg::Simulate),
            "display" => Ok(ModeArg::Display),
            _ => Err(format!(
                "Invalid mode: '{}'. Expected 'simulate' or 'display'.",
                s
            )),
        }
    }
}

impl ApexSim {
    /// Simulator policy selected by these flags
    pub fn policy(&self) -> CPUPolicy {
        let defaults = CPUPolicy::default();
        CPUPolicy {
            trace: self.mode == ModeArg::Display,
            history: self.history,
            drain: self.drain,
            memory_words: self.memory.unwrap_or(defaults.memory_words),
            branch_delay: self.branch_delay.unwrap_or(defaults.branch_delay),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> xflags::Result<ApexSim> {
        ApexSim::from_vec(args.iter().map(|a| a.into()).collect())
    }

    #[test]
    fn positional_arguments() {
        let flags = parse(&["prog.asm", "display", "25", "--history"]).unwrap();
        assert_eq!(flags.program, PathBuf::from("prog.asm"));
        assert_eq!(flags.cycles, 25);

        let policy = flags.policy();
        assert!(policy.trace);
        assert!(policy.history);
        assert!(!policy.drain);
        assert_eq!(policy.memory_words, CPUPolicy::default().memory_words);
    }

    #[test]
    fn overrides_reach_policy() {
        let flags = parse(&[
            "prog.asm",
            "simulate",
            "10",
            "--drain",
            "--memory",
            "64",
            "--branch-delay",
            "3",
        ])
        .unwrap();
        let policy = flags.policy();
        assert!(!policy.trace);
        assert!(policy.drain);
        assert_eq!(policy.memory_words, 64);
        assert_eq!(policy.branch_delay, 3);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(parse(&["prog.asm", "turbo", "10"]).is_err());
        assert_eq!("DISPLAY".parse::<ModeArg>(), Ok(ModeArg::Display));
    }
}
