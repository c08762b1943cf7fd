//! Compile a pattern into a canonically-named (optionally minimized) DFA

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;
use refract::engine::{Config, Engine};

#[derive(Debug, Parser)]
struct Opts {
    /// Pattern to compile
    pattern: String,

    /// Run the optimizer over the result
    #[arg(short, long)]
    minimize: bool,

    /// Abort determinization beyond this many states
    #[arg(short = 'l', long)]
    state_limit: Option<usize>,

    /// Recover a pattern from the result and print it
    #[arg(short, long)]
    round_trip: bool,
}

fn main() -> ExitCode {
    let Opts {
        pattern,
        minimize,
        state_limit,
        round_trip,
    } = Opts::parse();

    let mut engine = Engine::new(Config {
        max_states: state_limit,
        auto_optimize: minimize,
        ..Config::default()
    });

    let result = engine.compile(&pattern).and_then(|nfa| {
        let dfa = engine.determinize(&nfa)?;
        let recovered = round_trip.then(|| engine.to_regex(&dfa)).transpose()?;
        Ok((dfa, recovered))
    });

    let (dfa, recovered) = match result {
        Ok(out) => out,
        Err(e) => {
            eprintln!("rx2dfa: {e}");
            return ExitCode::FAILURE;
        },
    };

    println!("{dfa:?}");
    println!(
        "{} states, {} transitions",
        dfa.state_count(),
        dfa.transition_count()
    );
    if let Some(re) = recovered {
        println!("recovered pattern: {re}");
    }

    ExitCode::SUCCESS
}
