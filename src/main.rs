use clap::Parser;
use stocksim::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    stocksim::init_tracing();
    run(Cli::parse())
}
