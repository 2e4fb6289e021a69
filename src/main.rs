use clap::Parser;
use cashcrash::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
