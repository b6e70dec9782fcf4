use clap::Parser;
use stratlang::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
