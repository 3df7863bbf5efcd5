use benchlock::cmd::Cli;
use clap::Parser;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = cli.command.run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
