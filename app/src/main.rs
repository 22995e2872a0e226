use clap::Parser;

use fragedit_app::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = fragedit_app::execute(cli) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
