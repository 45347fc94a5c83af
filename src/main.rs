use clap::Parser;
use kubestellar::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    kubestellar::logging::init(cli.verbosity);

    if let Err(err) = cli.run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
