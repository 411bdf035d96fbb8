use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = texpick::cli::Cli::parse();
    texpick::cli::run(cli)
}
