use clap::Parser;

use dbcli_cli::mcli;

fn main() -> anyhow::Result<()> {
    let cli = mcli::Cli::parse();
    mcli::run(cli)
}
