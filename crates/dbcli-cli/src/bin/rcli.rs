use clap::Parser;

use dbcli_cli::rcli;

fn main() -> anyhow::Result<()> {
    let cli = rcli::Cli::parse();
    rcli::run(cli)
}
