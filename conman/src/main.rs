use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use conman::{
    cli::{Cli, normalize_args},
    ctx::AppContext,
    environ::Environ,
    system::HostSystem,
    template::Renderer,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CONMAN_LOG", "warn")).init();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("{e:#}").red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = cli.overrides().context("invalid command line overrides")?;
    let mut app = AppContext::load(&cli.config, Renderer::default())?;

    let mut environ = Environ::new();
    environ.load_process();

    let plan = app.prepare(&overrides, environ, &HostSystem::default())?;
    Err(plan.exec().into())
}
