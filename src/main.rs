pub use error::Error;
mod backend;
mod command;
mod conf;
mod dashboard;
mod delivery;
mod error;
mod export;
mod log;
mod map;
mod rest;
mod server;
use conf::Conf;
use std::env;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[actix_web::main]
async fn main() -> Result<()> {
    log::init_logging();

    let args: Vec<String> = env::args().collect();

    let command = match args.get(1) {
        Some(some) => some,
        None => Err(Error::Cli(
            "No actions passed, expected one of: server, dashboard, export, upload".into(),
        ))?,
    };

    let conf = Conf::from_env()?;

    match command.as_str() {
        "server" => server::run(conf).await?,
        "dashboard" => command::dashboard::run(&conf, &args[2..]).await?,
        "export" => command::export::run(&conf, &args[2..]).await?,
        "upload" => command::upload::run(&conf, &args[2..]).await?,
        first_arg => Err(Error::Cli(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}
