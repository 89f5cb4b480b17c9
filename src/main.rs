mod config;
mod database;
mod messages;
mod relay;
mod reply_queue;
mod scheduler;
mod subscriptions;
#[cfg(test)]
mod testing;
mod weather;

use std::sync::Arc;

use config::Config;
use database::Database;
use dptree::deps;
use relay::{Inbound, Relay};
use reply_queue::ReplyQueue;
use scheduler::Scheduler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use weather::WeatherClient;

#[derive(BotCommands, Clone, Debug)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "show this text.")]
    Start,
    #[command(description = "get the weather every hour.")]
    Subscribe,
    #[command(description = "stop the hourly weather.")]
    Unsubscribe,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::Error),
    #[error("database error: {0}")]
    Database(#[from] database::Error),
    #[error("cannot create weather client: {0}")]
    Weather(#[from] weather::Error),
}

#[tokio::main]
async fn main() {
    env_logger::init();
    log::info!("Starting bot...");

    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    let bot = Bot::from_env();

    let database = Arc::new(Database::new(&config.database_url).await?);
    match &config.weather_api_key {
        Some(key) => database.set_api_key(key).await?,
        None if database.get_api_key().await?.is_none() => {
            log::warn!("No weather API key stored, set WEATHER_API_KEY")
        }
        None => (),
    }

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Couldn't register bot commands: {e}");
    }

    let relay = Arc::new(Relay::new(
        database.clone(),
        database,
        Arc::new(WeatherClient::new(config.weather_endpoint)?),
        Arc::new(ReplyQueue::new(bot.clone())),
        config.default_city,
    ));
    relay.initialize().await;

    Scheduler::spawn(relay.clone());

    let answer = |msg: Message, relay: Arc<Relay>| async move {
        if let Some(inbound) = Inbound::from_message(&msg) {
            relay.handle(inbound).await;
        }
        respond(())
    };

    Dispatcher::builder(bot, Update::filter_message().endpoint(answer))
        .dependencies(deps![relay])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
