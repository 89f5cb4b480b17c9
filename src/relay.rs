use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use teloxide::types::{ChatId, Message};
use tokio::sync::Mutex;

use crate::database::{AdminStore, UserStore};
use crate::messages;
use crate::reply_queue::Notifier;
use crate::subscriptions::SubscriptionState;
use crate::weather::WeatherSource;

lazy_static! {
    static ref COMMAND_REGEX: Regex = Regex::new(r"^/(\w+)(?:@\w+)?").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Start,
    Subscribe,
    Unsubscribe,
    UnknownCommand,
    Text(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(text: &'a str) -> Self {
        let Some(captures) = COMMAND_REGEX.captures(text) else {
            return Input::Text(text);
        };

        match &captures[1] {
            "start" => Input::Start,
            "subscribe" => Input::Subscribe,
            "unsubscribe" => Input::Unsubscribe,
            _ => Input::UnknownCommand,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub first_name: String,
    pub text: String,
}

impl Inbound {
    pub fn from_message(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        let first_name = msg
            .from
            .as_ref()
            .map(|user| user.first_name.clone())
            .or_else(|| msg.chat.first_name().map(str::to_owned))
            .unwrap_or_default();

        Some(Self {
            chat_id: msg.chat.id,
            first_name,
            text: text.to_owned(),
        })
    }
}

/// Owns the subscription state and reacts to chat input and timer firings.
pub struct Relay {
    store: Arc<dyn UserStore>,
    admin: Arc<dyn AdminStore>,
    weather: Arc<dyn WeatherSource>,
    notifier: Arc<dyn Notifier>,
    default_city: String,
    state: Mutex<SubscriptionState>,
    fan_out_running: Mutex<()>,
}

impl Relay {
    pub fn new(
        store: Arc<dyn UserStore>,
        admin: Arc<dyn AdminStore>,
        weather: Arc<dyn WeatherSource>,
        notifier: Arc<dyn Notifier>,
        default_city: String,
    ) -> Self {
        Self {
            store,
            admin,
            weather,
            notifier,
            default_city,
            state: Mutex::new(SubscriptionState::new()),
            fan_out_running: Mutex::new(()),
        }
    }

    pub async fn initialize(&self) {
        let mut loaded = SubscriptionState::new();
        loaded.initialize(self.store.as_ref()).await;
        *self.state.lock().await = loaded;
    }

    pub async fn handle(&self, inbound: Inbound) {
        let chat_id = inbound.chat_id;
        match Input::classify(&inbound.text) {
            Input::Start => self.notifier.send(chat_id, messages::welcome()),
            Input::Subscribe => self.handle_subscribe(chat_id).await,
            Input::Unsubscribe => self.handle_unsubscribe(chat_id).await,
            Input::UnknownCommand => log::debug!("Ignoring unknown command from {chat_id}"),
            Input::Text(city) => self.handle_city(chat_id, &inbound.first_name, city).await,
        }
    }

    async fn handle_subscribe(&self, chat_id: ChatId) {
        let marked = self.state.lock().await.mark_awaiting(chat_id);
        let reply = if marked {
            messages::enter_city()
        } else {
            messages::already_awaiting_city()
        };
        self.notifier.send(chat_id, reply);
    }

    async fn handle_unsubscribe(&self, chat_id: ChatId) {
        let reply = match self.store.get_user_by_chat_id(chat_id).await {
            Ok(None) => messages::not_registered(),
            Ok(Some(_)) => match self.store.delete_user(chat_id).await {
                Ok(Some(_)) => {
                    self.state.lock().await.remove_subscriber(chat_id);
                    log::info!("Chat {chat_id} unsubscribed");
                    messages::unregistered()
                }
                Ok(None) => {
                    log::warn!("User record of {chat_id} vanished before deletion");
                    messages::internal_error()
                }
                Err(e) => {
                    log::error!("Database error: {e}");
                    messages::internal_error()
                }
            },
            Err(e) => {
                log::error!("Database error: {e}");
                messages::internal_error()
            }
        };
        self.notifier.send(chat_id, reply);
    }

    async fn handle_city(&self, chat_id: ChatId, first_name: &str, text: &str) {
        if !self.state.lock().await.clear_awaiting(chat_id) {
            // not waiting for a city, free text is ignored
            return;
        }
        let city = text.trim();

        match self.store.get_user_by_chat_id(chat_id).await {
            Ok(None) => (),
            Ok(Some(_)) => {
                self.notifier.send(chat_id, messages::already_registered());
                return;
            }
            Err(e) => {
                log::error!("Database error: {e}");
                self.notifier.send(chat_id, messages::internal_error());
                return;
            }
        }

        match self.store.create_user(chat_id, first_name, city).await {
            Ok(Some(_)) => {
                self.state.lock().await.add_subscriber(chat_id);
                log::info!("Chat {chat_id} subscribed with city {city}");
                self.push_weather(chat_id, city).await;
                self.notifier.send(chat_id, messages::registered());
            }
            Ok(None) => {
                log::warn!("Could not create user record for {chat_id}");
                self.notifier.send(chat_id, messages::registration_failed());
            }
            Err(e) => {
                log::error!("Database error: {e}");
                self.notifier.send(chat_id, messages::registration_failed());
            }
        }
    }

    /// Fetches the weather for `city` and sends it. Failures are logged only.
    async fn push_weather(&self, chat_id: ChatId, city: &str) -> bool {
        let api_key = match self.admin.get_api_key().await {
            Ok(Some(key)) => key,
            Ok(None) => {
                log::warn!("No weather API key configured, cannot notify {chat_id}");
                return false;
            }
            Err(e) => {
                log::error!("Database error while reading API key: {e}");
                return false;
            }
        };

        match self.weather.fetch_weather(city, &api_key).await {
            Ok(weather) => {
                self.notifier
                    .send(chat_id, messages::weather_report(city, &weather));
                true
            }
            Err(e) => {
                log::warn!("Failed to get weather for {city} (chat {chat_id}): {e}");
                false
            }
        }
    }

    /// Sends the default city's weather to every subscriber. Returns the
    /// number of messages sent, or `None` if a previous run is still going.
    pub async fn fan_out(&self) -> Option<usize> {
        let Ok(_running) = self.fan_out_running.try_lock() else {
            log::warn!("Previous fan-out still running, skipping this one");
            return None;
        };

        let chats = self.state.lock().await.subscribers();
        log::info!("Sending weather for {} to {} chats", self.default_city, chats.len());

        let mut sent = 0;
        for &chat_id in &chats {
            if self.push_weather(chat_id, &self.default_city).await {
                sent += 1;
            }
        }

        log::info!("Fan-out done, {sent} of {} chats notified", chats.len());
        Some(sent)
    }
}
