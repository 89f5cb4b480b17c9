use std::time::Duration;

use teloxide::prelude::*;
use tokio::sync::mpsc;

/// Outbound side of the bot. Sending never fails from the caller's view.
pub trait Notifier: Send + Sync {
    fn send(&self, chat_id: ChatId, msg: String);
}

/// Messages handed to Telegram per second, below its bulk limit of 30.
const MESSAGES_PER_SECOND: usize = 20;

/// Sends at most `MESSAGES_PER_SECOND` messages, in the order they were queued.
#[derive(Clone)]
pub struct ReplyQueue(mpsc::UnboundedSender<(ChatId, String)>);

impl ReplyQueue {
    async fn deliver(bot: &Bot, chat_id: ChatId, msg: String) {
        let result = bot.send_message(chat_id, msg).await;

        if let Err(e) = result {
            log::warn!("Couldn't send message to {chat_id}: {e}")
        }
    }

    pub fn new(bot: Bot) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(ChatId, String)>();

        tokio::task::spawn(async move {
            let mut buffer = Vec::with_capacity(MESSAGES_PER_SECOND);
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            while rx.recv_many(&mut buffer, MESSAGES_PER_SECOND).await > 0 {
                for (c, s) in buffer.drain(..) {
                    Self::deliver(&bot, c, s).await;
                }
                interval.tick().await;
            }
        });

        Self(tx)
    }

    pub fn queue(&self, chat_id: ChatId, msg: String) {
        if self.0.send((chat_id, msg)).is_err() {
            log::error!("Queuing message failed!")
        }
    }
}

impl Notifier for ReplyQueue {
    fn send(&self, chat_id: ChatId, msg: String) {
        self.queue(chat_id, msg)
    }
}
