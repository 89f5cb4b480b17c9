//! In-memory collaborators for exercising the relay without network or disk.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use futures_core::future::BoxFuture;
use reqwest::StatusCode;
use teloxide::types::ChatId;

use crate::database::{AdminStore, Error, UserRecord, UserStore};
use crate::reply_queue::Notifier;
use crate::weather::{self, Weather, WeatherSource};

fn record(chat_id: i64, first_name: &str, city: &str) -> UserRecord {
    UserRecord {
        chat_id,
        first_name: first_name.to_string(),
        city: city.to_string(),
        registered_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    users: Mutex<BTreeMap<i64, UserRecord>>,
    fail_all: AtomicBool,
    fail_create: AtomicBool,
}

impl FakeStore {
    pub fn with_users(chat_ids: &[i64]) -> Self {
        let store = Self::default();
        {
            let mut users = store.users.lock().unwrap();
            for &id in chat_ids {
                users.insert(id, record(id, "Someone", "Nowhere"));
            }
        }
        store
    }

    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.users.lock().unwrap().contains_key(&chat_id.0)
    }

    pub fn get(&self, chat_id: ChatId) -> Option<UserRecord> {
        self.users.lock().unwrap().get(&chat_id.0).cloned()
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(Error::PoolClosed)
        } else {
            Ok(())
        }
    }
}

impl UserStore for FakeStore {
    fn get_users(&self) -> BoxFuture<'_, Result<Vec<UserRecord>, Error>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.users.lock().unwrap().values().cloned().collect())
        })
    }

    fn get_user_by_chat_id(
        &self,
        chat_id: ChatId,
    ) -> BoxFuture<'_, Result<Option<UserRecord>, Error>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.get(chat_id))
        })
    }

    fn create_user<'a>(
        &'a self,
        chat_id: ChatId,
        first_name: &'a str,
        city: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, Error>> {
        Box::pin(async move {
            self.check()?;
            if self.fail_create.load(Ordering::SeqCst) {
                return Ok(None);
            }
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&chat_id.0) {
                return Ok(None);
            }
            let user = record(chat_id.0, first_name, city);
            users.insert(chat_id.0, user.clone());
            Ok(Some(user))
        })
    }

    fn delete_user(&self, chat_id: ChatId) -> BoxFuture<'_, Result<Option<UserRecord>, Error>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.users.lock().unwrap().remove(&chat_id.0))
        })
    }
}

pub struct FakeAdmin(pub Option<String>);

impl AdminStore for FakeAdmin {
    fn get_api_key(&self) -> BoxFuture<'_, Result<Option<String>, Error>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Answers every request with 300 K and clear sky, except for the calls
/// (counted from zero) that were marked as failing.
#[derive(Default)]
pub struct FakeWeather {
    calls: Mutex<Vec<(String, String)>>,
    failing_calls: Mutex<HashSet<usize>>,
}

impl FakeWeather {
    pub fn fail_call(&self, index: usize) {
        self.failing_calls.lock().unwrap().insert(index);
    }

    pub fn cities(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(city, _)| city.clone())
            .collect()
    }

    pub fn api_keys(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl WeatherSource for FakeWeather {
    fn fetch_weather<'a>(
        &'a self,
        city: &'a str,
        api_key: &'a str,
    ) -> BoxFuture<'a, Result<Weather, weather::Error>> {
        Box::pin(async move {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((city.to_string(), api_key.to_string()));
                calls.len() - 1
            };
            if self.failing_calls.lock().unwrap().contains(&index) {
                return Err(weather::Error::Status(StatusCode::BAD_GATEWAY));
            }
            Ok(Weather {
                description: Some("clear sky".to_string()),
                temperature_celsius: weather::kelvin_to_celsius(300.0),
            })
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == chat_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, chat_id: ChatId, msg: String) {
        self.sent.lock().unwrap().push((chat_id, msg));
    }
}
