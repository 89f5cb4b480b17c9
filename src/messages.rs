use teloxide::utils::command::BotCommands;

use crate::weather::Weather;
use crate::Command;

pub fn welcome() -> String {
    format!(
        "Hi! I send you the current weather once per hour.\n\n{}",
        Command::descriptions()
    )
}

pub fn enter_city() -> String {
    "Enter your city:".to_string()
}

pub fn already_awaiting_city() -> String {
    "You have already requested a subscription, please wait.".to_string()
}

pub fn registered() -> String {
    "You have been registered.".to_string()
}

pub fn already_registered() -> String {
    "You are already registered.".to_string()
}

pub fn registration_failed() -> String {
    "Registration failed, please try again later.".to_string()
}

pub fn unregistered() -> String {
    "You have been unregistered.".to_string()
}

pub fn not_registered() -> String {
    "You are not registered.".to_string()
}

pub fn weather_report(city: &str, weather: &Weather) -> String {
    format!(
        "Weather in {city}: {}, {:.2}°C",
        weather.description.as_deref().unwrap_or("unknown"),
        weather.temperature_celsius
    )
}

pub fn internal_error() -> String {
    "Sorry, an internal error occurred :(".to_string()
}
