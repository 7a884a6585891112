// Tapkeeper Engine — everything with side effects: settings, HTTP transport,
// the Telegram gateway bridge, the game API client, and the claim loop that
// drives them.

pub mod claimer;
pub mod config;
pub mod game;
pub mod http;
pub mod telegram;
