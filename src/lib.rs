use config::Config;

pub mod account;
pub mod config;
pub mod error;
pub mod identity;
pub mod invites;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod relations;
pub mod routes;
pub mod store;

use identity::GoTrueProvider;
use invites::TokenCipher;
use notify::WebhookNotifier;
use store::Stores;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
    pub identity: GoTrueProvider,
    pub notifier: WebhookNotifier,
    pub cipher: TokenCipher,
}
