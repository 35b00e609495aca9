//! OAuth 2.0 client credentials authorization for Formance stack APIs.

pub mod auth;
pub mod client;
pub mod clock;
mod utils;

pub use auth::{
    client_credentials::{ClientCredentials, Credentials},
    token_manager::TokenManager,
    Authorization, TokenProvider,
};
pub use utils::ServerError;

/// Cached client credentials provider for a single stack.
pub type StackTokenProvider = TokenManager<ClientCredentials>;
