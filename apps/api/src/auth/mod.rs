pub mod client;
pub mod handlers;
pub mod session;

pub use client::{HostedAuthClient, IdentityProvider};
pub use session::Session;
