//! # cord-client
//!
//! The high-level façade: one `Client` composing the REST dispatcher, the
//! cache manager, and gateway shard construction, with topical endpoint
//! groups exposed as accessor methods.
//!
//! ## Example
//!
//! ```ignore
//! use cord_client::Client;
//!
//! let client = Client::new("my-token")?;
//!
//! let me = client.users().me().await?;
//! client
//!     .channels()
//!     .create_message(channel_id, CreateMessage::new().content("hello"))
//!     .await?;
//!
//! let shard = client.shard().await?;
//! shard.on("MESSAGE_CREATE", |message| println!("{message}"));
//! shard.start().await??;
//! ```

pub mod api;
pub mod client;
pub mod error;

pub use api::{
    BotGatewayInfo, ChannelsApi, CreateMessage, ExecuteWebhook, GatewayApi, GatewayInfo,
    GetMessages, GuildsApi, ModifyGuild, SessionStartLimit, UsersApi, WebhooksApi,
};
pub use client::Client;
pub use error::ClientError;
