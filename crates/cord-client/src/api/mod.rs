//! Topical endpoint groups
//!
//! Each group is an independent set of thin wrappers that build a route
//! plus body/query and hand it to the dispatcher. Groups borrow the
//! dispatcher and are composed as accessor methods on `Client`.

mod channels;
mod gateway;
mod guilds;
mod users;
mod webhooks;

pub use channels::{ChannelsApi, CreateMessage, GetMessages};
pub use gateway::{BotGatewayInfo, GatewayApi, GatewayInfo, SessionStartLimit};
pub use guilds::{GuildsApi, ModifyGuild};
pub use users::UsersApi;
pub use webhooks::{ExecuteWebhook, WebhooksApi};
