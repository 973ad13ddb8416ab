pub mod channel;
pub mod chat;
pub mod id;
pub mod user;

pub use channel::{CategorySummary, Channel};
pub use chat::ChatMessage;
pub use id::{ChannelId, ViewerId};
pub use user::{SubscriptionStatus, UserAccount};
