pub mod auth;
pub mod interaction;
pub mod presence;
pub mod session;
pub mod subscription;
pub mod sweeper;

pub use auth::{Authenticator, FileAuthenticator};
pub use interaction::InteractionStore;
pub use presence::PresenceTracker;
pub use session::SessionRegistry;
pub use subscription::SubscriptionGate;
pub use sweeper::Sweeper;
