pub mod store;
pub mod watcher;

pub use store::CatalogStore;
pub use watcher::PlaylistWatcher;
