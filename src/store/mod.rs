pub mod alerts;
pub mod profiles;
pub mod sessions;

pub use alerts::AlertLog;
pub use profiles::{JsonFileStorage, ProfileStorage, ProfileStore};
pub use sessions::SessionStore;
