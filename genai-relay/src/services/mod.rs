pub mod providers;

pub use providers::{AudioProvider, ImageProvider, ProviderError, TextProvider};
