use async_trait::async_trait;

pub mod console;
pub mod telegram;

pub use console::ConsoleNotifier;
pub use telegram::TelegramNotifier;

/// A channel that takes a finished message.
///
/// `deliver` never fails outward: a rejected or undeliverable message is
/// logged by the implementation and reported as `false`.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, text: &str) -> bool;
}
