use async_trait::async_trait;
use tracing::info;

use super::Notifier;

/// Prints messages instead of sending them. Backs `--dry-run`.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, text: &str) -> bool {
        info!("Dry run, message not sent");
        println!("{}", text);
        true
    }
}
