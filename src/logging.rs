use tracing::subscriber::{self, SetGlobalDefaultError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a global `fmt` subscriber that prints events at `level` and above.
pub fn init_logging(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    subscriber::set_global_default(subscriber)
}
