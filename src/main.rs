//! flushd entry point.

use flushd_lib::cli::{self, Cli};
use flushd_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    cli::execute(cli).await
}
