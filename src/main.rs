//! POS sequencer worker entry point.
//!
//! Loads configuration, connects the counter store, and serves the HTTP API.

use pos_sequencer::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
