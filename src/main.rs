mod collection;
mod config;
mod persistence;
mod repl;

use std::io;

use clap::Parser;
use tracing::{info, warn};

use crate::{
    collection::CollectionManager,
    config::Config,
    persistence::{CsvFile, Persistence},
    repl::Repl,
};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.init_logging();

    let now = std::time::Instant::now();
    let routes = CsvFile.load(&config.file).unwrap_or_else(|err| {
        warn!("{err:#}; starting with an empty collection");
        vec![]
    });
    let manager = CollectionManager::new(routes);
    info!(
        count = manager.len(),
        max_id = %manager.max_id(),
        "collection ready in {:?}",
        now.elapsed()
    );

    let mut repl = Repl::new(
        manager,
        CsvFile,
        config.file,
        io::stdin().lock(),
        io::stdout().lock(),
    );
    repl.run()
}
