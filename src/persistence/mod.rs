pub mod csv;

use std::path::Path;

use crate::collection::{Route, RouteId};

pub use csv::CsvFile;

/// Where a route collection lives between sessions.
pub trait Persistence {
    type Error;

    /// Reads every route stored at `path`. A missing file is an empty collection.
    fn load(&self, path: &Path) -> Result<Vec<Route>, Self::Error>;

    /// Replaces whatever is stored at `path` with `routes`.
    fn store<'a, I>(&self, path: &Path, routes: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = &'a Route>;
}

/// Highest id in `routes`, or zero when there are none.
pub fn find_max_id<'a, I: IntoIterator<Item = &'a Route>>(routes: I) -> RouteId {
    routes
        .into_iter()
        .map(|r| r.id())
        .max()
        .unwrap_or_default()
}
