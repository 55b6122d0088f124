use std::{collections::HashMap, fmt, path::Path};

use chrono::{DateTime, Local};
use itertools::Itertools;
use tracing::debug;

use crate::persistence::{Persistence, find_max_id};

pub mod error;
pub mod fields;
pub mod route;

pub use error::RouteError;
pub use route::{Coordinates, Location, NewRoute, Route, RouteId};

use route::TIMESTAMP_FORMAT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The field name was the stop sentinel; nothing was touched.
    Stopped,
}

/// Summary printed by the `info` command.
#[derive(Debug)]
pub struct CollectionInfo {
    pub container: &'static str,
    pub element: &'static str,
    pub created_at: DateTime<Local>,
    pub len: usize,
}

impl fmt::Display for CollectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Collection type: {}", self.container)?;
        writeln!(f, "Element type: {}", self.element)?;
        writeln!(
            f,
            "Created at: {}",
            self.created_at.format(TIMESTAMP_FORMAT)
        )?;
        write!(f, "Number of elements: {}", self.len)
    }
}

/// Owns the route collection and hands out ids.
///
/// `max_id` only ever grows, so an id freed by a removal is never given out
/// again during the lifetime of the manager.
pub struct CollectionManager {
    routes: HashMap<RouteId, Route>,
    max_id: RouteId,
    created_at: DateTime<Local>,
}

impl CollectionManager {
    pub fn new<I: IntoIterator<Item = Route>>(routes: I) -> Self {
        let routes: HashMap<RouteId, Route> = routes.into_iter().map(|r| (r.id(), r)).collect();
        let max_id = find_max_id(routes.values());
        debug!(%max_id, count = routes.len(), "collection seeded");

        Self {
            routes,
            max_id,
            created_at: Local::now(),
        }
    }

    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            container: "HashMap",
            element: "Route",
            created_at: self.created_at,
            len: self.routes.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn max_id(&self) -> RouteId {
        self.max_id
    }

    pub fn get(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(&id)
    }

    /// Every route, lowest id first.
    pub fn routes_by_id(&self) -> Vec<&Route> {
        self.routes.values().sorted_by_key(|r| r.id()).collect()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn contains_id(&self, id: RouteId) -> bool {
        self.routes.contains_key(&id)
    }

    /// Drops every route whose id is strictly greater than `id` and returns how
    /// many went.
    pub fn remove_greater(&mut self, id: RouteId) -> usize {
        let doomed: Vec<RouteId> = self.routes.keys().copied().filter(|&k| k > id).collect();
        for key in &doomed {
            self.routes.remove(key);
        }
        doomed.len()
    }

    /// All present distances in ascending order, duplicates kept.
    pub fn distances_sorted(&self) -> Vec<i64> {
        self.routes
            .values()
            .filter_map(|r| r.distance())
            .sorted()
            .collect()
    }

    pub fn id_name_pairs(&self, order: SortOrder) -> Vec<(RouteId, &str)> {
        let pairs = self.routes.values().map(|r| (r.id(), r.name()));
        match order {
            SortOrder::Ascending => pairs.sorted_by_key(|p| p.0).collect(),
            SortOrder::Descending => pairs.sorted_by_key(|p| std::cmp::Reverse(p.0)).collect(),
        }
    }

    pub fn remove_by_id(&mut self, id: RouteId) -> Option<Route> {
        self.routes.remove(&id)
    }

    /// Total of all present distances. Wraps on overflow instead of panicking.
    pub fn sum_of_distance(&self) -> i64 {
        self.routes
            .values()
            .filter_map(|r| r.distance())
            .fold(0, i64::wrapping_add)
    }

    /// Inserts `route` under the next free id and returns that id.
    pub fn add(&mut self, route: NewRoute) -> Result<RouteId, RouteError> {
        let id = self
            .max_id
            .next()
            .ok_or(RouteError::IdsExhausted(self.max_id))?;
        self.routes.insert(id, route.with_id(id));
        self.max_id = id;
        debug!(%id, "route added");
        Ok(id)
    }

    /// Inserts `route` under `id` only if `id` is above every id handed out so
    /// far. Returns whether it was inserted.
    pub fn add_if_max(&mut self, id: RouteId, route: NewRoute) -> bool {
        if id <= self.max_id {
            return false;
        }
        self.routes.insert(id, route.with_id(id));
        self.max_id = id;
        debug!(%id, "route added above previous maximum");
        true
    }

    pub fn save<P: Persistence>(&self, persistence: &P, path: &Path) -> Result<(), P::Error> {
        persistence.store(path, self.routes.values())
    }

    pub fn field_names(&self) -> String {
        fields::describe()
    }

    /// Parses `value` and writes it into `field` of route `id`.
    pub fn update(
        &mut self,
        id: RouteId,
        field: &str,
        value: &str,
    ) -> Result<UpdateOutcome, RouteError> {
        if fields::is_stop(field) {
            return Ok(UpdateOutcome::Stopped);
        }
        let route = self.routes.get_mut(&id).ok_or(RouteError::NotFound(id))?;
        let field =
            fields::lookup(field).ok_or_else(|| RouteError::UnknownField(field.to_owned()))?;
        field.apply(route, value)?;
        debug!(%id, field = field.name, "route updated");
        Ok(UpdateOutcome::Updated)
    }
}
