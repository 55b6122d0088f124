use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Local, SubsecRound};

use crate::collection::error::RouteError;

/// Timestamp layout used both for display and for the data file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MAX_COORDINATE_X: f64 = 750.0;

/// Distances must be strictly greater than this.
pub const MIN_DISTANCE: i64 = 1;

/// The current time at the precision the data file keeps.
pub fn creation_now() -> DateTime<Local> {
    Local::now().trunc_subsecs(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RouteId(u32);

impl RouteId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RouteId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

pub fn validate_name(field: &'static str, name: String) -> Result<String, RouteError> {
    if name.is_empty() {
        return Err(RouteError::Empty { field });
    }
    Ok(name)
}

pub fn validate_coordinate_x(x: f64) -> Result<f64, RouteError> {
    // written as a negation so NaN is rejected too
    if !(x <= MAX_COORDINATE_X) {
        return Err(RouteError::AboveMaximum {
            field: "coordinates.x",
            max: MAX_COORDINATE_X,
            value: x,
        });
    }
    Ok(x)
}

pub fn validate_distance(distance: i64) -> Result<i64, RouteError> {
    if distance <= MIN_DISTANCE {
        return Err(RouteError::NotAboveMinimum {
            field: "distance",
            min: MIN_DISTANCE,
            value: distance,
        });
    }
    Ok(distance)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    x: f64,
    y: f32,
}

impl Coordinates {
    pub fn new(x: f64, y: f32) -> Result<Self, RouteError> {
        Ok(Self {
            x: validate_coordinate_x(x)?,
            y,
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_x(&mut self, x: f64) -> Result<(), RouteError> {
        self.x = validate_coordinate_x(x)?;
        Ok(())
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A named point in three dimensions, used for both ends of a route.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    x: f32,
    y: i32,
    z: f64,
    name: String,
}

impl Location {
    pub fn new(x: f32, y: i32, z: f64, name: String) -> Result<Self, RouteError> {
        Ok(Self {
            x,
            y,
            z,
            name: validate_name("location.name", name)?,
        })
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: i32) {
        self.y = y;
    }

    pub fn set_z(&mut self, z: f64) {
        self.z = z;
    }

    pub fn set_name(&mut self, name: String) -> Result<(), RouteError> {
        self.name = validate_name("location.name", name)?;
        Ok(())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {}, {})", self.name, self.x, self.y, self.z)
    }
}

/// A validated route that has not been given an id yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRoute {
    name: String,
    coordinates: Coordinates,
    creation_date: DateTime<Local>,
    from: Location,
    to: Location,
    distance: Option<i64>,
}

impl NewRoute {
    pub fn new(
        name: String,
        coordinates: Coordinates,
        creation_date: DateTime<Local>,
        from: Location,
        to: Location,
        distance: Option<i64>,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            name: validate_name("name", name)?,
            coordinates,
            creation_date,
            from,
            to,
            distance: distance.map(validate_distance).transpose()?,
        })
    }

    pub fn with_id(self, id: RouteId) -> Route {
        Route {
            id,
            name: self.name,
            coordinates: self.coordinates,
            creation_date: self.creation_date,
            from: self.from,
            to: self.to,
            distance: self.distance,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    id: RouteId,
    name: String,
    coordinates: Coordinates,
    creation_date: DateTime<Local>,
    from: Location,
    to: Location,
    distance: Option<i64>,
}

impl Route {
    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    pub fn creation_date(&self) -> DateTime<Local> {
        self.creation_date
    }

    pub fn from(&self) -> &Location {
        &self.from
    }

    pub fn to(&self) -> &Location {
        &self.to
    }

    pub fn distance(&self) -> Option<i64> {
        self.distance
    }

    pub fn coordinates_mut(&mut self) -> &mut Coordinates {
        &mut self.coordinates
    }

    pub fn from_mut(&mut self) -> &mut Location {
        &mut self.from
    }

    pub fn to_mut(&mut self) -> &mut Location {
        &mut self.to
    }

    pub fn set_name(&mut self, name: String) -> Result<(), RouteError> {
        self.name = validate_name("name", name)?;
        Ok(())
    }

    pub fn set_distance(&mut self, distance: Option<i64>) -> Result<(), RouteError> {
        self.distance = distance.map(validate_distance).transpose()?;
        Ok(())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} | coordinates {} | created {} | from {} | to {} | distance ",
            self.id,
            self.name,
            self.coordinates,
            self.creation_date.format(TIMESTAMP_FORMAT),
            self.from,
            self.to,
        )?;
        match self.distance {
            Some(d) => write!(f, "{d}"),
            None => write!(f, "-"),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str, distance: Option<i64>) -> NewRoute {
    use chrono::TimeZone;

    let created = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    NewRoute::new(
        name.to_owned(),
        Coordinates::new(10.0, 1.5).unwrap(),
        created,
        Location::new(1.0, 2, 3.0, "Depot".to_owned()).unwrap(),
        Location::new(-4.5, 5, 6.25, "Harbour".to_owned()).unwrap(),
        distance,
    )
    .unwrap()
}
