use std::str::FromStr;

use itertools::Itertools;

use crate::collection::{error::RouteError, route::Route};

/// One user-editable route attribute.
pub struct Field {
    pub name: &'static str,
    pub kind: &'static str,
    apply: fn(&mut Route, &str) -> Result<(), RouteError>,
}

impl Field {
    /// Parses `raw` and writes it into `route`. The route is untouched on error.
    pub fn apply(&self, route: &mut Route, raw: &str) -> Result<(), RouteError> {
        (self.apply)(route, raw)
    }
}

pub const FIELDS: &[Field] = &[
    Field {
        name: "Name",
        kind: "String",
        apply: |route, raw| route.set_name(non_empty("Name", raw)?),
    },
    Field {
        name: "CoordinateX",
        kind: "f64, at most 750",
        apply: |route, raw| {
            route
                .coordinates_mut()
                .set_x(parse("CoordinateX", "f64", raw)?)
        },
    },
    Field {
        name: "CoordinateY",
        kind: "f32",
        apply: |route, raw| {
            route
                .coordinates_mut()
                .set_y(parse("CoordinateY", "f32", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationFromX",
        kind: "f32",
        apply: |route, raw| {
            route.from_mut().set_x(parse("LocationFromX", "f32", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationFromY",
        kind: "i32",
        apply: |route, raw| {
            route.from_mut().set_y(parse("LocationFromY", "i32", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationFromZ",
        kind: "f64",
        apply: |route, raw| {
            route.from_mut().set_z(parse("LocationFromZ", "f64", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationFromName",
        kind: "String",
        apply: |route, raw| {
            route
                .from_mut()
                .set_name(non_empty("LocationFromName", raw)?)
        },
    },
    Field {
        name: "LocationToX",
        kind: "f32",
        apply: |route, raw| {
            route.to_mut().set_x(parse("LocationToX", "f32", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationToY",
        kind: "i32",
        apply: |route, raw| {
            route.to_mut().set_y(parse("LocationToY", "i32", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationToZ",
        kind: "f64",
        apply: |route, raw| {
            route.to_mut().set_z(parse("LocationToZ", "f64", raw)?);
            Ok(())
        },
    },
    Field {
        name: "LocationToName",
        kind: "String",
        apply: |route, raw| route.to_mut().set_name(non_empty("LocationToName", raw)?),
    },
    Field {
        name: "Distance",
        kind: "i64, greater than 1",
        apply: |route, raw| route.set_distance(Some(parse("Distance", "i64", raw)?)),
    },
];

/// Both spellings end an update dialog.
pub fn is_stop(name: &str) -> bool {
    name == "stop" || name == "Stop"
}

pub fn lookup(name: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|f| f.name == name)
}

pub fn describe() -> String {
    let fields = FIELDS
        .iter()
        .map(|f| format!("{} ({})", f.name, f.kind))
        .join("\n");
    format!("Updatable fields:\n{fields}\nstop (finish editing)\n")
}

pub fn non_empty(field: &'static str, raw: &str) -> Result<String, RouteError> {
    if raw.is_empty() {
        return Err(RouteError::Empty { field });
    }
    Ok(raw.to_owned())
}

/// Parses trimmed `raw` as `T`, naming `field` and `kind` in the error.
pub fn parse<T: FromStr>(
    field: &'static str,
    kind: &'static str,
    raw: &str,
) -> Result<T, RouteError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RouteError::Empty { field });
    }
    raw.parse().map_err(|_| RouteError::Parse {
        field,
        kind,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::route::{RouteId, sample};

    fn route() -> Route {
        sample("A", Some(10)).with_id(RouteId::new(1))
    }

    #[test]
    fn every_field_is_described() {
        let text = describe();
        assert!(text.starts_with("Updatable fields:\nName (String)\nCoordinateX (f64"));
        assert!(text.ends_with("Distance (i64, greater than 1)\nstop (finish editing)\n"));
        for field in FIELDS {
            assert!(text.contains(field.name), "{} missing", field.name);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("Name").is_some());
        assert!(lookup("name").is_none());
        assert!(lookup("Stop").is_none());
        assert!(is_stop("stop") && is_stop("Stop") && !is_stop("STOP"));
    }

    #[test]
    fn numeric_fields_parse_into_place() {
        let mut r = route();
        lookup("LocationFromY").unwrap().apply(&mut r, "-17").unwrap();
        lookup("LocationToZ").unwrap().apply(&mut r, " 2.5 ").unwrap();
        lookup("CoordinateY").unwrap().apply(&mut r, "0.25").unwrap();
        assert_eq!(r.from().y(), -17);
        assert_eq!(r.to().z(), 2.5);
        assert_eq!(r.coordinates().y(), 0.25);
    }

    #[test]
    fn bad_input_is_reported_and_ignored() {
        let mut r = route();
        let before = r.clone();

        let err = lookup("LocationToY").unwrap().apply(&mut r, "1.5").unwrap_err();
        assert_eq!(
            err,
            RouteError::Parse {
                field: "LocationToY",
                kind: "i32",
                value: "1.5".to_owned()
            }
        );
        assert_eq!(
            lookup("LocationFromName").unwrap().apply(&mut r, ""),
            Err(RouteError::Empty {
                field: "LocationFromName"
            })
        );
        assert!(lookup("Distance").unwrap().apply(&mut r, "1").is_err());
        assert_eq!(
            lookup("CoordinateX").unwrap().apply(&mut r, "750.01"),
            Err(RouteError::AboveMaximum {
                field: "coordinates.x",
                max: 750.0,
                value: 750.01
            })
        );
        assert_eq!(r, before);
    }
}
