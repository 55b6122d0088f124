use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result, bail, ensure};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tracing::{debug, info, warn};

use crate::{
    collection::{
        Coordinates, Location, NewRoute, Route, RouteId, route::TIMESTAMP_FORMAT,
    },
    persistence::Persistence,
};

/// Column count of one record:
/// `id, name, coordinates.x, coordinates.y, creationDate, from.x, from.y,
/// from.z, from.name, to.x, to.y, to.z, to.name, distance`.
const COLUMNS: usize = 14;

/// Routes stored one per line as comma separated values.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvFile;

impl Persistence for CsvFile {
    type Error = anyhow::Error;

    fn load(&self, path: &Path) -> Result<Vec<Route>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("{} does not exist, starting with no routes", path.display());
                return Ok(vec![]);
            }
            Err(err) => return Err(err).with_context(|| format!("opening {}", path.display())),
        };
        let routes = read_routes(file).with_context(|| format!("reading {}", path.display()))?;
        info!(count = routes.len(), "loaded routes from {}", path.display());
        Ok(routes)
    }

    fn store<'a, I>(&self, path: &Path, routes: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Route>,
    {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let count = write_routes(BufWriter::new(file), routes)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(count, "saved routes to {}", path.display());
        Ok(())
    }
}

/// Reads records until EOF. Rows that are not UTF-8, fail to parse, or repeat
/// an id already seen are logged and skipped. Only I/O errors end the read.
pub fn read_routes<R: Read>(reader: R) -> Result<Vec<Route>> {
    let reader = BufReader::new(reader);
    let mut seen = HashSet::new();
    let mut routes = vec![];

    for (i, bytes) in reader.split(b'\n').enumerate() {
        let line = match String::from_utf8(bytes?) {
            Ok(line) => line,
            Err(err) => {
                warn!(line = i + 1, "skipping row that is not UTF-8: {err}");
                continue;
            }
        };
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_route(line) {
            Ok(route) => {
                if seen.insert(route.id()) {
                    routes.push(route);
                } else {
                    warn!(line = i + 1, id = %route.id(), "skipping row with duplicate id");
                }
            }
            Err(err) => warn!(line = i + 1, "skipping malformed row: {err:#}"),
        }
    }

    Ok(routes)
}

/// Writes one record per route, ordered by id. Returns how many were written.
pub fn write_routes<'a, W, I>(mut writer: W, routes: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Route>,
{
    let mut routes: Vec<&Route> = routes.into_iter().collect();
    routes.sort_unstable_by_key(|r| r.id());

    for route in &routes {
        writeln!(writer, "{}", format_route(route))?;
    }
    writer.flush()?;
    Ok(routes.len())
}

pub fn format_route(route: &Route) -> String {
    let c = route.coordinates();
    let from = route.from();
    let to = route.to();
    let fields = [
        route.id().to_string(),
        quote(route.name()),
        c.x().to_string(),
        c.y().to_string(),
        route.creation_date().format(TIMESTAMP_FORMAT).to_string(),
        from.x().to_string(),
        from.y().to_string(),
        from.z().to_string(),
        quote(from.name()),
        to.x().to_string(),
        to.y().to_string(),
        to.z().to_string(),
        quote(to.name()),
        route.distance().map(|d| d.to_string()).unwrap_or_default(),
    ];
    fields.join(",")
}

pub fn parse_route(line: &str) -> Result<Route> {
    let fields = split_record(line)?;
    ensure!(
        fields.len() == COLUMNS,
        "expected {COLUMNS} fields, found {}",
        fields.len()
    );

    let id: RouteId = parse_num(&fields[0], "id")?;
    ensure!(id.get() > 0, "id must be positive");

    let coordinates = Coordinates::new(
        parse_num(&fields[2], "coordinates.x")?,
        parse_num(&fields[3], "coordinates.y")?,
    )?;
    let creation_date = parse_timestamp(&fields[4])?;
    let from = Location::new(
        parse_num(&fields[5], "from.x")?,
        parse_num(&fields[6], "from.y")?,
        parse_num(&fields[7], "from.z")?,
        fields[8].clone(),
    )?;
    let to = Location::new(
        parse_num(&fields[9], "to.x")?,
        parse_num(&fields[10], "to.y")?,
        parse_num(&fields[11], "to.z")?,
        fields[12].clone(),
    )?;
    let distance = match fields[13].trim() {
        "" => None,
        d => Some(parse_num(d, "distance")?),
    };

    let route = NewRoute::new(
        fields[1].clone(),
        coordinates,
        creation_date,
        from,
        to,
        distance,
    )?;
    debug!(%id, "parsed route");
    Ok(route.with_id(id))
}

fn parse_num<T: FromStr>(s: &str, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.trim()
        .parse()
        .with_context(|| format!("invalid {what}: {s:?}"))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid creation date: {s:?}"))?;
    // The file carries no offset. A time inside a repeated DST hour always
    // resolves to its first occurrence, so a route created during the second
    // pass reloads one hour earlier.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("creation date does not exist in local time: {s:?}"))
}

fn quote(value: &str) -> String {
    if value.contains([',', '"']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Splits one line on commas, honouring double-quoted values with `""` escapes.
fn split_record(line: &str) -> Result<Vec<String>> {
    let mut fields = vec![];
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if in_quotes {
        bail!("unterminated quoted value");
    }
    fields.push(current);
    Ok(fields)
}
