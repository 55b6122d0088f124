use std::{
    fmt::Display,
    io::{BufRead, Write},
};

use anyhow::{Result, bail};

use crate::collection::{
    Coordinates, Location, NewRoute, RouteError, fields,
    route::{creation_now, validate_coordinate_x, validate_distance},
};

/// Line-at-a-time questions over the session's input and output.
pub struct Prompt<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> Prompt<'a, R, W> {
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    /// Prints `label` and reads one line without its terminator. `None` at EOF.
    pub fn line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_owned()))
    }

    /// Asks until `parse` accepts the answer. Running out of input is an error.
    pub fn ask<T>(
        &mut self,
        label: &str,
        parse: impl Fn(&str) -> Result<T, RouteError>,
    ) -> Result<T> {
        loop {
            let Some(raw) = self.line(label)? else {
                bail!("input ended before {} was given", label.trim_end_matches([':', ' ']));
            };
            match parse(&raw) {
                Ok(value) => return Ok(value),
                Err(err) => self.say(format_args!("error: {err}"))?,
            }
        }
    }

    /// Collects every attribute of a new route. The creation date is now.
    pub fn new_route(&mut self) -> Result<NewRoute> {
        let name = self.ask("Name (String): ", |s| fields::non_empty("Name", s))?;
        let x = self.ask("CoordinateX (f64, at most 750): ", |s| {
            validate_coordinate_x(fields::parse("CoordinateX", "f64", s)?)
        })?;
        let y = self.ask("CoordinateY (f32): ", |s| fields::parse("CoordinateY", "f32", s))?;
        let from = self.location("LocationFrom")?;
        let to = self.location("LocationTo")?;
        let distance = self.ask("Distance (i64, greater than 1, blank for none): ", |s| {
            if s.trim().is_empty() {
                return Ok(None);
            }
            validate_distance(fields::parse("Distance", "i64", s)?).map(Some)
        })?;

        Ok(NewRoute::new(
            name,
            Coordinates::new(x, y)?,
            creation_now(),
            from,
            to,
            distance,
        )?)
    }

    fn location(&mut self, prefix: &'static str) -> Result<Location> {
        let x = self.ask(&format!("{prefix}X (f32): "), |s| fields::parse("x", "f32", s))?;
        let y = self.ask(&format!("{prefix}Y (i32): "), |s| fields::parse("y", "i32", s))?;
        let z = self.ask(&format!("{prefix}Z (f64): "), |s| fields::parse("z", "f64", s))?;
        let name = self.ask(&format!("{prefix}Name (String): "), |s| {
            fields::non_empty("name", s)
        })?;
        Ok(Location::new(x, y, z, name)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn answers(lines: &[&str]) -> Cursor<Vec<u8>> {
        Cursor::new(lines.iter().map(|l| format!("{l}\n")).collect::<String>().into_bytes())
    }

    #[test]
    fn asks_again_after_bad_answer() {
        let mut input = answers(&[
            "", "Ring", "900", "abc", "700", "1.5", "1", "2", "3", "A", "4", "5", "6", "B", "1", "",
        ]);
        let mut output = Vec::new();

        let route = Prompt::new(&mut input, &mut output).new_route().unwrap();
        let route = route.with_id(crate::collection::RouteId::new(1));
        assert_eq!(route.name(), "Ring");
        assert_eq!(route.coordinates().x(), 700.0);
        assert_eq!(route.from().name(), "A");
        assert_eq!(route.to().z(), 6.0);
        assert_eq!(route.distance(), None);
        assert_eq!(route.creation_date().timestamp_subsec_nanos(), 0);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("error: Name must not be empty"));
        assert!(shown.contains("error: coordinates.x must be at most 750, got 900"));
        assert!(shown.contains("error: invalid f64 for CoordinateX: \"abc\""));
        assert!(shown.contains("error: distance must be greater than 1, got 1"));
    }

    #[test]
    fn eof_cancels_the_route() {
        let mut input = answers(&["Ring", "10"]);
        let mut output = Vec::new();
        let err = Prompt::new(&mut input, &mut output).new_route().unwrap_err();
        assert!(err.to_string().contains("CoordinateY"));
    }

    #[test]
    fn line_strips_terminator() {
        let mut input = Cursor::new(b"hello world\r\n".to_vec());
        let mut output = Vec::new();
        let mut prompt = Prompt::new(&mut input, &mut output);
        assert_eq!(prompt.line("> ").unwrap().as_deref(), Some("hello world"));
        assert_eq!(prompt.line("> ").unwrap(), None);
    }
}
