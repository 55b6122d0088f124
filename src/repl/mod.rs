mod prompt;

use std::{
    io::{BufRead, Write},
    path::PathBuf,
    str::FromStr,
};

use anyhow::{Context, Result, bail, ensure};
use tracing::{info, warn};

use crate::{
    collection::{CollectionManager, NewRoute, RouteId, SortOrder, UpdateOutcome, fields},
    persistence::Persistence,
};

pub use prompt::Prompt;

const HELP: &str = "\
help                            show this list
info                            describe the collection
show                            print every route by id
add                             add a route with the next free id
add_if_max <id>                 add a route with <id> if it is above every id so far
update <id>                     edit fields of a route one at a time
remove_by_id <id>               remove the route with <id>
clear                           remove every route
save                            write the collection to its file
remove_greater <id>             remove every route with an id above <id>
sum_of_distance                 print the total of all distances
print_field_ascending_distance  print distances, smallest first
print_ascending_id              print ids and names, lowest id first
print_descending_id             print ids and names, highest id first
exit                            leave without saving";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Info,
    Show,
    Add,
    AddIfMax(RouteId),
    Update(RouteId),
    RemoveById(RouteId),
    Clear,
    Save,
    RemoveGreater(RouteId),
    SumOfDistance,
    PrintFieldAscendingDistance,
    PrintAscendingId,
    PrintDescendingId,
    Exit,
}

impl Command {
    fn takes_id(self) -> bool {
        matches!(
            self,
            Command::AddIfMax(_)
                | Command::Update(_)
                | Command::RemoveById(_)
                | Command::RemoveGreater(_)
        )
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let name = words.next().context("empty command")?;
        let args: Vec<&str> = words.collect();
        let id = || -> Result<RouteId> {
            match args.as_slice() {
                [id] => id.parse().with_context(|| format!("invalid id: {id}")),
                _ => bail!("{name} expects exactly one id"),
            }
        };

        let command = match name {
            "help" => Command::Help,
            "info" => Command::Info,
            "show" => Command::Show,
            "add" => Command::Add,
            "add_if_max" => Command::AddIfMax(id()?),
            "update" => Command::Update(id()?),
            "remove_by_id" => Command::RemoveById(id()?),
            "clear" => Command::Clear,
            "save" => Command::Save,
            "remove_greater" => Command::RemoveGreater(id()?),
            "sum_of_distance" => Command::SumOfDistance,
            "print_field_ascending_distance" => Command::PrintFieldAscendingDistance,
            "print_ascending_id" => Command::PrintAscendingId,
            "print_descending_id" => Command::PrintDescendingId,
            "exit" => Command::Exit,
            _ => bail!("unknown command: {name} (try `help`)"),
        };
        ensure!(command.takes_id() || args.is_empty(), "{name} takes no arguments");
        Ok(command)
    }
}

/// Reads commands from `input` until `exit` or EOF and applies them to the
/// collection. Every failure is reported on `output` and the session goes on.
pub struct Repl<P, R, W> {
    manager: CollectionManager,
    persistence: P,
    path: PathBuf,
    input: R,
    output: W,
}

impl<P, R, W> Repl<P, R, W>
where
    P: Persistence<Error = anyhow::Error>,
    R: BufRead,
    W: Write,
{
    pub fn new(
        manager: CollectionManager,
        persistence: P,
        path: PathBuf,
        input: R,
        output: W,
    ) -> Self {
        Self {
            manager,
            persistence,
            path,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Type `help` for the list of commands.")?;
        loop {
            let Some(line) = self.prompt().line("> ")? else {
                break;
            };
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(_) if line.trim().is_empty() => continue,
                Err(err) => {
                    writeln!(self.output, "error: {err:#}")?;
                    continue;
                }
            };
            if command == Command::Exit {
                break;
            }
            self.execute(command)?;
        }
        info!("session ended");
        Ok(())
    }

    fn prompt(&mut self) -> Prompt<'_, R, W> {
        Prompt::new(&mut self.input, &mut self.output)
    }

    fn ask_route(&mut self) -> Result<NewRoute> {
        self.prompt().new_route()
    }

    /// Returns an error only when the output itself can no longer be written.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        let out = &mut self.output;
        match command {
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Info => writeln!(out, "{}", self.manager.info())?,
            Command::Show => {
                let routes = self.manager.routes_by_id();
                if routes.is_empty() {
                    writeln!(out, "Collection is empty")?;
                }
                for route in routes {
                    writeln!(out, "{route}")?;
                }
            }
            Command::Add => match self.ask_route() {
                Ok(route) => match self.manager.add(route) {
                    Ok(id) => writeln!(self.output, "Added route with id {id}")?,
                    Err(err) => writeln!(self.output, "error: {err}")?,
                },
                Err(err) => writeln!(self.output, "Route not added: {err:#}")?,
            },
            Command::AddIfMax(id) => match self.ask_route() {
                Ok(route) => {
                    if self.manager.add_if_max(id, route) {
                        writeln!(self.output, "Added route with id {id}")?;
                    } else {
                        writeln!(
                            self.output,
                            "Route not added: id {id} is not above {}",
                            self.manager.max_id()
                        )?;
                    }
                }
                Err(err) => writeln!(self.output, "Route not added: {err:#}")?,
            },
            Command::Update(id) => self.update(id)?,
            Command::RemoveById(id) => {
                if self.manager.remove_by_id(id).is_some() {
                    writeln!(out, "Removed route {id}")?;
                }
            }
            Command::Clear => {
                self.manager.clear();
                writeln!(out, "Collection cleared")?;
            }
            Command::Save => match self.manager.save(&self.persistence, &self.path) {
                Ok(()) => writeln!(
                    out,
                    "Saved {} routes to {}",
                    self.manager.len(),
                    self.path.display()
                )?,
                Err(err) => {
                    warn!("save failed: {err:#}");
                    writeln!(out, "error: could not save: {err:#}")?;
                }
            },
            Command::RemoveGreater(id) => {
                if self.manager.is_empty() {
                    writeln!(out, "Collection is empty")?;
                } else {
                    let removed = self.manager.remove_greater(id);
                    writeln!(out, "Removed {removed} routes")?;
                }
            }
            Command::SumOfDistance => writeln!(out, "{}", self.manager.sum_of_distance())?,
            Command::PrintFieldAscendingDistance => {
                if self.manager.is_empty() {
                    writeln!(out, "Collection is empty")?;
                }
                for distance in self.manager.distances_sorted() {
                    writeln!(out, "{distance}")?;
                }
            }
            Command::PrintAscendingId | Command::PrintDescendingId => {
                let order = if command == Command::PrintAscendingId {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                };
                if self.manager.is_empty() {
                    writeln!(out, "Collection is empty")?;
                }
                for (id, name) in self.manager.id_name_pairs(order) {
                    writeln!(out, "ID: {id}, Name: {name}")?;
                }
            }
            Command::Exit => {}
        }
        Ok(())
    }

    fn update(&mut self, id: RouteId) -> Result<()> {
        if !self.manager.contains_id(id) {
            writeln!(self.output, "Route with id {id} not found")?;
            return Ok(());
        }
        let field_names = self.manager.field_names();
        let mut prompt = Prompt::new(&mut self.input, &mut self.output);
        prompt.say(field_names.trim_end())?;

        loop {
            let Some(field) = prompt.line("field> ")? else {
                break;
            };
            let field = field.trim();
            if fields::is_stop(field) {
                break;
            }
            if fields::lookup(field).is_none() {
                prompt.say(format_args!("Field not recognized: {field}"))?;
                continue;
            }
            let Some(value) = prompt.line("value> ")? else {
                break;
            };
            match self.manager.update(id, field, &value) {
                Ok(UpdateOutcome::Updated) => {
                    prompt.say("Field updated")?;
                    if let Some(route) = self.manager.get(id) {
                        prompt.say(route)?;
                    }
                }
                Ok(UpdateOutcome::Stopped) => break,
                Err(err) => prompt.say(format_args!("error: {err}"))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        collection::{Route, route::sample},
        persistence::CsvFile,
    };

    fn session(ids: &[u32], path: PathBuf, script: &str) -> (CollectionManager, String) {
        let routes = ids
            .iter()
            .map(|&id| sample(&format!("r{id}"), Some(id as i64 * 10)).with_id(RouteId::new(id)));
        let mut repl = Repl::new(
            CollectionManager::new(routes),
            CsvFile,
            path,
            Cursor::new(script.as_bytes().to_vec()),
            Vec::new(),
        );
        repl.run().unwrap();
        let Repl {
            manager, output, ..
        } = repl;
        (manager, String::from_utf8(output).unwrap())
    }

    fn no_file() -> PathBuf {
        PathBuf::from("unused.csv")
    }

    #[test]
    fn parses_commands_and_ids() {
        assert_eq!("info".parse::<Command>().unwrap(), Command::Info);
        assert_eq!(
            "  remove_greater   4 ".parse::<Command>().unwrap(),
            Command::RemoveGreater(RouteId::new(4))
        );
        assert!("update".parse::<Command>().is_err());
        assert!("update x".parse::<Command>().is_err());
        assert!("update 1 2".parse::<Command>().is_err());
        assert!("show all".parse::<Command>().is_err());
        assert!("Show".parse::<Command>().is_err());
    }

    #[test]
    fn listing_commands() {
        let (_, out) = session(
            &[3, 1, 2],
            no_file(),
            "show\nprint_descending_id\nprint_ascending_id\n\
             print_field_ascending_distance\nsum_of_distance\n",
        );
        let first = out.find("#1 r1").unwrap();
        let second = out.find("#2 r2").unwrap();
        assert!(first < second);
        let desc = out.find("ID: 3, Name: r3").unwrap();
        assert!(desc < out.find("ID: 1, Name: r1").unwrap());
        assert!(out.contains("10\n20\n30\n"));
        assert!(out.contains("60\n"));
    }

    #[test]
    fn empty_collection_notices() {
        let (_, out) = session(&[], no_file(), "show\nremove_greater 1\nsum_of_distance\n");
        assert_eq!(out.matches("Collection is empty").count(), 2);
        assert!(out.contains("0\n"));
    }

    #[test]
    fn add_then_update_dialog() {
        let script = "add\nRing\n10\n1\n0\n0\n0\nA\n0\n0\n0\nB\n5\n\
                      update 8\nCoordinateX\n900\nDistance\n1\nColour\nName\nRing road\nstop\n\
                      update 42\nexit\nshow\n";
        let (manager, out) = session(&[7], no_file(), script);

        let route = manager.get(RouteId::new(8)).unwrap();
        assert_eq!(route.name(), "Ring road");
        assert_eq!(route.coordinates().x(), 10.0);
        assert_eq!(route.distance(), Some(5));
        assert!(out.contains("Added route with id 8"));
        assert!(out.contains("Updatable fields:"));
        assert!(out.contains("error: coordinates.x must be at most 750, got 900"));
        assert!(out.contains("error: distance must be greater than 1, got 1"));
        assert!(out.contains("Field not recognized: Colour"));
        assert_eq!(out.matches("Field updated").count(), 1);
        assert!(out.contains("Route with id 42 not found"));
        assert!(!out.contains("#7"));
    }

    #[test]
    fn add_if_max_and_removals() {
        let script = "add_if_max 5\nX\n1\n1\n0\n0\n0\nA\n0\n0\n0\nB\n\n\
                      add_if_max 4\nY\n1\n1\n0\n0\n0\nA\n0\n0\n0\nB\n\n\
                      remove_by_id 1\nremove_by_id 99\nremove_greater 2\n";
        let (manager, out) = session(&[1, 2, 3], no_file(), script);

        assert!(out.contains("Added route with id 5"));
        assert!(out.contains("Route not added: id 4 is not above 5"));
        assert!(out.contains("Removed route 1"));
        assert!(!out.contains("Removed route 99"));
        assert!(out.contains("Removed 2 routes"));
        let ids: Vec<u32> = manager.routes_by_id().iter().map(|r| r.id().get()).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(manager.max_id(), RouteId::new(5));
    }

    #[test]
    fn save_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.csv");
        let script = "clear\nadd\nN\n1\n1\n0\n0\n0\nA\n0\n0\n0\nB\n3\nsave\n";
        let (manager, out) = session(&[1, 2], path.clone(), script);
        assert!(out.contains("Saved 1 routes"));

        let saved: Vec<Route> = CsvFile.load(&path).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id(), RouteId::new(3));
        assert_eq!(saved[0].distance(), Some(3));
        assert_eq!(Some(&saved[0]), manager.get(RouteId::new(3)));
    }

    #[test]
    fn failed_save_keeps_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("routes.csv");
        let (_, out) = session(&[1], path, "save\ninfo\n");
        assert!(out.contains("error: could not save"));
        assert!(out.contains("Number of elements: 1"));
    }

    #[test]
    fn bad_commands_are_reported() {
        let (manager, out) = session(&[1], no_file(), "\nfly\nremove_by_id one\nhelp\n");
        assert!(out.contains("unknown command: fly"));
        assert!(out.contains("invalid id: one"));
        assert!(out.contains("print_descending_id"));
        assert_eq!(manager.len(), 1);
    }
}
