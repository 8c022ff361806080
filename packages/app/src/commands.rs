//! Line commands understood by the terminal adapter.

use boxtag_core::{AssignmentRequest, CoreSize, HoleFilter, Length, ManualEntry, PhotoKey, ValidationError};

pub const HELP: &str = "\
commands:
  submit <hole> <top> <bottom> <box> <photo> [half|whole]   queue a photo for assignment
  add <hole> <top> <bottom> <box> [half|whole]              save a record without a photo
  cancel                                                    withdraw the box counting down
  skip                                                      commit the box counting down now
  status                                                    show the countdown and queue
  list [hole|all]                                           list saved records
  holes                                                     list hole ids
  photos                                                    list photos
  delete <hole> <top>                                       delete records at a top length
  help                                                      show this help
  quit                                                      exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(AssignmentRequest),
    Add(ManualEntry),
    Cancel,
    Skip,
    Status,
    List(HoleFilter),
    Holes,
    Photos,
    Delete { hole_id: String, top_length: Length },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

fn core_size(arg: Option<&str>) -> Result<CoreSize, ValidationError> {
    arg.map(str::parse::<CoreSize>).transpose().map(Option::unwrap_or_default)
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, rest)) = args.split_first() else {
            return Ok(None);
        };

        let command = match (name.to_ascii_lowercase().as_str(), rest) {
            ("submit", [hole, top, bottom, box_id, photo, size @ ..]) if size.len() <= 1 => {
                Command::Submit(AssignmentRequest {
                    hole_id: hole.to_string(),
                    top_length: top.to_string(),
                    bottom_length: bottom.to_string(),
                    box_id: box_id.to_string(),
                    core_size: core_size(size.first().copied())?,
                    source: Some(PhotoKey::new(*photo)),
                })
            }
            ("submit", _) => {
                return Err(CommandError::Usage(
                    "submit <hole> <top> <bottom> <box> <photo> [half|whole]",
                ));
            }
            ("add", [hole, top, bottom, box_id, size @ ..]) if size.len() <= 1 => {
                Command::Add(ManualEntry {
                    hole_id: hole.to_string(),
                    top_length: top.to_string(),
                    bottom_length: bottom.to_string(),
                    box_id: box_id.to_string(),
                    core_size: size.first().copied().unwrap_or("half").to_string(),
                })
            }
            ("add", _) => {
                return Err(CommandError::Usage("add <hole> <top> <bottom> <box> [half|whole]"));
            }
            ("cancel", []) => Command::Cancel,
            ("skip", []) => Command::Skip,
            ("status", []) => Command::Status,
            ("list", []) => Command::List(HoleFilter::All),
            ("list", [hole]) => Command::List(HoleFilter::parse(hole)),
            ("holes", []) => Command::Holes,
            ("photos", []) => Command::Photos,
            ("delete", [hole, top]) => Command::Delete {
                hole_id: hole.to_string(),
                top_length: Length::parse("top_length", top)?,
            },
            ("delete", _) => return Err(CommandError::Usage("delete <hole> <top>")),
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[test]
    fn parses_submit_with_default_size() {
        let cmd = Command::parse("submit H1 0 1.5 3 IMG_0001.jpg").unwrap().unwrap();
        let Command::Submit(request) = cmd else {
            panic!("expected submit");
        };
        assert_eq!(request.hole_id, "H1");
        assert_eq!(request.bottom_length, "1.5");
        assert_eq!(request.core_size, CoreSize::HalfCore);
        assert_eq!(request.source, Some(PhotoKey::new("IMG_0001.jpg")));
    }

    #[test]
    fn parses_submit_with_whole_core() {
        let cmd = Command::parse("SUBMIT H1 0 1.5 3 IMG_0001.jpg whole").unwrap().unwrap();
        assert!(matches!(cmd, Command::Submit(r) if r.core_size == CoreSize::WholeCore));
    }

    #[test]
    fn rejects_bad_core_size() {
        let err = Command::parse("submit H1 0 1.5 3 IMG_0001.jpg quarter").unwrap_err();
        assert!(matches!(err, CommandError::Invalid(ValidationError::InvalidCoreSize(_))));
    }

    #[test]
    fn short_submit_shows_usage() {
        assert!(matches!(
            Command::parse("submit H1 0 1.5"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn parses_list_filters() {
        assert_eq!(
            Command::parse("list").unwrap(),
            Some(Command::List(HoleFilter::All))
        );
        assert_eq!(
            Command::parse("list All").unwrap(),
            Some(Command::List(HoleFilter::All))
        );
        assert_eq!(
            Command::parse("list H2").unwrap(),
            Some(Command::List(HoleFilter::Hole("H2".into())))
        );
    }

    #[test]
    fn parses_delete_length() {
        assert_eq!(
            Command::parse("delete H1 12.5").unwrap(),
            Some(Command::Delete {
                hole_id: "H1".into(),
                top_length: Length::from_hundredths(1_250),
            })
        );
        assert!(Command::parse("delete H1 twelve").is_err());
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert!(matches!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown(_))
        ));
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Quit));
    }
}
