//! Events produced by the relay.
//!
//! An [`Event`] is one line printed by `acmeevent`, kept as-is.  Callers that
//! want structure can [`parse`](Event::parse) it into an [`EventRecord`].
//!
//! # Line format
//!
//! `acmeevent` prints every event as
//!
//! ```text
//! event C1 C2 q0 q1 eq0 eq1 flag nr text arg loc
//! ```
//!
//! where `text`, `arg` and `loc` are rc-quoted: strings containing spaces
//! or quotes are wrapped in `'…'`, a literal quote is written `''`, and the
//! empty string is `''`.
//!
//! | C1 | Origin                                 |
//! |----|----------------------------------------|
//! | E  | write to the window's body or tag file |
//! | F  | action through some other file         |
//! | K  | keyboard                               |
//! | M  | mouse                                  |
//!
//! C2 is one of `D`/`d` (delete), `I`/`i` (insert), `L`/`l` (look, button
//! 3) or `X`/`x` (execute, button 2); upper case means the body, lower case
//! the tag.

use std::fmt;

/// One decoded event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event(String);

impl Event {
    pub fn new(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    /// The raw line, without its terminator.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Decode the line into its fields.
    pub fn parse(&self) -> Result<EventRecord, EventParseError> {
        self.0.parse()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an event came from (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    FileWrite,
    OtherFile,
    Keyboard,
    Mouse,
}

/// What happened (C2, case folded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Delete,
    Insert,
    Look,
    Execute,
}

/// Which part of the window the event touched (case of C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Body,
    Tag,
}

/// A fully decoded `acmeevent` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub origin: Origin,
    pub action: Action,
    pub area: Area,
    /// Start of the affected range, in runes.
    pub q0: usize,
    /// End of the affected range, in runes.
    pub q1: usize,
    /// Expanded start, for look and execute.
    pub eq0: usize,
    /// Expanded end, for look and execute.
    pub eq1: usize,
    pub flag: u32,
    /// Length of `text` in runes.
    pub nr: usize,
    pub text: String,
    /// Chorded argument for button-2 executes.
    pub arg: String,
    /// Location of the chorded argument.
    pub loc: String,
}

impl EventRecord {
    /// Zero-based line of `q0` within `body`.
    pub fn line_in(&self, body: &str) -> usize {
        body.chars().take(self.q0).filter(|&c| c == '\n').count()
    }
}

/// Selects events by origin, action and area.
///
/// An empty set on any axis accepts everything on that axis, so
/// `EventFilter::default()` matches every event.
///
/// ```
/// use acmectl::event::{Action, Area, EventFilter, Origin};
///
/// // Button-2 and button-3 clicks in the body only.
/// let filter = EventFilter::default()
///     .origin(Origin::Mouse)
///     .action(Action::Execute)
///     .action(Action::Look)
///     .area(Area::Body);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    origins: Vec<Origin>,
    actions: Vec<Action>,
    areas: Vec<Area>,
}

impl EventFilter {
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origins.push(origin);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn area(mut self, area: Area) -> Self {
        self.areas.push(area);
        self
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        fn accepts<T: PartialEq>(set: &[T], value: &T) -> bool {
            set.is_empty() || set.contains(value)
        }
        accepts(&self.origins, &record.origin)
            && accepts(&self.actions, &record.action)
            && accepts(&self.areas, &record.area)
    }
}

/// A line that does not follow the `acmeevent` format.
#[derive(Debug, thiserror::Error)]
#[error("malformed event: {0}")]
pub struct EventParseError(String);

impl std::str::FromStr for EventRecord {
    type Err = EventParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words = split_rc_words(line)?;
        if words.len() != 12 {
            return Err(EventParseError(format!(
                "expected 12 fields, got {} in {:?}",
                words.len(),
                line
            )));
        }
        if words[0] != "event" {
            return Err(EventParseError(format!("missing `event` prefix in {:?}", line)));
        }

        let origin = match single_char(&words[1])? {
            'E' => Origin::FileWrite,
            'F' => Origin::OtherFile,
            'K' => Origin::Keyboard,
            'M' => Origin::Mouse,
            c => return Err(EventParseError(format!("unknown origin {:?}", c))),
        };
        let c2 = single_char(&words[2])?;
        let action = match c2.to_ascii_uppercase() {
            'D' => Action::Delete,
            'I' => Action::Insert,
            'L' => Action::Look,
            'X' => Action::Execute,
            _ => return Err(EventParseError(format!("unknown action {:?}", c2))),
        };
        let area = if c2.is_ascii_uppercase() {
            Area::Body
        } else {
            Area::Tag
        };

        let mut words = words.into_iter().skip(3);
        let mut next = || words.next().unwrap_or_default();
        Ok(EventRecord {
            origin,
            action,
            area,
            q0: number(&next())?,
            q1: number(&next())?,
            eq0: number(&next())?,
            eq1: number(&next())?,
            flag: number(&next())?,
            nr: number(&next())?,
            text: next(),
            arg: next(),
            loc: next(),
        })
    }
}

fn single_char(word: &str) -> Result<char, EventParseError> {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(EventParseError(format!("expected one character, got {:?}", word))),
    }
}

fn number<N: std::str::FromStr>(word: &str) -> Result<N, EventParseError> {
    word.parse()
        .map_err(|_| EventParseError(format!("expected a number, got {:?}", word)))
}

/// Split a line into rc-style words, honouring single quotes.
fn split_rc_words(line: &str) -> Result<Vec<String>, EventParseError> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Ok(words);
        }

        let mut word = String::new();
        let mut quoted = false;
        while let Some(c) = chars.next() {
            match c {
                '\'' if quoted => {
                    if chars.next_if_eq(&'\'').is_some() {
                        word.push('\'');
                    } else {
                        quoted = false;
                    }
                }
                '\'' => quoted = true,
                c if c.is_whitespace() && !quoted => break,
                c => word.push(c),
            }
        }
        if quoted {
            return Err(EventParseError(format!("unterminated quote in {:?}", line)));
        }
        words.push(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keyboard_insert() {
        let rec = Event::new("event K I 10 11 10 11 0 1 x '' ''").parse().unwrap();
        assert_eq!(rec.origin, Origin::Keyboard);
        assert_eq!(rec.action, Action::Insert);
        assert_eq!(rec.area, Area::Body);
        assert_eq!((rec.q0, rec.q1, rec.eq0, rec.eq1), (10, 11, 10, 11));
        assert_eq!(rec.flag, 0);
        assert_eq!(rec.nr, 1);
        assert_eq!(rec.text, "x");
        assert_eq!(rec.arg, "");
        assert_eq!(rec.loc, "");
    }

    #[test]
    fn parse_mouse_execute_in_tag_with_quoted_text() {
        let line = "event M x 4 9 4 9 1 5 'Get it''s' 'a b' ''";
        let rec = Event::new(line).parse().unwrap();
        assert_eq!(rec.origin, Origin::Mouse);
        assert_eq!(rec.action, Action::Execute);
        assert_eq!(rec.area, Area::Tag);
        assert_eq!(rec.flag, 1);
        assert_eq!(rec.text, "Get it's");
        assert_eq!(rec.arg, "a b");
    }

    #[test]
    fn parse_file_write_delete() {
        let rec: EventRecord = "event E D 0 3 0 3 0 0 '' '' ''".parse().unwrap();
        assert_eq!(rec.origin, Origin::FileWrite);
        assert_eq!(rec.action, Action::Delete);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(Event::new("").parse().is_err());
        assert!(Event::new("event K I 1 2").parse().is_err());
        assert!(Event::new("evnt K I 0 1 0 1 0 1 a '' ''").parse().is_err());
        assert!(Event::new("event Q I 0 1 0 1 0 1 a '' ''").parse().is_err());
        assert!(Event::new("event K Z 0 1 0 1 0 1 a '' ''").parse().is_err());
        assert!(Event::new("event K I zero 1 0 1 0 1 a '' ''").parse().is_err());
        assert!(Event::new("event K I 0 1 0 1 0 1 'open '' ''").parse().is_err());
    }

    #[test]
    fn line_in_counts_newlines_before_q0() {
        let rec: EventRecord = "event M L 6 7 6 7 0 1 é '' ''".parse().unwrap();
        let body = "ab\ncd\né\nlast";
        assert_eq!(rec.line_in(body), 2);
        assert_eq!(rec.text, "é");
    }

    #[test]
    fn display_is_the_raw_line() {
        let e = Event::new("event K I 0 1 0 1 0 1 a '' ''");
        assert_eq!(e.to_string(), e.as_str());
        assert_eq!(e.clone().into_inner(), e.as_str());
    }

    #[test]
    fn default_filter_matches_everything() {
        let rec: EventRecord = "event F x 0 0 0 0 0 0 '' '' ''".parse().unwrap();
        assert!(EventFilter::default().matches(&rec));
    }

    #[test]
    fn filter_axes_combine() {
        let typing = EventFilter::default()
            .origin(Origin::Keyboard)
            .action(Action::Insert)
            .action(Action::Delete)
            .area(Area::Body);

        let insert_body: EventRecord = "event K I 0 1 0 1 0 1 a '' ''".parse().unwrap();
        let delete_body: EventRecord = "event K D 0 1 0 1 0 0 '' '' ''".parse().unwrap();
        let insert_tag: EventRecord = "event K i 0 1 0 1 0 1 a '' ''".parse().unwrap();
        let click_body: EventRecord = "event M X 0 3 0 3 0 3 Put '' ''".parse().unwrap();

        assert!(typing.matches(&insert_body));
        assert!(typing.matches(&delete_body));
        assert!(!typing.matches(&insert_tag));
        assert!(!typing.matches(&click_body));
    }
}
