//! Splitting command lines into a name and arguments.

use heapless::Vec;

/// Most arguments any command takes; extra words are ignored.
pub const MAX_ARGS: usize = 8;

/// A command line split on spaces and commas, empty words dropped.
///
/// ```
/// use window_light::command::Command;
///
/// let command = Command::parse("color 1,2,  3 4").expect("not blank");
/// assert_eq!(command.name, "color");
/// assert_eq!(command.args.as_slice(), ["1", "2", "3", "4"]);
/// assert!(Command::parse(" , ").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str, MAX_ARGS>,
}

impl<'a> Command<'a> {
    /// Split `line`; `None` if it holds no words.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut words = words(line);
        let name = words.next()?;
        Some(Self {
            name,
            args: words.take(MAX_ARGS).collect(),
        })
    }
}

/// The non-empty words of `line`, split on spaces and commas.
pub fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split([' ', ',']).filter(|word| !word.is_empty())
}
