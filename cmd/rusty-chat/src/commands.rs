//! Parsing of terminal input lines into session commands.

use domains::{Gender, IdentityId};

pub const HELP: &str = "\
commands:
  /login <name> <age> <male|female|other>   create your anonymous identity
  /search                                   look for a random partner
  /stop                                     cancel the search
  /disconnect                               leave the current chat
  /block                                    block the current partner
  /unblock <id>                             unblock someone
  /blocked                                  list blocked ids
  /emoji <index|emoji>                      send an emoji (no argument lists the palette)
  /photo <path>                             share a photo
  /status                                   dump the session as JSON
  /link                                     show the platform link
  /logout                                   forget your identity
  /quit                                     leave
anything else is sent as a message";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { name: String, age: u32, gender: Gender },
    Search,
    Stop,
    Disconnect,
    Block,
    Unblock(IdentityId),
    Blocked,
    Palette,
    Emoji(EmojiChoice),
    Photo(String),
    Status,
    Link,
    Logout,
    Quit,
    Help,
    Say(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmojiChoice {
    Index(usize),
    Literal(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Empty);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let mut words = rest.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let command = match (verb, args.as_slice()) {
            ("login", [name @ .., age, gender]) if !name.is_empty() => Command::Login {
                name: name.join(" "),
                age: age.parse::<u32>().map_err(|_| format!("`{age}` is not an age"))?,
                gender: gender.parse::<Gender>().map_err(|err| err.to_string())?,
            },
            ("login", _) => return Err("usage: /login <name> <age> <male|female|other>".into()),
            ("search", []) => Command::Search,
            ("stop", []) => Command::Stop,
            ("disconnect", []) => Command::Disconnect,
            ("block", []) => Command::Block,
            ("unblock", [id]) => Command::Unblock(
                id.parse::<IdentityId>().map_err(|_| format!("`{id}` is not a user id"))?,
            ),
            ("blocked", []) => Command::Blocked,
            ("emoji", []) => Command::Palette,
            ("emoji", [choice]) => Command::Emoji(match choice.parse::<usize>() {
                Ok(index) => EmojiChoice::Index(index),
                Err(_) => EmojiChoice::Literal(choice.to_string()),
            }),
            ("photo", [_, ..]) => Command::Photo(args.join(" ")),
            ("status", []) => Command::Status,
            ("link", []) => Command::Link,
            ("logout", []) => Command::Logout,
            ("quit" | "exit", []) => Command::Quit,
            ("help", _) => Command::Help,
            (verb, _) => return Err(format!("unknown command `/{verb}`, try /help")),
        };
        Ok(command)
    }
}
