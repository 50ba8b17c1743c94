/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    New,
    List,
    Select(String),
    Rename(String),
    Delete(Option<String>),
    Edit { position: usize, text: String },
    Model(Option<String>),
    Temp,
    Attach(String),
    Detach(usize),
    Mic,
    Home,
    Like,
    Dislike,
    Help,
    Quit,
    /// Recognised command with bad arguments; carries its usage line.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /new                  Start a new conversation
  /list                 Show conversations grouped by date
  /select <n|id>        Open a conversation
  /rename <title>       Rename the open conversation
  /delete [n|id]        Delete a conversation (default: the open one)
  /edit <n> <text>      Edit your n-th message in place (not resent)
  /model [name|n]       Show or pick the model
  /temp                 Toggle temporary chat (not saved)
  /attach <path>        Attach a file to the next message
  /detach <n>           Drop a queued attachment
  /mic                  Toggle dictation
  /like, /dislike       Rate the last reply
  /home                 Leave the open conversation
  /help                 Show this help
  quit                  Exit";

/// Trims only to recognise commands; message text keeps its indentation.
pub fn parse(line: &str) -> Command {
    let raw = line.trim_end_matches(['\n', '\r']);
    let line = raw.trim();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Command::Quit;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message(raw.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let arg_opt = (!arg.is_empty()).then(|| arg.to_string());

    match name.to_ascii_lowercase().as_str() {
        "new" => Command::New,
        "list" | "chats" => Command::List,
        "select" | "open" => match arg_opt {
            Some(target) => Command::Select(target),
            None => Command::Usage("/select <n|id>"),
        },
        "rename" => match arg_opt {
            Some(title) => Command::Rename(title),
            None => Command::Usage("/rename <title>"),
        },
        "delete" => Command::Delete(arg_opt),
        "edit" => parse_edit(arg),
        "model" => Command::Model(arg_opt),
        "temp" | "temporary" => Command::Temp,
        "attach" => match arg_opt {
            Some(path) => Command::Attach(path),
            None => Command::Usage("/attach <path>"),
        },
        "detach" => match arg.parse::<usize>() {
            Ok(n) => Command::Detach(n),
            Err(_) => Command::Usage("/detach <n>"),
        },
        "mic" | "dictate" => Command::Mic,
        "home" => Command::Home,
        "like" => Command::Like,
        "dislike" => Command::Dislike,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn parse_edit(arg: &str) -> Command {
    let usage = Command::Usage("/edit <n> <text>");
    let Some((n, text)) = arg.split_once(char::is_whitespace) else {
        return usage;
    };
    match (n.parse::<usize>(), text.trim()) {
        (Ok(position), text) if !text.is_empty() => Command::Edit {
            position,
            text: text.to_string(),
        },
        _ => usage,
    }
}
