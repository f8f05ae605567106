//! Parsing of console input

/// What a line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// `quit`, `exit` or `bye`
    Quit,
    Help,
    History,
    Save,
    /// Start a fresh conversation
    Clear,
    /// `load <conversation_id>`; the ID may be empty
    Load(String),
    /// Anything else is sent to the model
    Chat(String),
    /// Blank line
    Empty,
}

impl InputCommand {
    /// Parse one line; command words are case-insensitive
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return InputCommand::Empty;
        }

        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "quit" | "exit" | "bye" => InputCommand::Quit,
            "help" => InputCommand::Help,
            "history" => InputCommand::History,
            "save" => InputCommand::Save,
            "clear" => InputCommand::Clear,
            "load" => InputCommand::Load(String::new()),
            _ => match trimmed.get(..5) {
                Some(prefix) if prefix.eq_ignore_ascii_case("load ") => {
                    InputCommand::Load(trimmed[5..].trim().to_string())
                }
                _ => InputCommand::Chat(trimmed.to_string()),
            },
        }
    }
}

/// Help text shown by the `help` command
pub fn help_text(blog_mode: bool) -> String {
    let mut text = String::from(
        "\nCommands:\n\
         \x20 help              Show this help message\n\
         \x20 history           View conversation history\n\
         \x20 save              Save the conversation\n\
         \x20 clear             Start a new conversation\n\
         \x20 load <id>         Load a saved conversation\n\
         \x20 quit              End the conversation (also: exit, bye)\n",
    );

    if blog_mode {
        text.push_str(
            "\nBlog Writing:\n\
             \x20 Ask me to write a blog about any topic, for example:\n\
             \x20 - \"Write a blog about artificial intelligence\"\n\
             \x20 - \"Blog about climate change\"\n\
             \x20 - \"Create a blog post about healthy eating\"\n\
             \x20 I'll research the topic first, then write the post.\n",
        );
    }

    text
}
