/// Request carried by a line submitted from the external command-line UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    SaveAndClose,
    CloseWithoutSaving,
    Unknown(String),
}

impl ExCommand {
    /// Parses the text typed after `:`. A leading `:` is tolerated.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let command = trimmed.strip_prefix(':').unwrap_or(trimmed).trim();
        match command {
            "wq" | "x" => ExCommand::SaveAndClose,
            "q" | "q!" => ExCommand::CloseWithoutSaving,
            other => ExCommand::Unknown(other.to_string()),
        }
    }
}
