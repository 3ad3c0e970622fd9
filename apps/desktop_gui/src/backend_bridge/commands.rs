//! Backend commands queued from UI to backend worker.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Connect,
    Disconnect,
    EditInput(String),
    Submit,
    Refresh,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Connect => "connect",
            BackendCommand::Disconnect => "disconnect",
            BackendCommand::EditInput(_) => "edit_input",
            BackendCommand::Submit => "submit",
            BackendCommand::Refresh => "refresh",
        }
    }
}
