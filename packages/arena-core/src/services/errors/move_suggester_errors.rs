#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggesterError {
    Timeout,
    Transport(String),
    Provider { status: u16, message: String },
    InvalidResponse(String),
    IllegalMove(String),
}

impl std::fmt::Display for SuggesterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggesterError::Timeout => write!(f, "Move suggester timed out"),
            SuggesterError::Transport(msg) => write!(f, "Move suggester unreachable: {}", msg),
            SuggesterError::Provider { status, message } => {
                write!(f, "Move suggester returned {}: {}", status, message)
            }
            SuggesterError::InvalidResponse(msg) => {
                write!(f, "Could not read a move from the suggestion: {}", msg)
            }
            SuggesterError::IllegalMove(msg) => write!(f, "Suggested move is illegal: {}", msg),
        }
    }
}

impl std::error::Error for SuggesterError {}
