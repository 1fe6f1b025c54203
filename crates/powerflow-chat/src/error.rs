use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no choices")]
    EmptyResponse,

    #[error("MCP error ({server}): {message}")]
    Mcp { server: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// The model kept requesting tools without producing an answer
    #[error("No answer after {0} tool rounds")]
    ToolRounds(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ChatError::Api {
            status: 401,
            body: "invalid api key".into(),
        };
        assert_eq!(err.to_string(), "Model API error (status 401): invalid api key");
        assert_eq!(ChatError::ToolRounds(8).to_string(), "No answer after 8 tool rounds");
        let err = ChatError::Mcp {
            server: "powerflow".into(),
            message: "transport closed".into(),
        };
        assert!(err.to_string().contains("powerflow"));
    }
}
