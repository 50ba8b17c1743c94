use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The proxy answered with its `{error, details}` envelope.
    #[error("proxy error: {error}")]
    Proxy {
        error: String,
        details: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Malformed(String),

    /// Auth server rejected the request; carries its `message`.
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("no conversation with id {0}")]
    UnknownChat(String),

    #[error("no message with id {0}")]
    UnknownMessage(String),

    #[error("only your own messages can be edited")]
    NotEditable,

    #[error("a reply is still on its way")]
    Busy,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage lock poisoned")]
    Lock,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
