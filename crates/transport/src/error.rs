use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("endpoint '{endpoint}' is not usable as a base URL: {details}"))]
    InvalidEndpoint {
        stage: &'static str,
        endpoint: String,
        details: String,
    },
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("request to {url} failed on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read response body from {url} on `{stage}`: {source}"))]
    ReadBody {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("{url} returned status {status}: {body}"))]
    Status {
        stage: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[snafu(display("unexpected payload from {url} on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        url: String,
        source: serde_json::Error,
    },
}

impl TransportError {
    /// Pipeline stage where the failure happened.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint { stage, .. }
            | Self::BuildClient { stage, .. }
            | Self::Request { stage, .. }
            | Self::ReadBody { stage, .. }
            | Self::Status { stage, .. }
            | Self::Decode { stage, .. } => stage,
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
