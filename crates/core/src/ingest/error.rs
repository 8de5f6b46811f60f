use std::fmt;

/// Failure talking to a proposal source, with the HTTP status when there was one.
#[derive(Debug, Clone)]
pub struct IngestError {
    pub source_name: &'static str,
    pub status: Option<u16>,
    pub detail: String,
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "proposal source error (source={}, status={}): {}",
                self.source_name, status, self.detail
            ),
            None => write!(
                f,
                "proposal source error (source={}): {}",
                self.source_name, self.detail
            ),
        }
    }
}

impl std::error::Error for IngestError {}
