use std::fmt;
use std::io::Read;

/// Where the bytes to compress come from.
pub enum Source {
    Bytes(Vec<u8>),
    /// Streamed to disk during staging without being buffered in memory.
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// One file to compress, as handed over by the caller.
///
/// `name` is untrusted: it is validated and sanitized before it touches the
/// filesystem.
#[derive(Debug)]
pub struct CompressionRequest {
    name: String,
    source: Source,
}

impl CompressionRequest {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: Source::Bytes(bytes.into()),
        }
    }

    pub fn from_reader(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            source: Source::Reader(Box::new(reader)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn into_parts(self) -> (String, Source) {
        (self.name, self.source)
    }
}
