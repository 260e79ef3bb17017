// Error types for the composition pipeline.
//
// Three failure categories come out of the core: a bar (or sample budget)
// that cannot accept another note, a probability distribution with nothing
// to draw from, and lookups into empty bars. Document and I/O errors cover
// the rhythm-element loading path. There are no retries anywhere — every
// recoverable ambiguity is resolved by an explicit fallback rule at the
// call site, and everything else terminates the run.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A note or sample would not fit the remaining capacity of a bar,
    /// or nothing in the template/sample pool fits at all.
    #[error("bar capacity exceeded: {0}")]
    Capacity(String),

    /// A weighted draw was attempted over no candidates (or candidates
    /// whose weights sum to zero, which is the same thing).
    #[error("empty probability distribution: {0}")]
    EmptyDistribution(String),

    /// A tone or note lookup into a bar with no matching entries.
    #[error("not found: {0}")]
    NotFound(String),

    /// The rhythm-element document is structurally valid JSON but
    /// references something that does not exist or cannot be used.
    #[error("malformed rhythm document: {0}")]
    Document(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
