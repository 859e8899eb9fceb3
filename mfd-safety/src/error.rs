use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed construction input; fatal, no recovery.
    #[error("invalid graph {id}: {reason}")]
    InvalidGraph { id: String, reason: String },
    /// Malformed row in the input file.
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    /// The antichain network has no feasible flow.
    #[error("graph {id}: {source}")]
    Infeasible {
        id: String,
        #[source]
        source: mcflow::Infeasible,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
