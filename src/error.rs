use thiserror::Error;

/// A call whose arguments fall outside the tree.
///
/// The call that produced it has left the tree untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("{op}: index {index} out of range for length {len}")]
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        len: usize,
    },
    #[error("{op}: invalid range {l}..{r} for length {len}")]
    InvalidRange {
        op: &'static str,
        l: usize,
        r: usize,
        len: usize,
    },
    #[error("{op}: negative argument {value}")]
    Negative { op: &'static str, value: i64 },
    #[error("{op}: argument {value} too large")]
    TooLarge { op: &'static str, value: u64 },
}
