pub type Result<T> = core::result::Result<T, DirectoryError>;

/// All possible errors an [`AccountDirectory`] can produce.
///
/// The allocator swallows `Read` errors during a probe (they trigger the
/// timestamp fallback instead); `Write` errors from the final persist are the
/// only ones surfaced to callers.
///
/// [`AccountDirectory`]: crate::AccountDirectory
#[derive(Clone, thiserror::Error, Debug)]
pub enum DirectoryError {
    /// The underlying store could not serve a read.
    #[error("directory read failed: {context}")]
    Read { context: String },

    /// The record could not be written back.
    #[error("directory write failed: {context}")]
    Write { context: String },
}
