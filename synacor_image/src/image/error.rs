use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open program image {path:?}: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read program image {path:?}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program image has a trailing odd byte, images must contain whole 16-bit words")]
    TrailingByte,

    #[error("program image is {word_count} words, but memory only addresses 32768 words")]
    TooLarge { word_count: usize },
}
