//! Error type for the scene crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    /// No drawing surface could be created. Fatal: there is no non-visual mode.
    #[error("render host initialization failed: {0}")]
    HostInit(String),

    #[error("could not read photo {path:?}: {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not fetch photo {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("could not decode photo: {0}")]
    Decode(#[from] image::ImageError),

    /// The controller that owns the photo inbox has shut down.
    #[error("scene is no longer accepting photos")]
    SceneClosed,
}
