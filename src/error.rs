use std::path::PathBuf;
use thiserror::Error;

/// Problems that make it impossible to produce any output at all.
///
/// Everything else the pipeline runs into is logged as a warning and the run
/// carries on with whatever it can still produce.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read home page {}", path.display())]
    UnreadableHomePage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find HTMLHEAD and/or HTMLFOOT comment in {}", path.display())]
    MissingHeadOrFoot { path: PathBuf },

    #[error("No wiki directory given (pass it as an argument or set `wiki` in the settings file)")]
    MissingWikiDirectory,

    #[error("Wiki directory {} does not exist", path.display())]
    WikiDirectoryNotFound { path: PathBuf },

    #[error("Could not read settings file {}", path.display())]
    UnreadableSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse settings file {}", path.display())]
    MalformedSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
