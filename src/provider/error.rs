#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("The provider `{provider}` is not supported.")]
    UnsupportedProvider { provider: String },

    #[error("No provider is registered.")]
    NoProviders,

    #[error("Failed to read providers directory `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
