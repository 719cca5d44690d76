use crate::database::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("Title `{slug}` has not been scraped yet.")]
    UnknownTitle { slug: String },

    #[error("Chapter `{chapter_id}` is not part of title `{slug}`.")]
    UnknownChapter { slug: String, chapter_id: String },

    #[error("List `{slug}` does not exist.")]
    UnknownList { slug: String },

    #[error("List `{slug}` already exists.")]
    DuplicateList { slug: String },

    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),
}
