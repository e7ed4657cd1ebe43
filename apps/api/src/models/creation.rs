use serde::{Deserialize, Serialize};

/// What kind of artifact a creation record holds. Blog titles persist as
/// `Article`; title generation is a text capability and shares the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreationKind {
    Article,
    Image,
    ResumeReview,
}

impl CreationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CreationKind::Article => "article",
            CreationKind::Image => "image",
            CreationKind::ResumeReview => "resume-review",
        }
    }
}

/// One row appended to the creations table after a successful generation.
/// `prompt` is the user's prompt for text capabilities and a fixed
/// descriptive string for the media capabilities; `content` is either
/// generated text or an artifact URL. Rows are immutable once written.
#[derive(Debug, Clone)]
pub struct NewCreation {
    pub user_id: String,
    pub prompt: String,
    pub content: String,
    pub kind: CreationKind,
    pub publish: bool,
}
