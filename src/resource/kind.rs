//! Resource kinds and the page URL shapes they accept.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::ResourceError;

/// Every kind of page the client can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `www.zhihu.com/question/{qid}/answer/{id}`
    Answer,
    /// `www.zhihu.com/people/{token}` or `/org/{token}`
    Author,
    /// `www.zhihu.com/collection/{id}`
    Collection,
    /// `zhuanlan.zhihu.com/{slug}` or `www.zhihu.com/column/{slug}`
    Column,
    /// `zhuanlan.zhihu.com/p/{id}`
    Post,
    /// `www.zhihu.com/question/{id}`
    Question,
    /// `www.zhihu.com/topic/{id}`
    Topic,
}

macro_rules! url_pattern {
    ($name:ident, $pattern:expr) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("resource URL regex is valid")); // Static pattern, safe to panic
    };
}

url_pattern!(
    ANSWER_URL,
    r"^https?://(?:www\.)?zhihu\.com/question/\d+/answer/(\d+)/?(?:[?#].*)?$"
);
url_pattern!(
    AUTHOR_URL,
    r"^https?://(?:www\.)?zhihu\.com/(?:people|org)/([A-Za-z0-9_.\-]+)(?:/[^?#]*)?(?:[?#].*)?$"
);
url_pattern!(
    COLLECTION_URL,
    r"^https?://(?:www\.)?zhihu\.com/collection/(\d+)/?(?:[?#].*)?$"
);
url_pattern!(
    COLUMN_URL,
    r"^https?://(?:zhuanlan\.zhihu\.com|(?:www\.)?zhihu\.com/column)/([A-Za-z0-9_\-]+)/?(?:[?#].*)?$"
);
url_pattern!(
    POST_URL,
    r"^https?://zhuanlan\.zhihu\.com/p/(\d+)/?(?:[?#].*)?$"
);
url_pattern!(
    QUESTION_URL,
    r"^https?://(?:www\.)?zhihu\.com/question/(\d+)/?(?:[?#].*)?$"
);
url_pattern!(
    TOPIC_URL,
    r"^https?://(?:www\.)?zhihu\.com/topic/(\d+)(?:/[^?#]*)?(?:[?#].*)?$"
);

impl ResourceKind {
    /// All kinds, in factory-name order.
    pub const ALL: [Self; 7] = [
        Self::Answer,
        Self::Author,
        Self::Collection,
        Self::Column,
        Self::Post,
        Self::Question,
        Self::Topic,
    ];

    /// Factory name (`answer`, `author`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Author => "author",
            Self::Collection => "collection",
            Self::Column => "column",
            Self::Post => "post",
            Self::Question => "question",
            Self::Topic => "topic",
        }
    }

    /// Collection name in the v4 JSON API.
    #[must_use]
    pub fn api_collection(self) -> &'static str {
        match self {
            Self::Answer => "answers",
            Self::Author => "members",
            Self::Collection => "collections",
            Self::Column => "columns",
            Self::Post => "articles",
            Self::Question => "questions",
            Self::Topic => "topics",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Answer => &ANSWER_URL,
            Self::Author => &AUTHOR_URL,
            Self::Collection => &COLLECTION_URL,
            Self::Column => &COLUMN_URL,
            Self::Post => &POST_URL,
            Self::Question => &QUESTION_URL,
            Self::Topic => &TOPIC_URL,
        }
    }

    /// Extracts the resource identifier from a page URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidUrl`] when the URL is not a page of
    /// this kind.
    pub fn parse_id(self, url: &str) -> Result<String, ResourceError> {
        self.pattern()
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|id| id.as_str().to_string())
            .ok_or_else(|| ResourceError::InvalidUrl {
                kind: self,
                url: url.to_string(),
            })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| ResourceError::UnknownKind {
                name: s.to_string(),
            })
    }
}
