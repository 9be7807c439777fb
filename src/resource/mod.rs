//! Typed wrappers around site pages, built by name through the client.
//!
//! # Example
//!
//! ```no_run
//! use zhihu_client::ZhihuClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ZhihuClient::builder().build()?;
//! let answer = client.answer("https://www.zhihu.com/question/24825703/answer/30975949")?;
//! let json = answer.fetch().await?;
//! println!("{}", json["excerpt"]);
//! # Ok(())
//! # }
//! ```

mod kind;
mod me;

pub use kind::ResourceKind;
pub use me::Me;

use std::fmt;

use thiserror::Error;
use tracing::instrument;

use crate::error::ClientError;
use crate::session::Session;

/// Errors raised while building or reading a resource wrapper.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    /// No wrapper exists under this name.
    #[error(
        "unknown resource '{name}'\n  Suggestion: use one of answer, author, collection, column, post, question, topic"
    )]
    UnknownKind {
        /// The name as given.
        name: String,
    },

    /// The URL is not a page of the requested kind.
    #[error("'{url}' is not a {kind} URL")]
    InvalidUrl {
        /// Requested kind.
        kind: ResourceKind,
        /// The URL as given.
        url: String,
    },

    /// A JSON payload lacked a required field.
    #[error("response is missing field '{field}'")]
    MissingField {
        /// Dotted path of the missing field.
        field: &'static str,
    },
}

/// Kind, identifier and session behind every wrapper.
#[derive(Clone)]
pub struct ResourceHandle {
    kind: ResourceKind,
    url: String,
    id: String,
    session: Session,
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl ResourceHandle {
    /// Validates `url` as a page of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidUrl`] on a URL of another shape.
    pub fn new(kind: ResourceKind, url: &str, session: Session) -> Result<Self, ResourceError> {
        let id = kind.parse_id(url)?;
        Ok(Self {
            kind,
            url: url.trim().to_string(),
            id,
            session,
        })
    }

    /// Resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Page URL as given.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Identifier extracted from the URL.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The session requests go through.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// v4 JSON API URL for this resource.
    #[must_use]
    pub fn api_url(&self) -> String {
        self.session
            .endpoints()
            .api_v4(&format!("{}/{}", self.kind.api_collection(), self.id))
    }

    /// Fetches the resource's JSON through the shared session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure, non-2xx status or a
    /// non-JSON body.
    #[instrument(level = "debug", skip(self), fields(kind = %self.kind, id = %self.id))]
    pub async fn fetch(&self) -> Result<serde_json::Value, ClientError> {
        self.session.get_json(&self.api_url()).await
    }
}

macro_rules! resource_wrapper {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(ResourceHandle);

        impl $name {
            /// Wraps a page URL using `session`.
            ///
            /// # Errors
            ///
            /// Returns [`ResourceError::InvalidUrl`] when the URL has another shape.
            pub fn new(url: &str, session: Session) -> Result<Self, ResourceError> {
                ResourceHandle::new($kind, url, session).map(Self)
            }
        }

        impl std::ops::Deref for $name {
            type Target = ResourceHandle;

            fn deref(&self) -> &ResourceHandle {
                &self.0
            }
        }

        impl From<$name> for Resource {
            fn from(value: $name) -> Self {
                Self::$name(value)
            }
        }
    };
}

resource_wrapper!(
    /// An answer to a question.
    Answer,
    ResourceKind::Answer
);
resource_wrapper!(
    /// A user or organization profile.
    Author,
    ResourceKind::Author
);
resource_wrapper!(
    /// A public collection of answers and posts.
    Collection,
    ResourceKind::Collection
);
resource_wrapper!(
    /// A column (zhuanlan).
    Column,
    ResourceKind::Column
);
resource_wrapper!(
    /// A column post (article).
    Post,
    ResourceKind::Post
);
resource_wrapper!(
    /// A question.
    Question,
    ResourceKind::Question
);
resource_wrapper!(
    /// A topic.
    Topic,
    ResourceKind::Topic
);

/// Any wrapper, as returned by name-based lookup.
#[derive(Debug, Clone)]
pub enum Resource {
    /// See [`Answer`].
    Answer(Answer),
    /// See [`Author`].
    Author(Author),
    /// See [`Collection`].
    Collection(Collection),
    /// See [`Column`].
    Column(Column),
    /// See [`Post`].
    Post(Post),
    /// See [`Question`].
    Question(Question),
    /// See [`Topic`].
    Topic(Topic),
}

impl Resource {
    /// Builds the wrapper for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidUrl`] when the URL has another shape.
    pub fn new(kind: ResourceKind, url: &str, session: Session) -> Result<Self, ResourceError> {
        Ok(match kind {
            ResourceKind::Answer => Answer::new(url, session)?.into(),
            ResourceKind::Author => Author::new(url, session)?.into(),
            ResourceKind::Collection => Collection::new(url, session)?.into(),
            ResourceKind::Column => Column::new(url, session)?.into(),
            ResourceKind::Post => Post::new(url, session)?.into(),
            ResourceKind::Question => Question::new(url, session)?.into(),
            ResourceKind::Topic => Topic::new(url, session)?.into(),
        })
    }

    /// The shared handle.
    #[must_use]
    pub fn handle(&self) -> &ResourceHandle {
        match self {
            Self::Answer(inner) => &inner.0,
            Self::Author(inner) => &inner.0,
            Self::Collection(inner) => &inner.0,
            Self::Column(inner) => &inner.0,
            Self::Post(inner) => &inner.0,
            Self::Question(inner) => &inner.0,
            Self::Topic(inner) => &inner.0,
        }
    }

    /// Resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.handle().kind()
    }

    /// Fetches the resource's JSON.
    ///
    /// # Errors
    ///
    /// See [`ResourceHandle::fetch`].
    pub async fn fetch(&self) -> Result<serde_json::Value, ClientError> {
        self.handle().fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Endpoints, HttpTimeouts};

    fn session() -> Session {
        Session::new(Endpoints::default(), HttpTimeouts::default()).unwrap()
    }

    #[test]
    fn test_wrapper_exposes_id_and_api_url() {
        let answer = Answer::new(
            "https://www.zhihu.com/question/24825703/answer/30975949",
            session(),
        )
        .unwrap();
        assert_eq!(answer.id(), "30975949");
        assert_eq!(answer.kind(), ResourceKind::Answer);
        assert_eq!(
            answer.api_url(),
            "https://www.zhihu.com/api/v4/answers/30975949"
        );
    }

    #[test]
    fn test_resource_new_dispatches_on_kind() {
        let resource = Resource::new(
            ResourceKind::Post,
            "https://zhuanlan.zhihu.com/p/20153038",
            session(),
        )
        .unwrap();
        assert!(matches!(resource, Resource::Post(_)));
        assert_eq!(
            resource.handle().api_url(),
            "https://www.zhihu.com/api/v4/articles/20153038"
        );
    }

    #[test]
    fn test_wrapper_rejects_wrong_url() {
        let err = Question::new("https://zhuanlan.zhihu.com/p/1", session()).unwrap_err();
        assert!(err.to_string().contains("is not a question URL"));
    }
}
