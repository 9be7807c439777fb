//! The logged-in account.

use std::fmt;

use serde_json::Value;

use super::{Author, ResourceError};
use crate::session::Session;

/// Profile of the account the session cookies belong to.
#[derive(Clone)]
pub struct Me {
    /// Profile page URL.
    pub url: String,
    /// Display name.
    pub name: String,
    /// One-line bio.
    pub motto: String,
    /// Avatar image URL.
    pub photo: String,
    session: Session,
}

impl fmt::Debug for Me {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Me")
            .field("url", &self.url)
            .field("name", &self.name)
            .field("motto", &self.motto)
            .field("photo", &self.photo)
            .finish_non_exhaustive()
    }
}

impl Me {
    /// Builds the profile from the column site's `/api/me` payload.
    ///
    /// The avatar comes as a template (`https://pic.../{id}_{size}.jpg`)
    /// filled with the avatar id and the `r` size.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingField`] naming the first absent field.
    pub fn from_profile(profile: &Value, session: Session) -> Result<Self, ResourceError> {
        let url = string_field(profile, "profileUrl", "profileUrl")?;
        let name = string_field(profile, "name", "name")?;
        // An empty bio comes back as null
        let motto = profile
            .get("bio")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let avatar = profile
            .get("avatar")
            .ok_or(ResourceError::MissingField { field: "avatar" })?;
        let template = string_field(avatar, "template", "avatar.template")?;
        let avatar_id = string_field(avatar, "id", "avatar.id")?;
        let photo = template.replace("{id}", &avatar_id).replace("{size}", "r");

        Ok(Self {
            url,
            name,
            motto,
            photo,
            session,
        })
    }

    /// The account's public profile as an [`Author`] wrapper.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidUrl`] when the profile URL is not a
    /// people page.
    pub fn as_author(&self) -> Result<Author, ResourceError> {
        Author::new(&self.url, self.session.clone())
    }
}

fn string_field(value: &Value, key: &str, field: &'static str) -> Result<String, ResourceError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ResourceError::MissingField { field })
}
