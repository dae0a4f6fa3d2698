use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::user_metadata::{MetadataPatch, UserMetadata};

pub const MAX_DJ_NAME_LENGTH: usize = 50;
pub const MAX_BIO_LENGTH: usize = 500;

/// The public face of a DJ shown on the attendee page.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DjProfile {
    pub dj_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub social_links: Option<Value>,
}

impl From<&UserMetadata> for DjProfile {
    fn from(metadata: &UserMetadata) -> Self {
        Self {
            dj_name: metadata.dj_name.clone(),
            avatar_url: metadata.avatar_url.clone(),
            bio: metadata.bio.clone(),
            social_links: metadata.social_links.clone(),
        }
    }
}

/// Absent fields stay untouched; an empty string removes the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileModel {
    #[serde(default)]
    pub dj_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub social_links: Option<Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("DJ name must be at most 50 characters")]
    DjNameTooLong,
    #[error("bio must be at most 500 characters")]
    BioTooLong,
    #[error("avatar URL must be an http or https URL")]
    InvalidAvatarUrl,
    #[error("social links must be an object")]
    InvalidSocialLinks,
    #[error("nothing to update")]
    Empty,
}

impl UpdateProfileModel {
    pub fn to_patch(&self) -> Result<MetadataPatch, ProfileError> {
        let mut patch = MetadataPatch::new();

        if let Some(name) = &self.dj_name {
            let name = name.trim();
            if name.chars().count() > MAX_DJ_NAME_LENGTH {
                return Err(ProfileError::DjNameTooLong);
            }
            patch = set_or_clear(patch, "dj_name", name);
        }

        if let Some(bio) = &self.bio {
            let bio = bio.trim();
            if bio.chars().count() > MAX_BIO_LENGTH {
                return Err(ProfileError::BioTooLong);
            }
            patch = set_or_clear(patch, "bio", bio);
        }

        if let Some(avatar_url) = &self.avatar_url {
            let avatar_url = avatar_url.trim();
            if !avatar_url.is_empty() && !is_http_url(avatar_url) {
                return Err(ProfileError::InvalidAvatarUrl);
            }
            patch = set_or_clear(patch, "avatar_url", avatar_url);
        }

        match &self.social_links {
            None => {}
            Some(Value::Object(links)) if links.is_empty() => patch = patch.clear("social_links"),
            Some(links @ Value::Object(_)) => patch = patch.set("social_links", links.clone()),
            Some(_) => return Err(ProfileError::InvalidSocialLinks),
        }

        if patch.is_empty() {
            return Err(ProfileError::Empty);
        }
        Ok(patch)
    }
}

fn set_or_clear(patch: MetadataPatch, key: &str, value: &str) -> MetadataPatch {
    if value.is_empty() {
        patch.clear(key)
    } else {
        patch.set(key, value)
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
