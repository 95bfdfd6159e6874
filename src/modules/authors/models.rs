use libris_db::Record;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::utils;

/// A stored author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Opaque identifier, assigned on creation
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated data for a new author.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuthor {
    pub name: String,
    pub bio: Option<String>,
}

/// Fields to change on an existing author. `bio: Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
}

/// Request body of `POST /authors` and `PUT /authors/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorPayload {
    #[serde(default, deserialize_with = "utils::lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "utils::lenient_text")]
    pub bio: Option<String>,
}

impl AuthorPayload {
    /// Both create and replace require a name.
    pub fn validate(self) -> Result<NewAuthor, Vec<String>> {
        match utils::non_blank(self.name) {
            Some(name) => Ok(NewAuthor {
                name,
                bio: utils::non_blank(self.bio),
            }),
            None => Err(vec!["Author name is required".to_string()]),
        }
    }

    pub fn into_patch(self) -> Result<AuthorPatch, Vec<String>> {
        let bio = self.bio.clone();
        let author = self.validate()?;
        Ok(AuthorPatch {
            name: Some(author.name),
            bio,
        })
    }
}

impl Record for Author {
    type Draft = NewAuthor;
    type Patch = AuthorPatch;

    fn create(id: String, at: OffsetDateTime, draft: NewAuthor) -> Self {
        Self {
            id,
            name: draft.name,
            bio: draft.bio,
            created_at: at,
            updated_at: at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: AuthorPatch, at: OffsetDateTime) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(bio) = patch.bio {
            self.bio = utils::non_blank(Some(bio));
        }
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: Option<&str>, bio: Option<&str>) -> AuthorPayload {
        AuthorPayload {
            name: name.map(str::to_string),
            bio: bio.map(str::to_string),
        }
    }

    #[test]
    fn name_is_required_and_trimmed() {
        assert_eq!(
            payload(None, None).validate().unwrap_err(),
            vec!["Author name is required"]
        );
        assert!(payload(Some("  "), None).validate().is_err());

        let author = payload(Some(" Jane Austen "), Some("")).validate().unwrap();
        assert_eq!(author.name, "Jane Austen");
        assert_eq!(author.bio, None);
    }

    #[test]
    fn patch_keeps_bio_when_omitted_and_clears_when_blank() {
        let at = OffsetDateTime::now_utc();
        let mut author = Author::create(
            "a1".into(),
            at,
            NewAuthor {
                name: "Jane".into(),
                bio: Some("Novelist".into()),
            },
        );

        author.apply(payload(Some("Jane A."), None).into_patch().unwrap(), at);
        assert_eq!(author.name, "Jane A.");
        assert_eq!(author.bio.as_deref(), Some("Novelist"));

        author.apply(payload(Some("Jane A."), Some(" ")).into_patch().unwrap(), at);
        assert_eq!(author.bio, None);
    }

    #[test]
    fn serializes_camel_case_without_absent_bio() {
        let at = OffsetDateTime::UNIX_EPOCH;
        let author = Author::create(
            "a1".into(),
            at,
            NewAuthor {
                name: "Jane".into(),
                bio: None,
            },
        );
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert_eq!(json["updatedAt"], json["createdAt"]);
        assert!(json.get("bio").is_none());
    }
}
