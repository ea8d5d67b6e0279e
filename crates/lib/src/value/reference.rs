//! Values that point at things stored elsewhere: other records, relations
//! and uploaded binary assets.

use std::fmt;

/// A pointer to another record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub class_name: String,
    pub object_id: String,
}

impl Reference {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class_name, self.object_id)
    }
}

/// A many-to-many relation to records of `target_class`.
///
/// Membership of the relation lives on the server; locally only the target
/// class is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub target_class: String,
}

impl Relation {
    pub fn new(target_class: impl Into<String>) -> Self {
        Self {
            target_class: target_class.into(),
        }
    }
}

/// A reference to an uploaded binary asset.
///
/// `url` is absent until the upload has completed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub name: String,
    pub url: Option<String>,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Returns true once the asset has a download location
    pub fn is_uploaded(&self) -> bool {
        self.url.is_some()
    }
}
