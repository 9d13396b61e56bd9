//! Field directive parser.
//!
//! A directive is a comma-separated token list attached to a target field:
//!
//! ```text
//! attr
//! hasone,<relationKey>
//! hasone,<relationKey>,<idFieldName>
//! hasmany,<relationKey>
//! hasmany,<relationKey>,<idsFieldName>
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SideloadError};

/// Relation kind, the first directive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// `attr`: plain attribute, filled by the generic decode.
    Attribute,
    /// `hasone`: a single related node.
    HasOne,
    /// `hasmany`: an ordered list of related nodes.
    HasMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Attribute => "attr",
            RelationKind::HasOne => "hasone",
            RelationKind::HasMany => "hasmany",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where relation data lives relative to the local object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationMode<'a> {
    /// Data is nested under the relation key of the local object.
    Embedded,
    /// The local object holds an id (or id list) under `id_field`, resolved
    /// against the top-level collection named by the relation key.
    Referenced { id_field: &'a str },
}

/// Parsed form of a field directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAnnotation {
    pub kind: RelationKind,
    /// Embedded key, or top-level collection name in referenced mode.
    pub relation_key: String,
    /// Id field (`hasone`) or ids field (`hasmany`).
    pub id_field: Option<String>,
}

impl FieldAnnotation {
    /// Parse a directive string.
    ///
    /// # Example
    ///
    /// ```
    /// use json_sideload::{FieldAnnotation, RelationKind, RelationMode};
    ///
    /// let ann = FieldAnnotation::parse("hasone,authors,authorId").unwrap();
    /// assert_eq!(ann.kind, RelationKind::HasOne);
    /// assert_eq!(ann.relation_key, "authors");
    /// assert_eq!(ann.mode(), RelationMode::Referenced { id_field: "authorId" });
    ///
    /// assert!(FieldAnnotation::parse("hasone").is_err());
    /// ```
    pub fn parse(directive: &str) -> Result<Self> {
        Self::parse_tokens(directive)
            .map_err(|reason| SideloadError::bad_annotation(directive, reason))
    }

    /// Parse a directive, returning the rejection reason on failure.
    pub(crate) fn parse_tokens(directive: &str) -> std::result::Result<Self, &'static str> {
        let mut tokens = directive.split(',');
        let kind = match tokens.next().unwrap_or_default() {
            "attr" => RelationKind::Attribute,
            "hasone" => RelationKind::HasOne,
            "hasmany" => RelationKind::HasMany,
            "" => return Err("empty relation kind"),
            _ => return Err("unknown relation kind"),
        };

        // Tokens past the id field are ignored.
        let relation_key = tokens.next();
        let id_field = tokens.next();

        if kind == RelationKind::Attribute {
            return Ok(FieldAnnotation {
                kind,
                relation_key: relation_key.unwrap_or_default().to_string(),
                id_field: None,
            });
        }

        let Some(relation_key) = relation_key else {
            return Err("missing relation key");
        };

        Ok(FieldAnnotation {
            kind,
            relation_key: relation_key.to_string(),
            id_field: id_field.map(str::to_string),
        })
    }

    pub fn mode(&self) -> RelationMode<'_> {
        match &self.id_field {
            Some(id_field) => RelationMode::Referenced { id_field },
            None => RelationMode::Embedded,
        }
    }

    pub fn is_relation(&self) -> bool {
        self.kind != RelationKind::Attribute
    }
}

impl FromStr for FieldAnnotation {
    type Err = SideloadError;

    fn from_str(s: &str) -> Result<Self> {
        FieldAnnotation::parse(s)
    }
}

impl fmt::Display for FieldAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        if self.is_relation() || !self.relation_key.is_empty() {
            write!(f, ",{}", self.relation_key)?;
        }
        if let Some(id_field) = &self.id_field {
            write!(f, ",{}", id_field)?;
        }
        Ok(())
    }
}
