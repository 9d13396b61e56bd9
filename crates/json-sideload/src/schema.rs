//! Per-type relation schemas.
//!
//! Every target type implements [`Sideload`], which hands out a [`Schema`]
//! built once per type: an ordered table of relation fields, each pairing a
//! parsed directive with a plain accessor function for the field's storage.

use std::any::type_name;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::annotation::{FieldAnnotation, RelationKind};
use crate::error::{Result, SideloadError};
use crate::resolve::{self, Context};

/// A type that can be populated from a sideloaded document.
///
/// Attribute fields come from the type's [`serde::Deserialize`] impl. Relation
/// fields are listed in [`Sideload::schema`] and should be `#[serde(skip)]`.
/// Most impls are written with [`sideload_schema!`](crate::sideload_schema).
pub trait Sideload: DeserializeOwned + Default + 'static {
    fn schema() -> &'static Schema<Self>;
}

/// Storage shape of a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    /// Absent or a single node: `Option<Box<N>>`.
    One,
    /// Ordered nodes: `Vec<N>`.
    Many,
}

impl SlotShape {
    pub fn accepts(&self, kind: RelationKind) -> bool {
        matches!(
            (self, kind),
            (_, RelationKind::Attribute)
                | (SlotShape::One, RelationKind::HasOne)
                | (SlotShape::Many, RelationKind::HasMany)
        )
    }

    fn describe(&self) -> &'static str {
        match self {
            SlotShape::One => "single-node slot",
            SlotShape::Many => "sequence slot",
        }
    }
}

/// Owning storage for resolved relation nodes.
///
/// Implemented for `Option<Box<N>>` and `Vec<N>`. Boxing the single-node
/// slot keeps self-referencing types sized.
pub trait RelationSlot {
    type Node: Sideload;

    const SHAPE: SlotShape;

    /// Replace the slot contents with `nodes`, keeping their order.
    /// Single-node slots receive at most one node.
    fn fill(&mut self, nodes: Vec<Self::Node>);
}

impl<N: Sideload> RelationSlot for Option<Box<N>> {
    type Node = N;
    const SHAPE: SlotShape = SlotShape::One;

    fn fill(&mut self, nodes: Vec<N>) {
        *self = nodes.into_iter().next().map(Box::new);
    }
}

impl<N: Sideload> RelationSlot for Vec<N> {
    type Node = N;
    const SHAPE: SlotShape = SlotShape::Many;

    fn fill(&mut self, nodes: Vec<N>) {
        *self = nodes;
    }
}

/// Type-erased link between a schema entry and a field of `T`.
trait FieldBinding<T>: Send + Sync {
    fn shape(&self) -> SlotShape;

    fn resolve(
        &self,
        ctx: Context<'_>,
        name: &str,
        annotation: &FieldAnnotation,
        local: &Map<String, Value>,
        target: &mut T,
    ) -> Result<()>;
}

struct SlotBinding<T, S> {
    accessor: fn(&mut T) -> &mut S,
}

impl<T, S> FieldBinding<T> for SlotBinding<T, S>
where
    T: 'static,
    S: RelationSlot + 'static,
{
    fn shape(&self) -> SlotShape {
        S::SHAPE
    }

    fn resolve(
        &self,
        ctx: Context<'_>,
        name: &str,
        annotation: &FieldAnnotation,
        local: &Map<String, Value>,
        target: &mut T,
    ) -> Result<()> {
        resolve::resolve_relation(ctx, name, annotation, local, (self.accessor)(target))
    }
}

/// One declared field of a schema.
pub struct SchemaField<T> {
    name: String,
    directive: String,
    annotation: std::result::Result<FieldAnnotation, &'static str>,
    binding: Option<Box<dyn FieldBinding<T>>>,
}

impl<T> SchemaField<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// The parsed directive, or the parse error it produces during resolution.
    pub fn annotation(&self) -> Result<&FieldAnnotation> {
        self.annotation
            .as_ref()
            .map_err(|reason| SideloadError::bad_annotation(&self.directive, reason))
    }

    pub fn shape(&self) -> Option<SlotShape> {
        self.binding.as_ref().map(|binding| binding.shape())
    }

    fn check_shape(&self, annotation: &FieldAnnotation) -> Result<()> {
        match self.shape() {
            Some(shape) if !shape.accepts(annotation.kind) => Err(SideloadError::type_mismatch(
                self.name.as_str(),
                match annotation.kind {
                    RelationKind::HasMany => SlotShape::Many.describe(),
                    _ => SlotShape::One.describe(),
                },
                shape.describe(),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn resolve(
        &self,
        ctx: Context<'_>,
        local: &Map<String, Value>,
        target: &mut T,
    ) -> Result<()> {
        let annotation = self.annotation()?;
        if !annotation.is_relation() {
            return Ok(());
        }
        self.check_shape(annotation)?;
        match &self.binding {
            Some(binding) => binding.resolve(ctx, &self.name, annotation, local, target),
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for SchemaField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaField")
            .field("name", &self.name)
            .field("directive", &self.directive)
            .field("shape", &self.shape())
            .finish()
    }
}

/// Ordered relation table for a target type.
pub struct Schema<T> {
    fields: Vec<SchemaField<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder { fields: Vec::new() }
    }

    /// A schema with no relation fields.
    pub fn empty() -> Self {
        Schema { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[SchemaField<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every directive and slot shape up front.
    ///
    /// Resolution reports the same errors lazily, at the failing field.
    pub fn validate(&self) -> Result<()> {
        for field in &self.fields {
            let annotation = field.annotation()?;
            if annotation.is_relation() {
                field.check_shape(annotation)?;
            }
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type", &type_name::<T>())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`Schema`]. Fields resolve in the order they are added.
pub struct SchemaBuilder<T> {
    fields: Vec<SchemaField<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Declare a relation field.
    ///
    /// Directive errors are kept and reported when the field is resolved.
    ///
    /// # Example
    ///
    /// ```
    /// use json_sideload::{Schema, Sideload};
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Default, Deserialize)]
    /// struct Author {
    ///     name: String,
    /// }
    ///
    /// impl Sideload for Author {
    ///     fn schema() -> &'static Schema<Self> {
    ///         static SCHEMA: std::sync::OnceLock<Schema<Author>> = std::sync::OnceLock::new();
    ///         SCHEMA.get_or_init(Schema::empty)
    ///     }
    /// }
    ///
    /// #[derive(Debug, Default, Deserialize)]
    /// struct Article {
    ///     title: String,
    ///     #[serde(skip)]
    ///     author: Option<Box<Author>>,
    /// }
    ///
    /// let schema: Schema<Article> = Schema::builder()
    ///     .attr("title")
    ///     .field("author", "hasone,authors,authorId", |a: &mut Article| &mut a.author)
    ///     .build();
    /// assert_eq!(schema.len(), 2);
    /// assert!(schema.validate().is_ok());
    /// ```
    pub fn field<S>(
        mut self,
        name: impl Into<String>,
        directive: impl Into<String>,
        accessor: fn(&mut T) -> &mut S,
    ) -> Self
    where
        S: RelationSlot + 'static,
    {
        let directive = directive.into();
        self.fields.push(SchemaField {
            name: name.into(),
            annotation: FieldAnnotation::parse_tokens(&directive),
            directive,
            binding: Some(Box::new(SlotBinding { accessor })),
        });
        self
    }

    /// Declare a plain attribute. Informational only.
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        let directive = RelationKind::Attribute.as_str().to_string();
        self.fields.push(SchemaField {
            name: name.into(),
            annotation: FieldAnnotation::parse_tokens(&directive),
            directive,
            binding: None,
        });
        self
    }

    pub fn build(self) -> Schema<T> {
        Schema {
            fields: self.fields,
        }
    }
}

/// Implement [`Sideload`] for one or more types, listing their relation fields.
///
/// Each entry maps a field to its directive. The schema is built on first use
/// and shared afterwards.
///
/// ```
/// use json_sideload::sideload_schema;
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// struct Author {
///     name: String,
/// }
///
/// #[derive(Debug, Default, Deserialize)]
/// struct Article {
///     title: String,
///     #[serde(skip)]
///     author: Option<Box<Author>>,
///     #[serde(skip)]
///     coauthors: Vec<Author>,
/// }
///
/// sideload_schema! {
///     Author {}
///     Article {
///         author => "hasone,author",
///         coauthors => "hasmany,authors,coauthorIds",
///     }
/// }
///
/// let article: Article = json_sideload::from_str(
///     r#"{"title": "T", "author": {"name": "Al"}, "coauthorIds": [2],
///         "authors": [{"id": 2, "name": "Bo"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(article.author.unwrap().name, "Al");
/// assert_eq!(article.coauthors[0].name, "Bo");
/// ```
#[macro_export]
macro_rules! sideload_schema {
    ($($ty:ty { $($field:ident => $directive:expr),* $(,)? })*) => {
        $(
            impl $crate::Sideload for $ty {
                fn schema() -> &'static $crate::Schema<Self> {
                    static SCHEMA: ::std::sync::OnceLock<$crate::Schema<$ty>> =
                        ::std::sync::OnceLock::new();
                    SCHEMA.get_or_init(|| {
                        $crate::Schema::<$ty>::builder()
                            $(.field(
                                ::std::stringify!($field),
                                $directive,
                                |node: &mut $ty| &mut node.$field,
                            ))*
                            .build()
                    })
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Leaf {
        name: String,
    }

    #[derive(Debug, Default, Deserialize)]
    struct Node {
        #[serde(skip)]
        one: Option<Box<Leaf>>,
        #[serde(skip)]
        many: Vec<Leaf>,
    }

    crate::sideload_schema! {
        Leaf {}
        Node {
            one => "hasone,leaf",
            many => "hasmany,leaves,leafIds",
        }
    }

    fn leaf(name: &str) -> Leaf {
        Leaf {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_slot_fill() {
        let mut one: Option<Box<Leaf>> = None;
        one.fill(vec![leaf("a")]);
        assert_eq!(one.as_deref(), Some(&leaf("a")));
        one.fill(vec![]);
        assert!(one.is_none());

        let mut many: Vec<Leaf> = vec![leaf("stale")];
        many.fill(vec![leaf("x"), leaf("y")]);
        assert_eq!(many, [leaf("x"), leaf("y")]);
        many.fill(vec![]);
        assert!(many.is_empty());
    }

    #[test]
    fn test_shape_accepts() {
        assert!(SlotShape::One.accepts(RelationKind::HasOne));
        assert!(SlotShape::Many.accepts(RelationKind::HasMany));
        assert!(!SlotShape::One.accepts(RelationKind::HasMany));
        assert!(!SlotShape::Many.accepts(RelationKind::HasOne));
        assert!(SlotShape::Many.accepts(RelationKind::Attribute));
    }

    #[test]
    fn test_macro_schema_is_built_once() {
        let first = Node::schema() as *const Schema<Node>;
        let second = Node::schema() as *const Schema<Node>;
        assert_eq!(first, second);

        let names: Vec<_> = Node::schema().fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["one", "many"]);
        assert_eq!(Node::schema().fields()[1].shape(), Some(SlotShape::Many));
        assert!(Leaf::schema().is_empty());
        assert!(Node::schema().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_bad_directive() {
        let schema: Schema<Node> = Schema::builder()
            .field("one", "hasone", |n: &mut Node| &mut n.one)
            .build();
        assert!(matches!(
            schema.validate(),
            Err(SideloadError::BadAnnotationFormat { .. })
        ));
    }

    #[test]
    fn test_validate_reports_shape_mismatch() {
        let schema: Schema<Node> = Schema::builder()
            .attr("name")
            .field("many", "hasone,leaf", |n: &mut Node| &mut n.many)
            .build();
        match schema.validate() {
            Err(SideloadError::TypeMismatch {
                field,
                expected,
                found,
            }) => {
                assert_eq!(field, "many");
                assert_eq!(expected, "single-node slot");
                assert_eq!(found, "sequence slot");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_lists_fields() {
        let rendered = format!("{:?}", Node::schema());
        assert!(rendered.contains("hasmany,leaves,leafIds"));
    }
}
