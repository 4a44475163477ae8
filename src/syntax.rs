//! Syntax adapter: a lenient reader for Flow-annotated JavaScript.
//!
//! Only what the extractor consumes gets real structure: top-level statements,
//! export wrappers, type aliases and their annotations. Every other statement
//! is kept as an opaque [`Statement::Other`].
pub mod lexer;
pub mod parser;

pub use parser::parse;

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    TypeAlias(TypeAlias),
    /// `export <declaration>`
    Export(Box<Statement>),
    /// Anything the extractor ignores (imports, classes, code, ...).
    Other,
}

/// `type Name<Params> = Annotation`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub id: Identifier,
    pub type_parameters: Vec<Identifier>,
    pub right: Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Object(ObjectAnnotation),
    /// `Name` or `Name<Args>`; qualified names are joined with `.`.
    Generic {
        id: Identifier,
        type_parameters: Option<Vec<Annotation>>,
    },
    /// `?T`
    Nullable(Box<Annotation>),
    StringLiteral { value: String, raw: String },
    Union(Vec<Annotation>),
    String,
    Number,
    Boolean,
    Any,
    Mixed,
    Void,
    Null,
    NumberLiteral { raw: String },
    BooleanLiteral(bool),
    Function {
        params: Vec<Annotation>,
        returns: Box<Annotation>,
    },
    Tuple(Vec<Annotation>),
    Intersection(Vec<Annotation>),
    Typeof(Identifier),
    /// `*`
    Existential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAnnotation {
    pub properties: Vec<ObjectProperty>,
    /// `{| ... |}`
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: Identifier,
    pub value: Annotation,
    pub optional: bool,
}

/// Syntactic kind of an [`Annotation`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Object,
    Generic,
    Nullable,
    StringLiteral,
    Union,
    String,
    Number,
    Boolean,
    Any,
    Mixed,
    Void,
    Null,
    NumberLiteral,
    BooleanLiteral,
    Function,
    Tuple,
    Intersection,
    Typeof,
    Existential,
}

impl AnnotationKind {
    /// The node type name conventionally used by Flow syntax trees.
    pub fn token(self) -> &'static str {
        match self {
            AnnotationKind::Object => "ObjectTypeAnnotation",
            AnnotationKind::Generic => "GenericTypeAnnotation",
            AnnotationKind::Nullable => "NullableTypeAnnotation",
            AnnotationKind::StringLiteral => "StringLiteralTypeAnnotation",
            AnnotationKind::Union => "UnionTypeAnnotation",
            AnnotationKind::String => "StringTypeAnnotation",
            AnnotationKind::Number => "NumberTypeAnnotation",
            AnnotationKind::Boolean => "BooleanTypeAnnotation",
            AnnotationKind::Any => "AnyTypeAnnotation",
            AnnotationKind::Mixed => "MixedTypeAnnotation",
            AnnotationKind::Void => "VoidTypeAnnotation",
            AnnotationKind::Null => "NullLiteralTypeAnnotation",
            AnnotationKind::NumberLiteral => "NumberLiteralTypeAnnotation",
            AnnotationKind::BooleanLiteral => "BooleanLiteralTypeAnnotation",
            AnnotationKind::Function => "FunctionTypeAnnotation",
            AnnotationKind::Tuple => "TupleTypeAnnotation",
            AnnotationKind::Intersection => "IntersectionTypeAnnotation",
            AnnotationKind::Typeof => "TypeofTypeAnnotation",
            AnnotationKind::Existential => "ExistsTypeAnnotation",
        }
    }
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Object(_) => AnnotationKind::Object,
            Annotation::Generic { .. } => AnnotationKind::Generic,
            Annotation::Nullable(_) => AnnotationKind::Nullable,
            Annotation::StringLiteral { .. } => AnnotationKind::StringLiteral,
            Annotation::Union(_) => AnnotationKind::Union,
            Annotation::String => AnnotationKind::String,
            Annotation::Number => AnnotationKind::Number,
            Annotation::Boolean => AnnotationKind::Boolean,
            Annotation::Any => AnnotationKind::Any,
            Annotation::Mixed => AnnotationKind::Mixed,
            Annotation::Void => AnnotationKind::Void,
            Annotation::Null => AnnotationKind::Null,
            Annotation::NumberLiteral { .. } => AnnotationKind::NumberLiteral,
            Annotation::BooleanLiteral(_) => AnnotationKind::BooleanLiteral,
            Annotation::Function { .. } => AnnotationKind::Function,
            Annotation::Tuple(_) => AnnotationKind::Tuple,
            Annotation::Intersection(_) => AnnotationKind::Intersection,
            Annotation::Typeof(_) => AnnotationKind::Typeof,
            Annotation::Existential => AnnotationKind::Existential,
        }
    }

    #[cfg(test)]
    pub(crate) fn named(name: impl Into<String>) -> Self {
        Annotation::Generic { id: Identifier::new(name), type_parameters: None }
    }
}
