use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::model::ExecutionBlockType;

/// Location of a value in a config tree, e.g.
/// `workflow[1].step[2].execution_block_configuration`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Field(Cow<'static, str>),
    Index(usize),
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, name: impl Into<Cow<'static, str>>) -> Self {
        let mut next = self.clone();
        next.0.push(Segment::Field(name.into()));
        next
    }

    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(Segment::Index(index));
        next
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Errors raised while expanding a config tree into a plan.
///
/// Every variant names the offending path. None of them are transient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpandError {
    #[error("{path}: {message}")]
    Shape { path: FieldPath, message: String },

    #[error("{path}: required field is missing")]
    MissingRequiredField { path: FieldPath },

    #[error("{path}: step '{step}' populates more than one execution block ({})", .slots.join(", "))]
    AmbiguousUnion {
        path: FieldPath,
        step: String,
        slots: Vec<&'static str>,
    },

    #[error("{path}: a parallel step may only run ManualApproval or CustomActionLambda, found {block}")]
    UnsupportedNesting {
        path: FieldPath,
        block: ExecutionBlockType,
    },

    #[error("{path}: duplicate key '{key}'")]
    DuplicateKey { path: FieldPath, key: String },

    #[error("{path}: {message}")]
    DomainInvariantViolation { path: FieldPath, message: String },
}

/// Variant of an [`ExpandError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandErrorKind {
    Shape,
    MissingRequiredField,
    AmbiguousUnion,
    UnsupportedNesting,
    DuplicateKey,
    DomainInvariantViolation,
}

impl ExpandError {
    pub fn shape(path: FieldPath, message: impl Into<String>) -> Self {
        Self::Shape {
            path,
            message: message.into(),
        }
    }

    pub fn missing(path: FieldPath) -> Self {
        Self::MissingRequiredField { path }
    }

    pub fn invariant(path: FieldPath, message: impl Into<String>) -> Self {
        Self::DomainInvariantViolation {
            path,
            message: message.into(),
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Shape { path, .. }
            | Self::MissingRequiredField { path }
            | Self::AmbiguousUnion { path, .. }
            | Self::UnsupportedNesting { path, .. }
            | Self::DuplicateKey { path, .. }
            | Self::DomainInvariantViolation { path, .. } => path,
        }
    }

    pub fn kind(&self) -> ExpandErrorKind {
        match self {
            Self::Shape { .. } => ExpandErrorKind::Shape,
            Self::MissingRequiredField { .. } => ExpandErrorKind::MissingRequiredField,
            Self::AmbiguousUnion { .. } => ExpandErrorKind::AmbiguousUnion,
            Self::UnsupportedNesting { .. } => ExpandErrorKind::UnsupportedNesting,
            Self::DuplicateKey { .. } => ExpandErrorKind::DuplicateKey,
            Self::DomainInvariantViolation { .. } => ExpandErrorKind::DomainInvariantViolation,
        }
    }
}
