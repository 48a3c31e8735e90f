use core::fmt;

use crate::Span;

/// Handle to a [`RecordDecl`] stored in a [`Program`](crate::Program).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RecordId(pub(crate) u32);

impl RecordId {
    /// Index of the record in [`Program::records()`](crate::Program::records) order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a scalar value, or of the components of a vector.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// 32-bit signed `int`.
    Int,
    /// 32-bit unsigned `uint`.
    Uint,
    /// 32-bit `float`.
    Float,
}

/// Number of components of a vector, or of columns/rows of a matrix.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum VectorSize {
    /// 2D vector
    Bi = 2,
    /// 3D vector
    Tri = 3,
    /// 4D vector
    Quad = 4,
}

impl VectorSize {
    /// Number of components.
    #[must_use]
    pub const fn len(self) -> usize {
        self as usize
    }

    /// Converts a component count to a [`VectorSize`], if it is 2, 3, or 4.
    #[must_use]
    pub const fn from_len(len: usize) -> Option<Self> {
        match len {
            2 => Some(Self::Bi),
            3 => Some(Self::Tri),
            4 => Some(Self::Quad),
            _ => None,
        }
    }
}

/// Kind of texture a sampler reads from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SamplerKind {
    /// A two-dimensional texture.
    Sampler2D,
    /// A cube map.
    SamplerCube,
}

/// A type which is not a record: the types shader interfaces and uniforms are made of.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LeafType {
    /// A single value.
    Scalar(ScalarKind),
    /// A vector of `size` components of kind `scalar`.
    Vector {
        /// Kind of every component.
        scalar: ScalarKind,
        /// Number of components.
        size: VectorSize,
    },
    /// A matrix of floats, stored column-major.
    Matrix {
        /// Number of columns.
        columns: VectorSize,
        /// Number of rows, which is the size of each column.
        rows: VectorSize,
    },
    /// A handle to a texture and how to sample it. Only ever a shader parameter.
    Sampler(SamplerKind),
}

impl LeafType {
    /// `bool`
    pub const BOOL: Self = Self::Scalar(ScalarKind::Bool);
    /// `int`
    pub const INT: Self = Self::Scalar(ScalarKind::Int);
    /// `uint`
    pub const UINT: Self = Self::Scalar(ScalarKind::Uint);
    /// `float`
    pub const FLOAT: Self = Self::Scalar(ScalarKind::Float);
    /// `vec2`
    pub const VEC2: Self = Self::vec(VectorSize::Bi);
    /// `vec3`
    pub const VEC3: Self = Self::vec(VectorSize::Tri);
    /// `vec4`
    pub const VEC4: Self = Self::vec(VectorSize::Quad);
    /// `mat2`
    pub const MAT2: Self = Self::square(VectorSize::Bi);
    /// `mat3`
    pub const MAT3: Self = Self::square(VectorSize::Tri);
    /// `mat4`
    pub const MAT4: Self = Self::square(VectorSize::Quad);

    /// A float vector of the given size.
    #[must_use]
    pub const fn vec(size: VectorSize) -> Self {
        Self::Vector {
            scalar: ScalarKind::Float,
            size,
        }
    }

    /// A square float matrix of the given size.
    #[must_use]
    pub const fn square(size: VectorSize) -> Self {
        Self::Matrix {
            columns: size,
            rows: size,
        }
    }

    /// The kind of the scalar or of the components, if this is a scalar, vector, or matrix.
    #[must_use]
    pub const fn scalar_kind(self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(scalar) | Self::Vector { scalar, .. } => Some(scalar),
            Self::Matrix { .. } => Some(ScalarKind::Float),
            Self::Sampler(_) => None,
        }
    }

    /// Whether the value is made of `int` or `uint` components.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self.scalar_kind(),
            Some(ScalarKind::Int | ScalarKind::Uint)
        )
    }

    /// Whether the value is made of `uint` components.
    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(self.scalar_kind(), Some(ScalarKind::Uint))
    }

    /// Whether the value is made of `bool` components.
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self.scalar_kind(), Some(ScalarKind::Bool))
    }

    /// Whether this is a matrix whose column and row counts differ.
    #[must_use]
    pub const fn is_non_square_matrix(self) -> bool {
        match self {
            Self::Matrix { columns, rows } => columns as u8 != rows as u8,
            _ => false,
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = |scalar| match scalar {
            ScalarKind::Bool => "b",
            ScalarKind::Int => "i",
            ScalarKind::Uint => "u",
            ScalarKind::Float => "",
        };
        match *self {
            Self::Scalar(ScalarKind::Bool) => write!(f, "bool"),
            Self::Scalar(ScalarKind::Int) => write!(f, "int"),
            Self::Scalar(ScalarKind::Uint) => write!(f, "uint"),
            Self::Scalar(ScalarKind::Float) => write!(f, "float"),
            Self::Vector { scalar, size } => write!(f, "{}vec{}", prefix(scalar), size.len()),
            Self::Matrix { columns, rows } if columns == rows => write!(f, "mat{}", columns.len()),
            Self::Matrix { columns, rows } => write!(f, "mat{}x{}", columns.len(), rows.len()),
            Self::Sampler(SamplerKind::Sampler2D) => write!(f, "sampler2D"),
            Self::Sampler(SamplerKind::SamplerCube) => write!(f, "samplerCube"),
        }
    }
}

/// The type of a value in the source language.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// A scalar, vector, matrix, or sampler.
    Leaf(LeafType),
    /// A record declared in the program.
    Record(RecordId),
}

impl Type {
    /// Returns the leaf type, if this is not a record.
    #[must_use]
    pub const fn as_leaf(self) -> Option<LeafType> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Record(_) => None,
        }
    }
}

impl From<LeafType> for Type {
    fn from(value: LeafType) -> Self {
        Self::Leaf(value)
    }
}

impl From<RecordId> for Type {
    fn from(value: RecordId) -> Self {
        Self::Record(value)
    }
}

/// A record (structure) type declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDecl {
    /// Source-level name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Where the record was declared.
    pub span: Span,
}

/// One field of a [`RecordDecl`].
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Source-level name, unique within the record.
    pub name: String,
    /// Type of the field's value.
    pub ty: Type,
}

impl Field {
    /// A field named `name` of type `ty`.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}
