use std::fmt::{Display, Formatter, Result as FmtResult};

/// Unary type constructors the inference engine can build terms from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructorName {
    Vector,
    Iterator,
    Option,
    LockingCell,
    NonLockingCell,
}

impl ConstructorName {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstructorName::Vector => "Vector",
            ConstructorName::Iterator => "Iterator",
            ConstructorName::Option => "Option",
            ConstructorName::LockingCell => "LockingCell",
            ConstructorName::NonLockingCell => "NonLockingCell",
        }
    }
}

/// Predicates a type must satisfy once a constrained type variable becomes concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeConstraint {
    /// The value may be duplicated (fan-out wires, create-copy)
    Copy,
    /// The value can be shown to the user (output nodes)
    Display,
}

impl TypeConstraint {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeConstraint::Copy => "Copy",
            TypeConstraint::Display => "Display",
        }
    }
}

/// A fully rendered data type.
/// This is what the downstream validation and code generation layers see on every port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    // Inference could not resolve this port (an unwired input or an unconstrained generic)
    Unresolved,

    Void,
    Bool,
    Int32,
    Int64,
    String,

    Constructed(ConstructorName, Box<DataType>),

    ImmutableReference(Box<DataType>),
    MutableReference(Box<DataType>),
}

impl DataType {
    pub fn vector(element: DataType) -> DataType {
        DataType::Constructed(ConstructorName::Vector, Box::new(element))
    }

    pub fn iterator(item: DataType) -> DataType {
        DataType::Constructed(ConstructorName::Iterator, Box::new(item))
    }

    pub fn option(inner: DataType) -> DataType {
        DataType::Constructed(ConstructorName::Option, Box::new(inner))
    }

    pub fn reference(mutable: bool, referent: DataType) -> DataType {
        if mutable {
            DataType::MutableReference(Box::new(referent))
        } else {
            DataType::ImmutableReference(Box::new(referent))
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            DataType::ImmutableReference(_) | DataType::MutableReference(_)
        )
    }

    pub fn is_mutable_reference(&self) -> bool {
        matches!(self, DataType::MutableReference(_))
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            DataType::Unresolved => false,
            DataType::Constructed(_, inner)
            | DataType::ImmutableReference(inner)
            | DataType::MutableReference(inner) => inner.is_resolved(),
            _ => true,
        }
    }

    /// The referent of a reference, or the type itself for owned values
    pub fn underlying(&self) -> &DataType {
        match self {
            DataType::ImmutableReference(inner) | DataType::MutableReference(inner) => inner,
            _ => self,
        }
    }

    pub fn satisfies(&self, constraint: TypeConstraint) -> bool {
        match constraint {
            TypeConstraint::Copy => self.is_copyable(),
            TypeConstraint::Display => self.is_displayable(),
        }
    }

    pub fn is_copyable(&self) -> bool {
        match self {
            DataType::Bool | DataType::Int32 | DataType::Int64 | DataType::Void => true,
            DataType::ImmutableReference(_) => true,
            DataType::Constructed(ConstructorName::Option, inner) => inner.is_copyable(),
            _ => false,
        }
    }

    pub fn is_displayable(&self) -> bool {
        match self {
            DataType::Bool | DataType::Int32 | DataType::Int64 | DataType::String => true,
            DataType::ImmutableReference(inner) | DataType::MutableReference(inner) => {
                inner.is_displayable()
            }
            _ => false,
        }
    }

    /// Every constructor this type mentions, outermost first
    pub fn constructors(&self) -> Vec<ConstructorName> {
        let mut names = Vec::new();
        let mut current = self;
        loop {
            match current {
                DataType::Constructed(name, inner) => {
                    names.push(*name);
                    current = inner;
                }
                DataType::ImmutableReference(inner) | DataType::MutableReference(inner) => {
                    current = inner;
                }
                _ => return names,
            }
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DataType::Unresolved => write!(f, "?"),
            DataType::Void => write!(f, "Void"),
            DataType::Bool => write!(f, "Bool"),
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::String => write!(f, "String"),
            DataType::Constructed(name, inner) => write!(f, "{}<{}>", name.as_str(), inner),
            DataType::ImmutableReference(inner) => write!(f, "&{inner}"),
            DataType::MutableReference(inner) => write!(f, "&mut {inner}"),
        }
    }
}
