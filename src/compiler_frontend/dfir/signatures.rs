//! Declared signatures of functional nodes.
//!
//! A signature may be generic over data types (`Generic`), over the lifetime of its
//! reference parameters, and over reference mutability (`Polymorphic`). Each distinct
//! lifetime among the reference inputs becomes one auto-borrow group during facade
//! construction.

use crate::compiler_frontend::datatypes::{ConstructorName, DataType, TypeConstraint};
use crate::compiler_frontend::dfir::dfir_nodes::Direction;

#[derive(Debug, Clone)]
pub struct NodeSignature {
    pub name: &'static str,
    pub type_params: Vec<GenericTypeParameter>,
    pub parameters: Vec<SignatureParameter>,
}

#[derive(Debug, Clone)]
pub struct GenericTypeParameter {
    pub name: &'static str,
    pub constraints: Vec<TypeConstraint>,
}

#[derive(Debug, Clone)]
pub struct SignatureParameter {
    pub name: &'static str,
    pub direction: Direction,
    pub ty: SignatureType,

    /// For outputs: the index of the input parameter this output hands back.
    /// A paired output is where a borrow taken for that input can be terminated.
    pub pairs_with: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMutability {
    Immutable,
    Mutable,
    /// Mutable only if every input sharing the lifetime is mutable
    Polymorphic,
}

#[derive(Debug, Clone)]
pub enum SignatureType {
    Generic(usize),
    Concrete(DataType),
    Constructor(ConstructorName, Box<SignatureType>),
    Reference {
        mutability: SignatureMutability,
        referent: Box<SignatureType>,
        lifetime: usize,
    },
}

impl SignatureType {
    pub fn generic(index: usize) -> SignatureType {
        SignatureType::Generic(index)
    }

    pub fn concrete(data_type: DataType) -> SignatureType {
        SignatureType::Concrete(data_type)
    }

    pub fn constructed(name: ConstructorName, inner: SignatureType) -> SignatureType {
        SignatureType::Constructor(name, Box::new(inner))
    }

    pub fn reference(
        mutability: SignatureMutability,
        referent: SignatureType,
        lifetime: usize,
    ) -> SignatureType {
        SignatureType::Reference {
            mutability,
            referent: Box::new(referent),
            lifetime,
        }
    }

    pub fn reference_lifetime(&self) -> Option<(usize, SignatureMutability)> {
        match self {
            SignatureType::Reference {
                lifetime,
                mutability,
                ..
            } => Some((*lifetime, *mutability)),
            _ => None,
        }
    }

    pub fn collect_constructors(&self, names: &mut Vec<ConstructorName>) {
        match self {
            SignatureType::Generic(_) => {}
            SignatureType::Concrete(data_type) => names.extend(data_type.constructors()),
            SignatureType::Constructor(name, inner) => {
                names.push(*name);
                inner.collect_constructors(names);
            }
            SignatureType::Reference { referent, .. } => referent.collect_constructors(names),
        }
    }
}

impl SignatureParameter {
    pub fn input(name: &'static str, ty: SignatureType) -> Self {
        SignatureParameter {
            name,
            direction: Direction::Input,
            ty,
            pairs_with: None,
        }
    }

    pub fn output(name: &'static str, ty: SignatureType) -> Self {
        SignatureParameter {
            name,
            direction: Direction::Output,
            ty,
            pairs_with: None,
        }
    }

    pub fn passthrough(name: &'static str, ty: SignatureType, input_index: usize) -> Self {
        SignatureParameter {
            name,
            direction: Direction::Output,
            ty,
            pairs_with: Some(input_index),
        }
    }
}

impl NodeSignature {
    pub fn input_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction == Direction::Input)
            .count()
    }

    pub fn output_count(&self) -> usize {
        self.parameters.len() - self.input_count()
    }

    /// Position of a parameter among the parameters with the same direction.
    /// This is the port index on the node.
    pub fn port_index(&self, parameter_index: usize) -> Option<usize> {
        let direction = self.parameters.get(parameter_index)?.direction;
        Some(
            self.parameters[..parameter_index]
                .iter()
                .filter(|parameter| parameter.direction == direction)
                .count(),
        )
    }
}

// ============================================================
// Built-in signatures
// ============================================================
fn generic(name: &'static str) -> GenericTypeParameter {
    GenericTypeParameter {
        name,
        constraints: Vec::new(),
    }
}

fn constrained(name: &'static str, constraint: TypeConstraint) -> GenericTypeParameter {
    GenericTypeParameter {
        name,
        constraints: vec![constraint],
    }
}

fn immutable_ref(referent: SignatureType, lifetime: usize) -> SignatureType {
    SignatureType::reference(SignatureMutability::Immutable, referent, lifetime)
}

fn mutable_ref(referent: SignatureType, lifetime: usize) -> SignatureType {
    SignatureType::reference(SignatureMutability::Mutable, referent, lifetime)
}

pub fn immutable_passthrough() -> NodeSignature {
    NodeSignature {
        name: "ImmutablePassthrough",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("in", immutable_ref(SignatureType::generic(0), 0)),
            SignatureParameter::passthrough("out", immutable_ref(SignatureType::generic(0), 0), 0),
        ],
    }
}

pub fn mutable_passthrough() -> NodeSignature {
    NodeSignature {
        name: "MutablePassthrough",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("in", mutable_ref(SignatureType::generic(0), 0)),
            SignatureParameter::passthrough("out", mutable_ref(SignatureType::generic(0), 0), 0),
        ],
    }
}

pub fn output() -> NodeSignature {
    NodeSignature {
        name: "Output",
        type_params: vec![constrained("T", TypeConstraint::Display)],
        parameters: vec![SignatureParameter::input(
            "value",
            immutable_ref(SignatureType::generic(0), 0),
        )],
    }
}

pub fn assign() -> NodeSignature {
    NodeSignature {
        name: "Assign",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("target", mutable_ref(SignatureType::generic(0), 0)),
            SignatureParameter::input("value", SignatureType::generic(0)),
            SignatureParameter::passthrough(
                "target out",
                mutable_ref(SignatureType::generic(0), 0),
                0,
            ),
        ],
    }
}

pub fn exchange_values() -> NodeSignature {
    NodeSignature {
        name: "ExchangeValues",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("first", mutable_ref(SignatureType::generic(0), 0)),
            SignatureParameter::input("second", mutable_ref(SignatureType::generic(0), 0)),
            SignatureParameter::passthrough(
                "first out",
                mutable_ref(SignatureType::generic(0), 0),
                0,
            ),
            SignatureParameter::passthrough(
                "second out",
                mutable_ref(SignatureType::generic(0), 0),
                1,
            ),
        ],
    }
}

pub fn create_copy() -> NodeSignature {
    NodeSignature {
        name: "CreateCopy",
        type_params: vec![constrained("T", TypeConstraint::Copy)],
        parameters: vec![
            SignatureParameter::input("original", immutable_ref(SignatureType::generic(0), 0)),
            SignatureParameter::passthrough(
                "original out",
                immutable_ref(SignatureType::generic(0), 0),
                0,
            ),
            SignatureParameter::output("copy", SignatureType::generic(0)),
        ],
    }
}

pub fn add() -> NodeSignature {
    let int = || SignatureType::concrete(DataType::Int32);
    NodeSignature {
        name: "Add",
        type_params: Vec::new(),
        parameters: vec![
            SignatureParameter::input("x", immutable_ref(int(), 0)),
            SignatureParameter::input("y", immutable_ref(int(), 0)),
            SignatureParameter::passthrough("x out", immutable_ref(int(), 0), 0),
            SignatureParameter::passthrough("y out", immutable_ref(int(), 0), 1),
            SignatureParameter::output("sum", int()),
        ],
    }
}

pub fn increment() -> NodeSignature {
    let int = || SignatureType::concrete(DataType::Int32);
    NodeSignature {
        name: "Increment",
        type_params: Vec::new(),
        parameters: vec![
            SignatureParameter::input("value", mutable_ref(int(), 0)),
            SignatureParameter::passthrough("value out", mutable_ref(int(), 0), 0),
        ],
    }
}

pub fn vector_create() -> NodeSignature {
    NodeSignature {
        name: "VectorCreate",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("element", SignatureType::generic(0)),
            SignatureParameter::output(
                "vector",
                SignatureType::constructed(ConstructorName::Vector, SignatureType::generic(0)),
            ),
        ],
    }
}

pub fn vector_append() -> NodeSignature {
    let vector = || SignatureType::constructed(ConstructorName::Vector, SignatureType::generic(0));
    NodeSignature {
        name: "VectorAppend",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("vector", mutable_ref(vector(), 0)),
            SignatureParameter::input("element", SignatureType::generic(0)),
            SignatureParameter::passthrough("vector out", mutable_ref(vector(), 0), 0),
        ],
    }
}

pub fn some_constructor() -> NodeSignature {
    NodeSignature {
        name: "SomeConstructor",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("value", SignatureType::generic(0)),
            SignatureParameter::output(
                "option",
                SignatureType::constructed(ConstructorName::Option, SignatureType::generic(0)),
            ),
        ],
    }
}

pub fn range() -> NodeSignature {
    NodeSignature {
        name: "Range",
        type_params: Vec::new(),
        parameters: vec![
            SignatureParameter::input("low", SignatureType::concrete(DataType::Int32)),
            SignatureParameter::input("high", SignatureType::concrete(DataType::Int32)),
            SignatureParameter::output(
                "range",
                SignatureType::concrete(DataType::iterator(DataType::Int32)),
            ),
        ],
    }
}

pub fn create_locking_cell() -> NodeSignature {
    NodeSignature {
        name: "CreateLockingCell",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("value", SignatureType::generic(0)),
            SignatureParameter::output(
                "cell",
                SignatureType::constructed(ConstructorName::LockingCell, SignatureType::generic(0)),
            ),
        ],
    }
}

pub fn create_non_locking_cell() -> NodeSignature {
    NodeSignature {
        name: "CreateNonLockingCell",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input("value", SignatureType::generic(0)),
            SignatureParameter::output(
                "cell",
                SignatureType::constructed(
                    ConstructorName::NonLockingCell,
                    SignatureType::generic(0),
                ),
            ),
        ],
    }
}

/// Chooses between two references sharing one lifetime.
/// The result is mutable only if both choices were mutable.
pub fn select_reference() -> NodeSignature {
    let choice = || {
        SignatureType::reference(
            SignatureMutability::Polymorphic,
            SignatureType::generic(0),
            1,
        )
    };
    NodeSignature {
        name: "SelectReference",
        type_params: vec![generic("T")],
        parameters: vec![
            SignatureParameter::input(
                "selector",
                immutable_ref(SignatureType::concrete(DataType::Bool), 0),
            ),
            SignatureParameter::input("true value", choice()),
            SignatureParameter::input("false value", choice()),
            SignatureParameter::output("result", choice()),
        ],
    }
}
