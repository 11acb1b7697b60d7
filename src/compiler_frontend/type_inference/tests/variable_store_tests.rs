#![cfg(test)]

use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::datatypes::{ConstructorName, DataType};
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;
use crate::compiler_frontend::type_inference::type_variables::TypeVariableStore;
use crate::compiler_frontend::type_inference::unification_result::UnificationOutcome;
use crate::compiler_frontend::type_inference::variables::VariableStore;

#[test]
fn merge_keeps_the_later_variables_attributes() {
    let mut variables = VariableStore::new();
    let earlier = variables.create_new_variable(true);
    let later = variables.create_new_variable(false);
    let later_id = variables.id(later);

    variables.merge(earlier, later);

    assert!(variables.same_variable(earlier, later));
    assert!(!variables.is_mutable(earlier));
    assert_eq!(variables.id(earlier), later_id);
}

#[test]
fn merge_keeps_a_type_term_from_either_side() {
    let mut types = TypeVariableStore::new();
    let mut variables = VariableStore::new();
    let term = types.create_literal(&DataType::Int32);

    let typed = variables.create_typed_variable(false, term);
    let untyped = variables.create_new_variable(false);
    variables.merge(typed, untyped);

    assert_eq!(variables.type_term(untyped).expect("term survives the merge"), term);
}

#[test]
fn type_term_is_write_once() {
    let mut types = TypeVariableStore::new();
    let mut variables = VariableStore::new();
    let variable = variables.create_new_variable(false);

    let error = variables
        .type_term(variable)
        .expect_err("reading an unset term is a contract violation");
    assert_eq!(error.error_type, ErrorType::Compiler);

    let first = types.create_literal(&DataType::Bool);
    let second = types.create_literal(&DataType::Int32);
    variables
        .set_type_term(variable, first)
        .expect("first write succeeds");

    let error = variables
        .set_type_term(variable, second)
        .expect_err("second write must fail");
    assert_eq!(error.error_type, ErrorType::Compiler);
    assert_eq!(variables.type_term(variable).expect("term is set"), first);
}

#[test]
fn resolve_all_renders_every_variable() {
    let mut types = TypeVariableStore::new();
    let mut variables = VariableStore::new();

    let element = types.create_fresh_variable(Vec::new());
    let vector = types.create_constructor(ConstructorName::Vector, element);
    let variable = variables.create_typed_variable(false, vector);
    let untouched = variables.create_new_variable(false);

    let int = types.create_literal(&DataType::Int32);
    let mut outcome = UnificationOutcome::new();
    types.unify(element, int, &mut outcome);

    variables.resolve_all(&mut types);

    let data = variables.get(variable);
    assert_eq!(data.data_type, DataType::vector(DataType::Int32));
    assert_eq!(data.lifetime, Lifetime::Unbounded);
    assert_eq!(variables.get(untouched).data_type, DataType::Unresolved);
}

#[test]
fn interrupted_variables_are_tracked_per_lifetime() {
    let mut variables = VariableStore::new();
    let first = variables.create_new_variable(false);
    let second = variables.create_new_variable(true);

    variables.add_interrupted_variable(Lifetime::Static, first);
    variables.add_interrupted_variable(Lifetime::Static, second);
    variables.add_interrupted_variable(Lifetime::Static, first);

    assert_eq!(variables.interrupted_variables(Lifetime::Static), &[first, second]);
    assert!(variables.interrupted_variables(Lifetime::Empty).is_empty());
    assert_eq!(variables.len(), 2);
}
