//! Dataflow variables: one per logical value flowing along the wires.
//!
//! Connected ports share a variable through union-find merges. Once inference has run,
//! each variable carries its rendered type, lifetime and mutability.

use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::type_inference::lifetimes::Lifetime;
use crate::compiler_frontend::type_inference::type_variables::{
    TypeVariableRef, TypeVariableStore,
};
use crate::return_compiler_error;
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableRef(pub u32);

impl UnifyKey for VariableRef {
    type Value = VariableData;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        VariableRef(u)
    }

    fn tag() -> &'static str {
        "VariableRef"
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableData {
    pub id: u32,
    pub mutable: bool,
    pub data_type: DataType,
    pub lifetime: Lifetime,
    pub type_term: Option<TypeVariableRef>,
}

impl UnifyValue for VariableData {
    type Error = NoError;

    /// The right-hand (later visited) variable's attributes win
    fn unify_values(left: &Self, right: &Self) -> Result<Self, NoError> {
        Ok(VariableData {
            id: right.id,
            mutable: right.mutable,
            data_type: right.data_type.clone(),
            lifetime: right.lifetime,
            type_term: right.type_term.or(left.type_term),
        })
    }
}

pub struct VariableStore {
    table: InPlaceUnificationTable<VariableRef>,
    all: Vec<VariableRef>,
    interrupted: FxHashMap<Lifetime, Vec<VariableRef>>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    pub fn new() -> Self {
        VariableStore {
            table: InPlaceUnificationTable::new(),
            all: Vec::new(),
            interrupted: FxHashMap::default(),
        }
    }

    pub fn create_new_variable(&mut self, mutable: bool) -> VariableRef {
        let id = self.all.len() as u32;
        let variable = self.table.new_key(VariableData {
            id,
            mutable,
            data_type: DataType::Unresolved,
            lifetime: Lifetime::Empty,
            type_term: None,
        });
        self.all.push(variable);
        variable
    }

    /// Creates a variable and sets its type term in one go
    pub fn create_typed_variable(&mut self, mutable: bool, type_term: TypeVariableRef) -> VariableRef {
        let variable = self.create_new_variable(mutable);
        let mut data = self.table.probe_value(variable);
        data.type_term = Some(type_term);
        self.table.union_value(variable, data);
        variable
    }

    /// Makes two variables one. The attributes of `later` are kept.
    pub fn merge(&mut self, earlier: VariableRef, later: VariableRef) {
        self.table.union(earlier, later);
    }

    pub fn same_variable(&mut self, left: VariableRef, right: VariableRef) -> bool {
        self.table.find(left) == self.table.find(right)
    }

    pub fn get(&mut self, variable: VariableRef) -> VariableData {
        self.table.probe_value(variable)
    }

    /// Stable id of the variable's representative
    pub fn id(&mut self, variable: VariableRef) -> u32 {
        self.get(variable).id
    }

    pub fn is_mutable(&mut self, variable: VariableRef) -> bool {
        self.get(variable).mutable
    }

    pub fn set_mutable(&mut self, variable: VariableRef, mutable: bool) {
        let mut data = self.get(variable);
        data.mutable = mutable;
        self.table.union_value(variable, data);
    }

    pub fn type_term(&mut self, variable: VariableRef) -> Result<TypeVariableRef, CompilerError> {
        match self.get(variable).type_term {
            Some(term) => Ok(term),
            None => return_compiler_error!(
                "Variable v{} was used before its type term was set",
                variable.0
            ),
        }
    }

    /// The type term may only be set once
    pub fn set_type_term(
        &mut self,
        variable: VariableRef,
        term: TypeVariableRef,
    ) -> Result<(), CompilerError> {
        let mut data = self.get(variable);
        if data.type_term.is_some() {
            return_compiler_error!(
                "Type term of variable v{} was set a second time",
                data.id
            );
        }

        data.type_term = Some(term);
        self.table.union_value(variable, data);
        Ok(())
    }

    pub fn set_rendered(&mut self, variable: VariableRef, data_type: DataType, lifetime: Lifetime) {
        let mut data = self.get(variable);
        data.data_type = data_type;
        data.lifetime = lifetime;
        self.table.union_value(variable, data);
    }

    /// Renders every variable's type and lifetime from its type term
    pub fn resolve_all(&mut self, types: &mut TypeVariableStore) {
        for index in 0..self.all.len() {
            let variable = self.all[index];
            if self.table.find(variable) != variable {
                continue;
            }

            let Some(term) = self.get(variable).type_term else {
                continue;
            };

            let data_type = types.render_type(term);
            let lifetime = types.get_lifetime(term);
            self.set_rendered(variable, data_type, lifetime);
        }
    }

    // ============================================================
    // Interrupted variables
    // ============================================================

    /// Records a variable that was borrowed when `lifetime` was opened.
    /// It must not be used again until that lifetime is terminated.
    pub fn add_interrupted_variable(&mut self, lifetime: Lifetime, variable: VariableRef) {
        let entries = self.interrupted.entry(lifetime).or_default();
        if !entries.contains(&variable) {
            entries.push(variable);
        }
    }

    pub fn interrupted_variables(&self, lifetime: Lifetime) -> &[VariableRef] {
        self.interrupted
            .get(&lifetime)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
