//! Description models
//!
//! The mutable data structures keyword handlers accumulate parsed facts
//! into, and the invariants they enforce while doing so: name uniqueness
//! across variable categories, one-shot main-variable declarations, typed
//! attribute stability, per-hypothesis local-data specialization.

mod attributes;
mod behaviour;
mod bounds;
mod file_description;
mod hypothesis;
mod local_data;
mod material_property;
mod names;
mod static_variable;
mod types;
mod variable;

pub use attributes::{
    MaterialKnowledgeAttribute, MaterialKnowledgeDescription, OutOfBoundsPolicy, attribute_names,
    default_out_of_bounds_policy, set_default_out_of_bounds_policy,
};
pub use behaviour::{
    BehaviourDescription, BehaviourType, DrivingVariable, SymmetryType, ThermodynamicForce,
    VariableCategory,
};
pub use bounds::{BoundsDescription, BoundsType};
pub use file_description::FileDescription;
pub use hypothesis::ModellingHypothesis;
pub use local_data::{LocalDataStructure, LocalVariable};
pub use material_property::MaterialPropertyDescription;
pub use names::NamePool;
pub use static_variable::{StaticVariableDescription, StaticVariableValue};
pub use types::{TypeFlag, TypeSize, flag_of, type_flags};
pub use variable::{VariableDescription, VariableDescriptionContainer};
