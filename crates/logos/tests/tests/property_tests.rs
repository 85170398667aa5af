#[path = "property/chain_integrity.rs"]
mod chain_integrity;

#[path = "property/contradiction_symmetry.rs"]
mod contradiction_symmetry;

#[path = "property/confidence_propagation.rs"]
mod confidence_propagation;

#[path = "property/strict_mode.rs"]
mod strict_mode;

#[path = "property/compile_determinism.rs"]
mod compile_determinism;

#[path = "property/quorum_required.rs"]
mod quorum_required;
