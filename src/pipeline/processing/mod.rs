// Pipeline processing: field normalization and the quality gate

pub mod normalize;
pub mod quality_gate;
