//! Core logic for bouquet: LLM access and the wedding plan service.

pub mod llm;
pub mod plan;
