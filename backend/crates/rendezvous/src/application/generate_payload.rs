//! Generate Payload Use Case
//!
//! Free-standing random payload, not registered anywhere.

use crate::domain::services::CodeGenerator;

/// Generate Payload Use Case
pub struct GeneratePayloadUseCase {
    generator: CodeGenerator,
}

impl Default for GeneratePayloadUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratePayloadUseCase {
    pub fn new() -> Self {
        Self {
            generator: CodeGenerator::payload(),
        }
    }

    pub fn execute(&self) -> String {
        self.generator.generate().into_inner()
    }
}
