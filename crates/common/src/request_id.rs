use uuid::Uuid;

use crate::auction::IdGenerator;

/// Generate a new request ID
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// [`IdGenerator`] backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate_id(&self) -> String {
        generate_request_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let id = generate_request_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generator_yields_distinct_ids() {
        let generator = UuidIdGenerator;
        let first = generator.generate_id();
        let second = generator.generate_id();
        assert_ne!(first, second);
    }
}
