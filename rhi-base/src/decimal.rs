use std::hash::{Hash, Hasher};

// An f32 that is Hash + Eq by bit pattern. Only meant for values that come straight from a
// definition struct (clear colors, lod bias) where no arithmetic happens and NaN is not expected.
#[derive(Debug, Copy, Clone, Default)]
pub struct DecimalF32(pub f32);

impl From<f32> for DecimalF32 {
    fn from(value: f32) -> Self {
        DecimalF32(value)
    }
}

impl From<DecimalF32> for f32 {
    fn from(value: DecimalF32) -> Self {
        value.0
    }
}

impl PartialEq for DecimalF32 {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for DecimalF32 {}

impl Hash for DecimalF32 {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.0.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: DecimalF32) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_values_hash_equal() {
        assert_eq!(DecimalF32(0.5), DecimalF32(0.5));
        assert_eq!(hash_of(DecimalF32(0.5)), hash_of(DecimalF32(0.5)));
    }

    #[test]
    fn signed_zero_is_distinct() {
        // Bit-pattern equality keeps Eq and Hash consistent
        assert_ne!(DecimalF32(0.0), DecimalF32(-0.0));
    }
}
