pub fn round_size_up_to_alignment_u32(
    size: u32,
    required_alignment: u32,
) -> u32 {
    assert!(required_alignment > 0);
    ((size + required_alignment - 1) / required_alignment) * required_alignment
}

pub fn round_size_up_to_alignment_u64(
    size: u64,
    required_alignment: u64,
) -> u64 {
    assert!(required_alignment > 0);
    ((size + required_alignment - 1) / required_alignment) * required_alignment
}

/// Total byte length of a slice of plain data
pub fn slice_size_in_bytes<T>(slice: &[T]) -> usize {
    std::mem::size_of_val(slice)
}

/// View a slice of plain data as bytes. `T: Copy` rules out types with drop glue, the caller
/// is still responsible for `T` having no padding it cares about.
pub fn slice_as_bytes<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, slice_size_in_bytes(slice)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_alignment() {
        assert_eq!(round_size_up_to_alignment_u64(0, 256), 0);
        assert_eq!(round_size_up_to_alignment_u64(1, 256), 256);
        assert_eq!(round_size_up_to_alignment_u64(256, 256), 256);
        assert_eq!(round_size_up_to_alignment_u64(257, 256), 512);
        assert_eq!(round_size_up_to_alignment_u32(5, 4), 8);
    }

    #[test]
    fn slices_view_as_bytes() {
        let data = [1u32, 2u32];
        let bytes = slice_as_bytes(&data);
        assert_eq!(bytes.len(), 8);
        assert_eq!(slice_size_in_bytes(&data), 8);
        assert_eq!(&bytes[0..4], &1u32.to_ne_bytes());
    }
}
