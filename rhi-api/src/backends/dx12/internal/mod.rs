pub(crate) use windows::Win32::Graphics::Direct3D as d3d;
pub(crate) use windows::Win32::Graphics::Direct3D12 as d3d12;
pub(crate) use windows::Win32::Graphics::Dxgi as dxgi;

pub(crate) mod conversions;
pub(crate) mod descriptor_heap;

pub(crate) fn dx12_subresource_index(
    mip_slice: u8,
    array_slice: u16,
    plane_slice: u32,
    mip_count: u32,
    array_length: u32,
) -> u32 {
    mip_slice as u32 + (array_slice as u32 * mip_count) + (plane_slice * mip_count * array_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subresource_index_is_mip_major_within_array() {
        assert_eq!(dx12_subresource_index(0, 0, 0, 4, 6), 0);
        assert_eq!(dx12_subresource_index(2, 0, 0, 4, 6), 2);
        assert_eq!(dx12_subresource_index(1, 3, 0, 4, 6), 13);
        // Second plane starts after every mip of every layer
        assert_eq!(dx12_subresource_index(0, 0, 1, 4, 6), 24);
    }
}
