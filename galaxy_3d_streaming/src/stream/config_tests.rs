/// Unit tests for StreamerConfig and IndexBufferDesc

use super::*;

#[test]
fn test_default_config() {
    let config = StreamerConfig::default();
    assert_eq!(config.initial_capacity_vertices, 4096);
    assert_eq!(config.vertices_per_primitive, 1);
    assert_eq!(config.growth_ceiling_bytes, 8 * 1024 * 1024);
    assert!(config.index_buffer.is_none());
    assert!(config.forced_strategy.is_none());
}

#[test]
fn test_quad_list_pattern() {
    let desc = IndexBufferDesc::quad_list(IndexType::U16, 2);
    assert_eq!(desc.indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    assert_eq!(desc.len(), 12);
    assert_eq!(desc.indices_per_primitive, 6);
    assert_eq!(desc.primitive_count(), 2);
    assert_eq!(desc.max_index(), Some(7));
}

#[test]
fn test_empty_quad_list() {
    let empty = IndexBufferDesc::quad_list(IndexType::U32, 0);
    assert!(empty.is_empty());
    assert_eq!(empty.primitive_count(), 0);
    assert_eq!(empty.max_index(), None);
}

#[test]
fn test_primitive_count_ignores_partial_tail() {
    let desc = IndexBufferDesc::new(IndexType::U32, vec![0, 1, 2, 1, 2], 3);
    assert_eq!(desc.primitive_count(), 1);

    let zero = IndexBufferDesc::new(IndexType::U32, vec![0, 1, 2], 0);
    assert_eq!(zero.primitive_count(), 0);
}

#[test]
fn test_index_bytes_follow_width() {
    let desc = IndexBufferDesc::new(IndexType::U16, vec![1, 258], 1);
    assert_eq!(desc.to_bytes(), vec![1, 0, 2, 1]);

    let desc = IndexBufferDesc::new(IndexType::U32, vec![1], 1);
    assert_eq!(desc.to_bytes(), vec![1, 0, 0, 0]);
}

#[test]
fn test_quads_config() {
    let config = StreamerConfig::quads(16, IndexType::U16);
    assert_eq!(config.initial_capacity_vertices, 64);
    assert_eq!(config.vertices_per_primitive, 4);
    let index = config.index_buffer.unwrap();
    assert_eq!(index.len(), 96);
    assert_eq!(index.primitive_count(), 16);
    assert_eq!(index.index_type, IndexType::U16);
}
