use jet3::{
    storage::usage_map::{BITS_PER_MAP_PAGE, UsageMap},
    types::error::DatabaseError,
    utils::mock::{
        DataPageBuilder, header_page, inline_usage_map, paged_usage_map, store_from_pages,
        usage_map_page,
    },
};

#[test]
fn test_inline_map_yields_base_plus_bit() {
    let store = store_from_pages(vec![header_page()]);
    let descriptor = inline_usage_map(100, &[102, 105, 109]);
    let map = UsageMap::parse(&descriptor).unwrap();

    assert!(matches!(map, UsageMap::Inline { base: 100, .. }));
    assert_eq!(map.pages(&store).unwrap(), vec![102, 105, 109]);
    assert_eq!(map.next_page(&store, 0).unwrap(), Some(102));
    assert_eq!(map.next_page(&store, 102).unwrap(), Some(105));
    assert_eq!(map.next_page(&store, 106).unwrap(), Some(109));
    assert_eq!(map.next_page(&store, 109).unwrap(), None);
}

#[test]
fn test_inline_map_before_base_starts_at_first_bit() {
    let store = store_from_pages(vec![header_page()]);
    let descriptor = inline_usage_map(100, &[100, 101]);
    let map = UsageMap::parse(&descriptor).unwrap();

    assert_eq!(map.next_page(&store, 50).unwrap(), Some(100));
    assert_eq!(map.next_page(&store, 100).unwrap(), Some(101));
}

#[test]
fn test_empty_inline_map_has_no_pages() {
    let store = store_from_pages(vec![header_page()]);
    let descriptor = inline_usage_map(0, &[]);
    let map = UsageMap::parse(&descriptor).unwrap();
    assert!(map.pages(&store).unwrap().is_empty());
}

#[test]
fn test_paged_map_spans_multiple_map_pages() {
    let store = store_from_pages(vec![
        header_page(),
        Vec::new(),
        usage_map_page(&[5, 16000]),
        usage_map_page(&[0, 7]),
    ]);
    let descriptor = paged_usage_map(&[2, 3]);
    let map = UsageMap::parse(&descriptor).unwrap();

    let pages = map.pages(&store).unwrap();
    let second = BITS_PER_MAP_PAGE as u32;
    assert_eq!(pages, vec![5, 16000, second, second + 7]);
    assert!(pages.windows(2).all(|w| w[0] < w[1]));

    // Resuming in the middle of the second map page.
    assert_eq!(map.next_page(&store, second).unwrap(), Some(second + 7));
    assert_eq!(map.next_page(&store, second + 7).unwrap(), None);
}

#[test]
fn test_paged_map_skips_null_map_pages() {
    let store = store_from_pages(vec![header_page(), Vec::new(), usage_map_page(&[3])]);
    let descriptor = paged_usage_map(&[0, 2]);
    let map = UsageMap::parse(&descriptor).unwrap();

    let expected = BITS_PER_MAP_PAGE as u32 + 3;
    // The offset into the skipped map page must not carry over.
    assert_eq!(map.next_page(&store, 10).unwrap(), Some(expected));
    assert_eq!(map.pages(&store).unwrap(), vec![expected]);
}

#[test]
fn test_paged_map_rejects_wrong_page_tag() {
    let mut data = DataPageBuilder::new(2);
    data.push_row(vec![1, 2, 3]);
    let store = store_from_pages(vec![header_page(), data.build()]);
    let descriptor = paged_usage_map(&[1]);
    let map = UsageMap::parse(&descriptor).unwrap();

    let err = map.next_page(&store, 0).unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::InvalidUsageMapPage { page_number: 1, tag: 0x01 }
    ));
    assert!(err.is_format_error());
}

#[test]
fn test_unknown_map_type_is_rejected() {
    assert!(matches!(
        UsageMap::parse(&[0x02, 0, 0, 0, 0]),
        Err(DatabaseError::UnknownPageMapType(0x02))
    ));
    assert!(matches!(
        UsageMap::parse(&[]),
        Err(DatabaseError::MalformedRow { .. })
    ));
}

#[test]
fn test_truncated_inline_header_is_malformed() {
    assert!(matches!(
        UsageMap::parse(&[0x00, 1, 2]),
        Err(DatabaseError::MalformedRow { .. })
    ));
}

#[test]
fn test_inline_map_base_overflow_is_malformed() {
    let store = store_from_pages(vec![header_page()]);
    let mut descriptor = vec![0x00];
    descriptor.extend_from_slice(&(u32::MAX - 1).to_le_bytes());
    descriptor.push(0b0000_1000);
    let map = UsageMap::parse(&descriptor).unwrap();

    let err = map.next_page(&store, 0).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedRow { .. }));
    assert!(err.is_format_error());
}

#[test]
fn test_inline_map_may_reach_last_page_number() {
    let store = store_from_pages(vec![header_page()]);
    let mut descriptor = vec![0x00];
    descriptor.extend_from_slice(&(u32::MAX - 1).to_le_bytes());
    descriptor.push(0b0000_0010);
    let map = UsageMap::parse(&descriptor).unwrap();

    assert_eq!(map.next_page(&store, 0).unwrap(), Some(u32::MAX));
    assert_eq!(map.next_page(&store, u32::MAX).unwrap(), None);
}
