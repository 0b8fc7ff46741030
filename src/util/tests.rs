use super::*;

#[test]
fn clamp_saturates_both_directions() {
    assert_eq!(clamp_i32(i64::MAX), i32::MAX);
    assert_eq!(clamp_i32(i64::MIN), i32::MIN);
    assert_eq!(clamp_i32(-17), -17);
}

#[test]
fn span_never_wraps() {
    assert_eq!(span_u32(10, 4), 0);
    assert_eq!(span_u32(-5, 5), 10);
    assert_eq!(span_u32(i32::MIN, i32::MAX), u32::MAX);
}

#[test]
fn rect_inflate_expands_all_sides() {
    let r = Rect::new(10, 20, 100, 50).inflated(4);
    assert_eq!(r, Rect::new(6, 16, 108, 58));
}

#[test]
fn rect_inflate_saturates_near_edge() {
    let r = Rect::new(i32::MIN + 1, 0, 10, 10).inflated(8);
    assert_eq!(r.x, i32::MIN);
}

#[test]
fn rect_contains_is_half_open() {
    let r = Rect::new(0, 0, 10, 10);
    assert!(r.contains(0, 0));
    assert!(r.contains(9, 9));
    assert!(!r.contains(10, 9));
    assert!(!r.contains(-1, 5));
}

#[test]
fn region_union_merges_overlap() {
    let mut a = Region::from_rect(Rect::new(0, 0, 10, 10));
    a.union_rect(Rect::new(5, 0, 10, 10));
    assert_eq!(a.boxes().len(), 1);
    assert_eq!(a.extents(), Box32::new(0, 0, 15, 10));
}

#[test]
fn region_union_keeps_disjoint_boxes() {
    let mut a = Region::from_rect(Rect::new(0, 0, 10, 10));
    a.union_rect(Rect::new(100, 100, 10, 10));
    assert_eq!(a.boxes().len(), 2);
    assert!(a.contains_point(5, 5));
    assert!(a.contains_point(105, 105));
    assert!(!a.contains_point(50, 50));
}

#[test]
fn region_subtract_punches_hole() {
    let mut a = Region::from_rect(Rect::new(0, 0, 30, 30));
    a.subtract_rect(Rect::new(10, 10, 10, 10));
    assert!(!a.contains_point(15, 15));
    assert!(a.contains_point(5, 15));
    assert!(a.contains_point(25, 15));
    assert!(a.contains_point(15, 5));
    assert!(a.contains_point(15, 25));
    // Area must be exactly the frame.
    let area: u64 = a
        .rects()
        .map(|r| r.width as u64 * r.height as u64)
        .sum();
    assert_eq!(area, 900 - 100);
}

#[test]
fn region_intersect_clips() {
    let mut a = Region::from_rect(Rect::new(0, 0, 30, 30));
    a.intersect_rect(Rect::new(20, 20, 30, 30));
    assert_eq!(a.extents(), Box32::new(20, 20, 30, 30));
}

#[test]
fn region_intersect_disjoint_is_empty() {
    let mut a = Region::from_rect(Rect::new(0, 0, 10, 10));
    a.intersect_rect(Rect::new(50, 50, 10, 10));
    assert!(a.is_empty());
}

#[test]
fn region_translate_moves_extents() {
    let mut a = Region::from_rect(Rect::new(0, 0, 10, 10));
    a.translate(5, -3);
    assert_eq!(a.extents(), Box32::new(5, -3, 15, 7));
}

#[test]
fn region_vertical_coalescing() {
    // Two stacked rects with identical x spans collapse into one box.
    let mut a = Region::from_rect(Rect::new(0, 0, 10, 10));
    a.union_rect(Rect::new(0, 10, 10, 10));
    assert_eq!(a.boxes().len(), 1);
    assert_eq!(a.extents(), Box32::new(0, 0, 10, 20));
}

#[test]
fn pool_handles_go_stale_on_remove() {
    let mut pool: Pool<&'static str> = Pool::new();
    let a = pool.insert("a");
    assert_eq!(pool.get(a), Some(&"a"));
    pool.remove(a);
    assert_eq!(pool.get(a), None);

    // Slot is reused with a fresh generation.
    let b = pool.insert("b");
    assert_eq!(pool.get(b), Some(&"b"));
    assert_eq!(pool.get(a), None);
    assert_ne!(a, b);
}

#[test]
fn pool_iterates_live_entries_only() {
    let mut pool: Pool<i32> = Pool::new();
    let a = pool.insert(1);
    let _b = pool.insert(2);
    pool.remove(a);
    let values: Vec<i32> = pool.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![2]);
    assert_eq!(pool.len(), 1);
}
