use super::*;

fn tiny() -> DecodedImage {
    DecodedImage {
        width: 2,
        height: 1,
        rgba8_premul: Arc::new(vec![1, 2, 3, 4, 5, 6, 7, 8]),
    }
}

#[test]
fn natural_size_by_state() {
    assert_eq!(
        AssetHandle::decoded("a", "a.png", tiny()).natural_size(),
        Some(Size::new(2.0, 1.0))
    );
    assert_eq!(
        AssetHandle::sized("b", 640, 480).natural_size(),
        Some(Size::new(640.0, 480.0))
    );
    assert_eq!(AssetHandle::pending("c").natural_size(), None);
    assert_eq!(AssetHandle::sized("d", 0, 10).natural_size(), None);
}

#[test]
fn filter_keeps_pending_and_drops_failed() {
    let failed = AssetHandle {
        id: AssetId::new("x"),
        source: "x.gif".to_string(),
        image: AssetImage::Failed,
    };
    let kept = filter_available(vec![
        AssetHandle::sized("a", 10, 10),
        failed,
        AssetHandle::pending("p"),
        AssetHandle::sized("zero", 0, 0),
    ]);
    let ids: Vec<_> = kept.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["a", "p"]);
}

#[test]
fn pixel_reads_are_bounds_checked() {
    let img = tiny();
    assert_eq!(img.pixel(1, 0), [5, 6, 7, 8]);
    assert_eq!(img.pixel(2, 0), [0, 0, 0, 0]);
    assert_eq!(img.pixel(0, 1), [0, 0, 0, 0]);
}
