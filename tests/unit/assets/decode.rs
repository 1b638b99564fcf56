use std::io::Cursor;

use super::*;

fn png_bytes(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = png_bytes(vec![100u8, 50u8, 200u8, 128u8], 1, 1);

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width, 1);
    assert_eq!(decoded.height, 1);
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn load_image_file_marks_missing_files_failed() {
    let handle = load_image_file(Path::new("/definitely/not/here"), "x.png");
    assert_eq!(handle.id.as_str(), "x.png");
    assert!(matches!(handle.image, AssetImage::Failed));
}

#[test]
fn load_image_file_decodes_from_disk() {
    let dir = std::env::temp_dir().join(format!("mixscape_decode_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.png"), png_bytes([0u8, 0, 0, 255].repeat(6), 3, 2)).unwrap();

    let handle = load_image_file(&dir, "a.png");
    assert_eq!(handle.natural_size(), Some(kurbo::Size::new(3.0, 2.0)));

    std::fs::remove_dir_all(&dir).ok();
}
