#![allow(dead_code)]

use std::f32::consts::TAU;
use std::path::Path;

/// Write a synthetic UnityEyes `<stem>.jpg` + `<stem>.json` pair.
pub fn write_sample(dir: &Path, stem: &str, cx: f32, cy: f32) {
    let (w, h) = (640u32, 480u32);
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
        if d < 15.0 {
            image::Rgb([30, 20, 10])
        } else {
            image::Rgb([220, 210, 200])
        }
    });
    img.save(dir.join(format!("{stem}.jpg"))).unwrap();

    let fmt = |x: f32, y: f32| format!("({:.4}, {:.4}, 10.0000)", x, h as f32 - y);
    let ring = |n: usize, rx: f32, ry: f32| -> Vec<String> {
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32 * TAU;
                fmt(cx + rx * t.cos(), cy + ry * t.sin())
            })
            .collect()
    };
    let json = serde_json::json!({
        "interior_margin_2d": ring(16, 60.0, 25.0),
        "caruncle_2d": [fmt(cx - 65.0, cy)],
        "iris_2d": ring(32, 15.0, 15.0),
    });
    std::fs::write(
        dir.join(format!("{stem}.json")),
        serde_json::to_string(&json).unwrap(),
    )
    .unwrap();
}

/// A dataset directory with two samples.
pub fn dataset() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_sample(dir.path(), "1", 320.0, 240.0);
    write_sample(dir.path(), "2", 300.0, 250.0);
    dir
}
