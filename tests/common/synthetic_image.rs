use cascade_detector::dataset::LabeledImage;
use cascade_detector::image::GrayImageU8;
use cascade_detector::Rect;
use rand::Rng;

/// Uniform `background` image with a `side x side` square of `foreground`
/// whose top-left corner is `(x0, y0)`.
pub fn bright_square_u8(
    width: usize,
    height: usize,
    (x0, y0): (usize, usize),
    side: usize,
    background: u8,
    foreground: u8,
) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(x0 + side <= width && y0 + side <= height, "square must fit");

    let mut img = vec![background; width * height];
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            img[y * width + x] = foreground;
        }
    }
    img
}

/// Noisy dark scene with one noisy bright square. The annotated region is
/// the square plus a dark margin of a quarter of its side on every edge.
pub fn noisy_scene<R: Rng>(rng: &mut R, width: usize, height: usize, side: usize) -> LabeledImage {
    let margin = side / 4;
    assert!(side + 2 * margin <= width.min(height), "region must fit");

    let data: Vec<u8> = (0..width * height).map(|_| rng.gen_range(0..100)).collect();
    let mut image = GrayImageU8::new(width, height, data);
    let x0 = rng.gen_range(margin..=width - side - margin);
    let y0 = rng.gen_range(margin..=height - side - margin);
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            image.set(x, y, rng.gen_range(180..=255));
        }
    }
    let region = Rect::new(x0 - margin, y0 - margin, side + 2 * margin, side + 2 * margin);
    LabeledImage::new(image, vec![region])
}
