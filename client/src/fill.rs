use scrawlboard_shared::Point;

/// RGBA8 pixel buffer, row-major, as captured from the canvas. Private to one
/// fill invocation; nothing shares it across calls.
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap bytes from `getImageData`; the length must match the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    fn offset(&self, idx: u32) -> usize {
        idx as usize * 4
    }

    #[inline]
    fn pixel_at(&self, idx: u32) -> [u8; 4] {
        let o = self.offset(idx);
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    #[inline]
    fn set_pixel_at(&mut self, idx: u32, color: [u8; 4]) {
        let o = self.offset(idx);
        self.pixels[o..o + 4].copy_from_slice(&color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixel_at(y * self.width + x)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.set_pixel_at(y * self.width + x, color);
    }
}

/// `#rgb` or `#rrggbb` to 8-bit RGBA at full opacity.
pub fn parse_hex_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.trim().strip_prefix('#')?;
    // The length match and the two-digit slices below count bytes.
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8, 0, 0, 255];
            for (i, c) in hex.chars().enumerate() {
                let nibble = c.to_digit(16)? as u8;
                out[i] = nibble << 4 | nibble;
            }
            Some(out)
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b, 255])
        }
        _ => None,
    }
}

/// 4-connected flood fill from `seed`, exact RGBA equality, iterative with an
/// explicit stack of packed pixel indices so a whole-canvas fill cannot
/// overflow the call stack. Returns false when nothing changed: seed out of
/// bounds, or the seed region already carries the fill color.
pub fn flood_fill(raster: &mut Raster, seed: Point, fill: [u8; 4]) -> bool {
    let w = raster.width;
    let h = raster.height;
    if w == 0 || h == 0 {
        return false;
    }
    let sx = seed.x.floor();
    let sy = seed.y.floor();
    if !(sx >= 0.0 && sy >= 0.0 && sx < f64::from(w) && sy < f64::from(h)) {
        return false;
    }
    let seed_idx = (sy as u32) * w + (sx as u32);

    let target = raster.pixel_at(seed_idx);
    if target == fill {
        return false;
    }

    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    stack.push(seed_idx);
    while let Some(idx) = stack.pop() {
        if raster.pixel_at(idx) != target {
            continue;
        }
        raster.set_pixel_at(idx, fill);

        let x = idx % w;
        let y = idx / w;
        if x > 0 {
            stack.push(idx - 1);
        }
        if x + 1 < w {
            stack.push(idx + 1);
        }
        if y > 0 {
            stack.push(idx - w);
        }
        if y + 1 < h {
            stack.push(idx + w);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    fn count_color(raster: &Raster, color: [u8; 4]) -> usize {
        let mut count = 0;
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                if raster.pixel(x, y) == color {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn filling_with_the_region_color_changes_nothing() {
        let mut raster = Raster::filled(8, 8, WHITE);
        let before = raster.pixels.clone();
        assert!(!flood_fill(&mut raster, Point::new(3.0, 3.0), WHITE));
        assert_eq!(raster.pixels, before);
    }

    #[test]
    fn seed_outside_bounds_is_a_no_op() {
        let mut raster = Raster::filled(8, 8, WHITE);
        let before = raster.pixels.clone();
        for seed in [
            Point::new(-1.0, 3.0),
            Point::new(3.0, -0.5),
            Point::new(8.0, 3.0),
            Point::new(3.0, 100.0),
            Point::new(f64::NAN, 3.0),
        ] {
            assert!(!flood_fill(&mut raster, seed, RED));
        }
        assert_eq!(raster.pixels, before);
    }

    #[test]
    fn fill_recolors_exactly_the_connected_component() {
        // Vertical black wall splits the buffer into two white regions.
        let mut raster = Raster::filled(9, 5, WHITE);
        for y in 0..5 {
            raster.set_pixel(4, y, BLACK);
        }
        assert!(flood_fill(&mut raster, Point::new(1.0, 2.0), RED));

        assert_eq!(count_color(&raster, RED), 4 * 5);
        assert_eq!(count_color(&raster, BLACK), 5);
        for y in 0..5 {
            for x in 5..9 {
                assert_eq!(raster.pixel(x, y), WHITE, "right side leaked at {x},{y}");
            }
        }
    }

    #[test]
    fn diagonal_contact_does_not_connect() {
        // Two white pixels touching only at a corner across a black field.
        let mut raster = Raster::filled(4, 4, BLACK);
        raster.set_pixel(1, 1, WHITE);
        raster.set_pixel(2, 2, WHITE);
        assert!(flood_fill(&mut raster, Point::new(1.0, 1.0), RED));
        assert_eq!(raster.pixel(1, 1), RED);
        assert_eq!(raster.pixel(2, 2), WHITE);
    }

    #[test]
    fn bordered_square_fills_interior_only() {
        // 10x10 white interior enclosed by a 1px black border.
        let mut raster = Raster::filled(12, 12, WHITE);
        for i in 0..12 {
            raster.set_pixel(i, 0, BLACK);
            raster.set_pixel(i, 11, BLACK);
            raster.set_pixel(0, i, BLACK);
            raster.set_pixel(11, i, BLACK);
        }
        assert!(flood_fill(&mut raster, Point::new(5.0, 5.0), RED));

        assert_eq!(count_color(&raster, RED), 100);
        assert_eq!(count_color(&raster, WHITE), 0);
        for i in 0..12 {
            assert_eq!(raster.pixel(i, 0), BLACK);
            assert_eq!(raster.pixel(i, 11), BLACK);
            assert_eq!(raster.pixel(0, i), BLACK);
            assert_eq!(raster.pixel(11, i), BLACK);
        }
    }

    #[test]
    fn whole_canvas_fill_completes_without_recursion() {
        let mut raster = Raster::filled(512, 512, WHITE);
        assert!(flood_fill(&mut raster, Point::new(0.0, 0.0), RED));
        assert_eq!(count_color(&raster, RED), 512 * 512);
    }

    #[test]
    fn exact_equality_leaves_near_miss_pixels_alone() {
        let mut raster = Raster::filled(4, 1, WHITE);
        raster.set_pixel(2, 0, [255, 255, 254, 255]);
        assert!(flood_fill(&mut raster, Point::new(0.0, 0.0), RED));
        assert_eq!(raster.pixel(0, 0), RED);
        assert_eq!(raster.pixel(1, 0), RED);
        assert_eq!(raster.pixel(2, 0), [255, 255, 254, 255]);
        assert_eq!(raster.pixel(3, 0), WHITE);
    }

    #[test]
    fn hex_colors_expand_to_opaque_rgba() {
        assert_eq!(parse_hex_color("#ff0000"), Some(RED));
        assert_eq!(parse_hex_color("#f00"), Some(RED));
        assert_eq!(parse_hex_color("#FFFFFF"), Some(WHITE));
        assert_eq!(parse_hex_color("ff0000"), None);
        assert_eq!(parse_hex_color("#ff00"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn non_ascii_hex_is_rejected_not_sliced() {
        // Six bytes but five chars; slicing at byte 2 would split the "é".
        assert_eq!(parse_hex_color("#a\u{e9}000"), None);
        assert_eq!(parse_hex_color("#\u{e9}0"), None);
    }
}
