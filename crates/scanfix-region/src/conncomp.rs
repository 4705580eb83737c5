//! Connected component enumeration
//!
//! [`ConnCompEraser`] walks a private copy of a binary image in raster
//! order. Every time it meets a black pixel it flood-fills that pixel's
//! component with white, one horizontal run at a time, and hands back the
//! runs it erased. Since erased pixels are gone, the scan never revisits a
//! component and the cursor only moves forward.

use scanfix_core::{
    BWColor, BinaryImage, Rect, clear_data_bit, get_data_bit, set_data_bit,
};

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Connectivity {
    /// 4-way connectivity (up, down, left, right)
    #[default]
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

/// A horizontal run of black pixels, `x0..=x1` on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub y: u32,
    pub x0: u32,
    pub x1: u32,
}

impl Span {
    /// Number of pixels in the run.
    #[inline]
    pub fn len(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    /// Always false; a span holds at least one pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn rect(&self) -> Rect {
        Rect::new_unchecked(self.x0 as i32, self.y as i32, self.len() as i32, 1)
    }
}

/// A connected component in an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedComponent {
    bounds: Rect,
    pixel_count: u32,
    spans: Vec<Span>,
}

impl ConnectedComponent {
    /// Bounding box in image coordinates.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of black pixels.
    pub fn pixel_count(&self) -> u32 {
        self.pixel_count
    }

    /// Runs making up the component, in discovery order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Materialize the component as an image of its bounding box.
    pub fn to_image(&self) -> BinaryImage {
        let (w, h) = (self.bounds.w as u32, self.bounds.h as u32);
        let mut img = match BinaryImage::new(w, h) {
            Ok(img) => img,
            Err(_) => return BinaryImage::null(),
        };
        let (left, top) = (self.bounds.x as u32, self.bounds.y as u32);
        for span in &self.spans {
            let line = img.row_data_mut(span.y - top);
            for x in span.x0..=span.x1 {
                set_data_bit(line, x - left);
            }
        }
        img
    }

    /// Paint the component's pixels in `image` with `color`.
    ///
    /// # Errors
    ///
    /// Returns a core error if a span does not fit in `image`.
    pub fn paint(&self, image: &mut BinaryImage, color: BWColor) -> scanfix_core::Result<()> {
        for span in &self.spans {
            image.fill_rect(span.rect(), color)?;
        }
        Ok(())
    }
}

/// Lazy enumerator of connected components.
#[derive(Debug)]
pub struct ConnCompEraser {
    image: BinaryImage,
    connectivity: Connectivity,
    cursor_y: u32,
    cursor_word: usize,
    stack: Vec<Span>,
}

impl ConnCompEraser {
    /// Start enumerating the components of `image`.
    ///
    /// The eraser works on its own copy; `image` is left untouched.
    pub fn new(image: &BinaryImage, connectivity: Connectivity) -> Self {
        Self {
            image: image.deep_clone(),
            connectivity,
            cursor_y: 0,
            cursor_word: 0,
            stack: Vec::new(),
        }
    }

    /// Working copy with all components yielded so far erased.
    pub fn remaining(&self) -> &BinaryImage {
        &self.image
    }

    /// Erase and return the next component in raster order of its first
    /// pixel, or `None` when the image is exhausted.
    pub fn next_component(&mut self) -> Option<ConnectedComponent> {
        let (x, y) = self.find_seed()?;
        Some(self.erase_from(x, y))
    }

    fn find_seed(&mut self) -> Option<(u32, u32)> {
        let wpl = self.image.wpl() as usize;
        while self.cursor_y < self.image.height() {
            let line = self.image.row_data(self.cursor_y);
            while self.cursor_word < wpl {
                let word = line[self.cursor_word];
                if word != 0 {
                    let x = self.cursor_word as u32 * 32 + word.leading_zeros();
                    return Some((x, self.cursor_y));
                }
                self.cursor_word += 1;
            }
            self.cursor_y += 1;
            self.cursor_word = 0;
        }
        None
    }

    fn erase_from(&mut self, x: u32, y: u32) -> ConnectedComponent {
        let reach = match self.connectivity {
            Connectivity::FourWay => 0,
            Connectivity::EightWay => 1,
        };
        let (width, height) = self.image.size();

        let first = self.take_run(x, y);
        let mut spans = vec![first];
        self.stack.clear();
        self.stack.push(first);

        while let Some(span) = self.stack.pop() {
            let lo = span.x0.saturating_sub(reach);
            let hi = (span.x1 + reach).min(width - 1);
            let neighbours = [span.y.checked_sub(1), Some(span.y + 1).filter(|&ny| ny < height)];
            for ny in neighbours.into_iter().flatten() {
                let mut nx = lo;
                while nx <= hi {
                    if get_data_bit(self.image.row_data(ny), nx) != 0 {
                        let run = self.take_run(nx, ny);
                        spans.push(run);
                        self.stack.push(run);
                        nx = run.x1 + 2;
                    } else {
                        nx += 1;
                    }
                }
            }
        }

        let mut left = u32::MAX;
        let mut right = 0;
        let mut top = u32::MAX;
        let mut bottom = 0;
        let mut pixel_count = 0;
        for s in &spans {
            left = left.min(s.x0);
            right = right.max(s.x1);
            top = top.min(s.y);
            bottom = bottom.max(s.y);
            pixel_count += s.len();
        }
        ConnectedComponent {
            bounds: Rect::from_edges(left as i32, top as i32, right as i32 + 1, bottom as i32 + 1),
            pixel_count,
            spans,
        }
    }

    /// Clear the maximal run through the black pixel `(x, y)`.
    fn take_run(&mut self, x: u32, y: u32) -> Span {
        let width = self.image.width();
        let line = self.image.row_data_mut(y);
        let mut x0 = x;
        while x0 > 0 && get_data_bit(line, x0 - 1) != 0 {
            x0 -= 1;
        }
        let mut x1 = x;
        while x1 + 1 < width && get_data_bit(line, x1 + 1) != 0 {
            x1 += 1;
        }
        for xx in x0..=x1 {
            clear_data_bit(line, xx);
        }
        Span { y, x0, x1 }
    }
}

impl Iterator for ConnCompEraser {
    type Item = ConnectedComponent;

    fn next(&mut self) -> Option<ConnectedComponent> {
        self.next_component()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanfix_test::{picture, random_image, to_picture};

    #[test]
    fn test_four_vs_eight_way() {
        let img = picture(&[
            "xx....", //
            "..x...", //
            "..x..x", //
            ".....x", //
        ])
        .unwrap();
        let four: Vec<_> = ConnCompEraser::new(&img, Connectivity::FourWay).collect();
        assert_eq!(four.len(), 3);
        assert_eq!(four[0].pixel_count(), 2);
        assert_eq!(four[0].bounds(), Rect::new(0, 0, 2, 1).unwrap());

        let eight: Vec<_> = ConnCompEraser::new(&img, Connectivity::EightWay).collect();
        assert_eq!(eight.len(), 2);
        assert_eq!(eight[0].pixel_count(), 4);
        assert_eq!(eight[0].bounds(), Rect::new(0, 0, 3, 3).unwrap());
        assert_eq!(eight[1].bounds(), Rect::new(5, 2, 1, 2).unwrap());
    }

    #[test]
    fn test_u_shape_is_one_component() {
        // the second arm is only reached through the bottom row
        let img = picture(&[
            "x...x", //
            "x...x", //
            "x.x.x", //
            "xxxxx", //
        ])
        .unwrap();
        let comps: Vec<_> = ConnCompEraser::new(&img, Connectivity::FourWay).collect();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].pixel_count(), 12);
        assert_eq!(comps[0].to_image(), img);
    }

    #[test]
    fn test_source_untouched_and_remaining_cleared() {
        let img = random_image(70, 30, 0.4).unwrap();
        let before = img.count_black();
        let mut eraser = ConnCompEraser::new(&img, Connectivity::EightWay);
        let mut total = 0u64;
        while let Some(cc) = eraser.next_component() {
            total += cc.pixel_count() as u64;
        }
        assert_eq!(total, before);
        assert!(eraser.remaining().is_all_white());
        assert_eq!(img.count_black(), before);
    }

    #[test]
    fn test_paint_and_to_image() {
        let img = picture(&[
            "......", //
            ".xx...", //
            ".x..x.", //
        ])
        .unwrap();
        let mut eraser = ConnCompEraser::new(&img, Connectivity::FourWay);
        let cc = eraser.next_component().unwrap();
        assert_eq!(to_picture(&cc.to_image()), vec!["##", "#."]);

        let mut out = img.clone();
        cc.paint(&mut out, BWColor::White).unwrap();
        assert_eq!(out, picture(&["......", "......", "....x."]).unwrap());
        assert_eq!(img.count_black(), 4);
    }

    #[test]
    fn test_word_boundary_runs() {
        let mut img = BinaryImage::new(100, 2).unwrap();
        img.fill_rect(Rect::new(20, 0, 60, 1).unwrap(), BWColor::Black).unwrap();
        img.set_pixel(64, 1, BWColor::Black).unwrap();
        let comps: Vec<_> = ConnCompEraser::new(&img, Connectivity::FourWay).collect();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].pixel_count(), 61);
        assert_eq!(comps[0].bounds(), Rect::new(20, 0, 60, 2).unwrap());
    }
}
