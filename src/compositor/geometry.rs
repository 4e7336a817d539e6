//! Overlap geometry of axis-aligned pixel boxes.
//!
//! A [`PixelBox`] places a 2-D array in the shared detector frame. Given two boxes,
//! [`overlap`] returns the region they have in common, expressed as half-open index
//! ranges in the **local** coordinates of each array, ready to slice with
//! `s![bottom..top, left..right]`.

/// Axis-aligned footprint `(left, bottom, width, height)` of an array in detector pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelBox {
    pub left: i64,
    pub bottom: i64,
    pub width: usize,
    pub height: usize,
}

/// Half-open index ranges `[left, right) × [bottom, top)` within one array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalRegion {
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
    pub top: usize,
}

impl LocalRegion {
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    pub fn height(&self) -> usize {
        self.top - self.bottom
    }
}

/// Region shared by two boxes, in the local frame of each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Overlap {
    /// Shared region in the frame of the first box.
    pub first: LocalRegion,
    /// Shared region in the frame of the second box.
    pub second: LocalRegion,
}

impl PixelBox {
    pub fn new(left: i64, bottom: i64, width: usize, height: usize) -> Self {
        PixelBox {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Footprint of an array of shape `(rows, columns)` whose lower-left pixel sits at
    /// `(x_offset, y_offset)`.
    pub fn of_array(x_offset: i64, y_offset: i64, (rows, columns): (usize, usize)) -> Self {
        PixelBox::new(x_offset, y_offset, columns, rows)
    }

    pub fn right(&self) -> i64 {
        self.left.saturating_add(self.width as i64)
    }

    pub fn top(&self) -> i64 {
        self.bottom.saturating_add(self.height as i64)
    }
}

/// Region of overlap between `first` and `second`.
///
/// `first` is displaced into the frame of `second`, clipped to `second`, and the
/// clipped region is mapped back into the frame of `first`.
///
/// Return
/// ----------
/// * `Some(Overlap)` when the shared region has a positive width and height in both
///   frames, `None` when the boxes do not intersect (touching edges included). Boxes
///   too far apart for their displacement to fit in an `i64` do not intersect.
pub fn overlap(first: &PixelBox, second: &PixelBox) -> Option<Overlap> {
    let dx = first.left.checked_sub(second.left)?;
    let dy = first.bottom.checked_sub(second.bottom)?;

    let w1 = i64::try_from(first.width).ok()?;
    let h1 = i64::try_from(first.height).ok()?;
    let w2 = i64::try_from(second.width).ok()?;
    let h2 = i64::try_from(second.height).ok()?;

    // first box, clipped, in the frame of second
    let left2 = dx.max(0);
    let bottom2 = dy.max(0);
    let right2 = w1.checked_add(dx)?.min(w2);
    let top2 = h1.checked_add(dy)?.min(h2);

    // back into the frame of first
    let left1 = left2.checked_sub(dx)?.max(0);
    let bottom1 = bottom2.checked_sub(dy)?.max(0);
    let right1 = right2.checked_sub(dx)?.min(w1);
    let top1 = top2.checked_sub(dy)?.min(h1);

    let intersect = left1 < right1 && bottom1 < top1 && left2 < right2 && bottom2 < top2;
    if !intersect {
        return None;
    }

    Some(Overlap {
        first: LocalRegion {
            left: left1 as usize,
            bottom: bottom1 as usize,
            right: right1 as usize,
            top: top1 as usize,
        },
        second: LocalRegion {
            left: left2 as usize,
            bottom: bottom2 as usize,
            right: right2 as usize,
            top: top2 as usize,
        },
    })
}

#[cfg(test)]
mod geometry_test {
    use super::*;

    #[test]
    fn test_partial_overlap() {
        let contaminant = PixelBox::new(2, 2, 4, 4);
        let canvas = PixelBox::new(0, 0, 4, 4);
        let ov = overlap(&contaminant, &canvas).unwrap();

        assert_eq!(
            ov.first,
            LocalRegion {
                left: 0,
                bottom: 0,
                right: 2,
                top: 2
            }
        );
        assert_eq!(
            ov.second,
            LocalRegion {
                left: 2,
                bottom: 2,
                right: 4,
                top: 4
            }
        );
    }

    #[test]
    fn test_negative_displacement() {
        let contaminant = PixelBox::new(-3, 5, 6, 2);
        let canvas = PixelBox::new(0, 4, 10, 10);
        let ov = overlap(&contaminant, &canvas).unwrap();

        assert_eq!((ov.first.left, ov.first.right), (3, 6));
        assert_eq!((ov.first.bottom, ov.first.top), (0, 2));
        assert_eq!((ov.second.left, ov.second.right), (0, 3));
        assert_eq!((ov.second.bottom, ov.second.top), (1, 3));
        assert_eq!(ov.first.width(), ov.second.width());
        assert_eq!(ov.first.height(), ov.second.height());
    }

    #[test]
    fn test_containment() {
        let inner = PixelBox::new(103, 51, 3, 2);
        let outer = PixelBox::new(100, 50, 10, 10);
        let ov = overlap(&inner, &outer).unwrap();
        assert_eq!(
            ov.first,
            LocalRegion {
                left: 0,
                bottom: 0,
                right: 3,
                top: 2
            }
        );
        assert_eq!(
            ov.second,
            LocalRegion {
                left: 3,
                bottom: 1,
                right: 6,
                top: 3
            }
        );
    }

    #[test]
    fn test_disjoint_and_touching_boxes() {
        let canvas = PixelBox::new(0, 0, 4, 4);
        assert_eq!(overlap(&PixelBox::new(10, 10, 2, 2), &canvas), None);
        // shares only an edge
        assert_eq!(overlap(&PixelBox::new(4, 0, 2, 4), &canvas), None);
        assert_eq!(overlap(&PixelBox::new(0, -2, 4, 2), &canvas), None);
        // empty array
        assert_eq!(overlap(&PixelBox::new(1, 1, 0, 2), &canvas), None);
    }

    #[test]
    fn test_extreme_offsets_do_not_intersect() {
        let canvas = PixelBox::new(-10, 0, 4, 4);
        assert_eq!(overlap(&PixelBox::new(i64::MAX - 1, 0, 4, 4), &canvas), None);
        assert_eq!(overlap(&canvas, &PixelBox::new(i64::MAX - 1, 0, 4, 4)), None);
        assert_eq!(overlap(&PixelBox::new(0, i64::MIN, 4, 4), &canvas), None);

        let far = PixelBox::new(i64::MAX - 2, 0, 8, 1);
        assert_eq!(far.right(), i64::MAX);
    }
}
