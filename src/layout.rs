//! Page geometry and overlay placement
//!
//! All values are PDF user-space points (1/72 inch) with the origin at the
//! bottom-left of the page.

/// Tolerance when comparing page boxes
const EPSILON: f32 = 0.01;

/// A rectangle such as a page's MediaBox: `[llx lly urx ury]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    pub fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        // Normalize so that ll is always the lower-left corner
        Self {
            llx: llx.min(urx),
            lly: lly.min(ury),
            urx: llx.max(urx),
            ury: lly.max(ury),
        }
    }

    /// US Letter (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(0.0, 0.0, 612.0, 792.0)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Smallest box containing this box and the given point
    pub fn include(&self, x: f32, y: f32) -> Self {
        Self {
            llx: self.llx.min(x),
            lly: self.lly.min(y),
            urx: self.urx.max(x),
            ury: self.ury.max(y),
        }
    }

    /// Scale every coordinate about the origin
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.llx * sx, self.lly * sy, self.urx * sx, self.ury * sy)
    }

    pub fn approx_eq(&self, other: &PageBox) -> bool {
        (self.llx - other.llx).abs() < EPSILON
            && (self.lly - other.lly).abs() < EPSILON
            && (self.urx - other.urx).abs() < EPSILON
            && (self.ury - other.ury).abs() < EPSILON
    }
}

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl TransformMatrix {
    /// Identity matrix (no transformation)
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self { e: tx, f: ty, ..Self::identity() }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self { a: sx, d: sy, ..Self::identity() }
    }

    /// Counter-clockwise rotation by `degrees` about the origin
    pub fn rotate(degrees: i64) -> Self {
        // Quarter turns are exact so pages don't pick up 1e-8 skews
        let (cos, sin) = match normalize_rotation(degrees) {
            0 => (1.0, 0.0),
            90 => (0.0, 1.0),
            180 => (-1.0, 0.0),
            270 => (0.0, -1.0),
            other => {
                let radians = (other as f32).to_radians();
                (radians.cos(), radians.sin())
            }
        };
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// Rotation by `degrees` about the point (cx, cy)
    pub fn rotate_about(degrees: i64, cx: f32, cy: f32) -> Self {
        Self::translate(-cx, -cy)
            .then(&Self::rotate(degrees))
            .then(&Self::translate(cx, cy))
    }

    /// Apply `self` first, then `next`
    pub fn then(&self, next: &TransformMatrix) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    /// Map a point through the matrix
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Check if this is (approximately) the identity matrix
    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 0.001 &&
        self.b.abs() < 0.001 &&
        self.c.abs() < 0.001 &&
        (self.d - 1.0).abs() < 0.001 &&
        self.e.abs() < 0.001 &&
        self.f.abs() < 0.001
    }

    /// Operands for a `cm` operator
    pub fn to_cm(&self) -> String {
        format!(
            "{} {} {} {} {} {} cm",
            fmt_num(self.a), fmt_num(self.b), fmt_num(self.c),
            fmt_num(self.d), fmt_num(self.e), fmt_num(self.f)
        )
    }

    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// Bring a `/Rotate` value into `[0, 360)`
pub fn normalize_rotation(degrees: i64) -> i64 {
    degrees.rem_euclid(360)
}

/// Format a number for a content stream without exponent notation
pub fn fmt_num(value: f32) -> String {
    if value.fract() == 0.0 && value.abs() < 1e9 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Where a label canvas lands on a page and how the page is adjusted for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    /// Maps canvas space into page space
    pub overlay: TransformMatrix,
    /// Applied to the whole page when the overlay enlarged it
    pub page_scale: Option<TransformMatrix>,
    /// MediaBox of the stamped page
    pub media_box: PageBox,
}

impl OverlayPlacement {
    /// Place a `canvas_width` × `canvas_height` overlay on a page.
    ///
    /// The overlay is rotated by the page's own rotation about
    /// (width/2, height/2). If the rotated canvas reaches outside the page
    /// box, the box grows to include it and everything is then scaled back
    /// down so the page keeps its original width and height.
    pub fn compute(page: PageBox, rotation: i64, canvas_width: f32, canvas_height: f32) -> Self {
        let overlay = TransformMatrix::rotate_about(rotation, page.width() / 2.0, page.height() / 2.0);

        let expanded = [
            (0.0, 0.0),
            (canvas_width, 0.0),
            (0.0, canvas_height),
            (canvas_width, canvas_height),
        ]
        .iter()
        .map(|&(x, y)| overlay.apply(x, y))
        .fold(page, |bbox, (x, y)| bbox.include(x, y));

        if expanded.approx_eq(&page) {
            return Self { overlay, page_scale: None, media_box: page };
        }

        let sx = page.width() / expanded.width();
        let sy = page.height() / expanded.height();

        Self {
            overlay,
            page_scale: Some(TransformMatrix::scale(sx, sy)),
            media_box: expanded.scaled(sx, sy),
        }
    }
}
