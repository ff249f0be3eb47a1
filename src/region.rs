//! Lazy rasterization of disc and ellipse footprints on the pixel grid. The sun extractor
//! walks the same footprint twice (floor search, then integrate-and-flatten), so both ranges
//! are restartable: every `iter()` call starts a fresh scan.

/// Integer points (x, y) with `(x - cx)^2 + (y - cy)^2 <= r^2`, row by row top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleRange {
    cx: i32,
    cy: i32,
    r: i32,
}

impl CircleRange {
    pub fn new(cx: i32, cy: i32, r: i32) -> Self {
        Self { cx, cy, r: r.max(0) }
    }

    pub fn iter(&self) -> CircleRangeIter {
        let x_max = circle_half_width(self.r, -self.r);
        CircleRangeIter { range: *self, dy: -self.r, dx: -x_max, x_max }
    }
}

impl<'a> IntoIterator for &'a CircleRange {
    type Item = (i32, i32);
    type IntoIter = CircleRangeIter;

    fn into_iter(self) -> CircleRangeIter {
        self.iter()
    }
}

pub struct CircleRangeIter {
    range: CircleRange,
    dy: i32,
    dx: i32,
    x_max: i32,
}

impl Iterator for CircleRangeIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.dy > self.range.r {
            return None;
        }
        let point = (self.range.cx + self.dx, self.range.cy + self.dy);
        if self.dx < self.x_max {
            self.dx += 1;
        } else {
            self.dy += 1;
            self.x_max = circle_half_width(self.range.r, self.dy);
            self.dx = -self.x_max;
        }
        Some(point)
    }
}

/// Integer points inside the axis-aligned ellipse `((x-cx)/rx)^2 + ((y-cy)/ry)^2 <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleRangeEllipse {
    cx: i32,
    cy: i32,
    rx: i32,
    ry: i32,
}

impl CircleRangeEllipse {
    pub fn new(cx: i32, cy: i32, rx: i32, ry: i32) -> Self {
        Self { cx, cy, rx: rx.max(0), ry: ry.max(0) }
    }

    pub fn iter(&self) -> CircleRangeEllipseIter {
        let x_max = ellipse_half_width(self.rx, self.ry, -self.ry);
        CircleRangeEllipseIter { range: *self, dy: -self.ry, dx: -x_max, x_max }
    }
}

impl<'a> IntoIterator for &'a CircleRangeEllipse {
    type Item = (i32, i32);
    type IntoIter = CircleRangeEllipseIter;

    fn into_iter(self) -> CircleRangeEllipseIter {
        self.iter()
    }
}

pub struct CircleRangeEllipseIter {
    range: CircleRangeEllipse,
    dy: i32,
    dx: i32,
    x_max: i32,
}

impl Iterator for CircleRangeEllipseIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.dy > self.range.ry {
            return None;
        }
        let point = (self.range.cx + self.dx, self.range.cy + self.dy);
        if self.dx < self.x_max {
            self.dx += 1;
        } else {
            self.dy += 1;
            self.x_max = ellipse_half_width(self.range.rx, self.range.ry, self.dy);
            self.dx = -self.x_max;
        }
        Some(point)
    }
}

fn circle_half_width(r: i32, dy: i32) -> i32 {
    let remainder = (r * r - dy * dy) as f64;
    if remainder < 0.0 {
        0
    } else {
        remainder.sqrt().floor() as i32
    }
}

fn ellipse_half_width(rx: i32, ry: i32, dy: i32) -> i32 {
    if ry == 0 {
        // Degenerate ellipse: a single row of half-width rx.
        return if dy == 0 { rx } else { 0 };
    }
    let t = dy as f64 / ry as f64;
    let remainder = 1.0 - t * t;
    if remainder < 0.0 {
        0
    } else {
        (rx as f64 * remainder.sqrt()).floor() as i32
    }
}
