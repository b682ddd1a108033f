// Vertex math shared by the decoder, the transform and the candidate
// generator. Angles are in degrees and follow screen orientation: with y
// pointing down, a positive angle turns clockwise.

use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned rectangle. `min_y`/`max_y` are numeric, so in screen space
/// `min_y` is the top edge and in world space it is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    /// Bounding box of a vertex set, `None` when the set is empty.
    pub fn of(points: &[Vertex]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bbox.expand(*p);
        }
        Some(bbox)
    }

    pub fn expand(&mut self, p: Vertex) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> Vertex {
        Vertex::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn contains(&self, p: Vertex) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Separating-axis test on the two rectangles. Shared edges do not count
    /// as an intersection.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_x <= other.min_x
            || other.max_x <= self.min_x
            || self.max_y <= other.min_y
            || other.max_y <= self.min_y)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> BoundingBox {
        BoundingBox::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    pub fn inflated(&self, pad: f64) -> BoundingBox {
        if pad <= 0.0 {
            return *self;
        }
        BoundingBox::new(
            self.min_x - pad,
            self.min_y - pad,
            self.max_x + pad,
            self.max_y + pad,
        )
    }

    /// Closed ring of the four corners, clockwise on screen starting at the
    /// minimum corner.
    pub fn to_ring(&self) -> Vec<Vertex> {
        vec![
            Vertex::new(self.min_x, self.min_y),
            Vertex::new(self.max_x, self.min_y),
            Vertex::new(self.max_x, self.max_y),
            Vertex::new(self.min_x, self.max_y),
            Vertex::new(self.min_x, self.min_y),
        ]
    }
}

pub fn midpoint(a: Vertex, b: Vertex) -> Vertex {
    Vertex::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

pub fn distance(a: Vertex, b: Vertex) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Direction from `a` to `b` in degrees, in `(-180, 180]`.
pub fn angle_between(a: Vertex, b: Vertex) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// Folds an angle into `(-90, 90]` so text drawn at it never reads upside down.
pub fn normalize_text_angle(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    if a > 90.0 {
        a - 180.0
    } else if a <= -90.0 {
        a + 180.0
    } else {
        a
    }
}

pub fn point_from_distance_and_angle(origin: Vertex, distance: f64, angle: f64) -> Vertex {
    let rad = angle.to_radians();
    Vertex::new(
        origin.x + distance * rad.cos(),
        origin.y + distance * rad.sin(),
    )
}

pub fn rotate_about(center: Vertex, point: Vertex, angle: f64) -> Vertex {
    if angle == 0.0 {
        return point;
    }
    let rad = angle.to_radians();
    let (sin, cos) = rad.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Vertex::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Closed ring of a `width` x `height` box centred on `center`, turned by
/// `angle` around that centre.
pub fn rotated_box(center: Vertex, width: f64, height: f64, angle: f64) -> Vec<Vertex> {
    let half_w = width * 0.5;
    let half_h = height * 0.5;
    let corners = [
        Vertex::new(center.x - half_w, center.y - half_h),
        Vertex::new(center.x + half_w, center.y - half_h),
        Vertex::new(center.x + half_w, center.y + half_h),
        Vertex::new(center.x - half_w, center.y + half_h),
    ];
    let mut ring: Vec<Vertex> = corners
        .iter()
        .map(|c| rotate_about(center, *c, angle))
        .collect();
    ring.push(ring[0]);
    ring
}

/// Ray-crossing point-in-polygon test against a single ring. The ring may be
/// open or closed.
pub fn point_in_ring(point: Vertex, ring: &[Vertex]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Inside the outer ring and outside every hole.
pub fn point_in_polygon(point: Vertex, outer: &[Vertex], holes: &[Vec<Vertex>]) -> bool {
    point_in_ring(point, outer) && !holes.iter().any(|hole| point_in_ring(point, hole))
}

/// Signed shoelace area; positive for counter-clockwise rings in y-up space.
pub fn ring_signed_area(ring: &[Vertex]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for pair in ring.windows(2) {
        sum += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
    }
    let last = ring[ring.len() - 1];
    let first = ring[0];
    if last != first {
        sum += last.x * first.y - first.x * last.y;
    }
    sum * 0.5
}

/// Area-weighted centroid of a ring. Degenerate rings yield NaN coordinates
/// and are left to the caller to recover from.
pub fn ring_centroid(ring: &[Vertex]) -> Vertex {
    let area = ring_signed_area(ring);
    if area.abs() <= EPSILON {
        return Vertex::new(f64::NAN, f64::NAN);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Vertex::new(cx / (6.0 * area), cy / (6.0 * area))
}

pub fn polyline_length(points: &[Vertex]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Point located `at` units along the polyline plus the direction of the
/// segment hosting it. Distances past either end clamp to the endpoints.
pub fn point_on_line(points: &[Vertex], at: f64) -> Option<(Vertex, f64)> {
    if points.len() < 2 {
        return None;
    }
    let mut remaining = at.max(0.0);
    let mut last_angle = 0.0;
    for pair in points.windows(2) {
        let seg_len = distance(pair[0], pair[1]);
        if seg_len <= EPSILON {
            continue;
        }
        last_angle = angle_between(pair[0], pair[1]);
        if remaining <= seg_len {
            let t = remaining / seg_len;
            let p = Vertex::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            );
            return Some((p, last_angle));
        }
        remaining -= seg_len;
    }
    points.last().map(|p| (*p, last_angle))
}

pub fn point_segment_distance(point: Vertex, a: Vertex, b: Vertex) -> f64 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len2 = vx * vx + vy * vy;
    if len2 <= EPSILON {
        return distance(point, a);
    }
    let t = (((point.x - a.x) * vx + (point.y - a.y) * vy) / len2).clamp(0.0, 1.0);
    distance(point, Vertex::new(a.x + vx * t, a.y + vy * t))
}

/// Liang-Barsky clip of one segment against a rectangle.
pub fn clip_segment(a: Vertex, b: Vertex, rect: &BoundingBox) -> Option<(Vertex, Vertex)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-dx, a.x - rect.min_x),
        (dx, rect.max_x - a.x),
        (-dy, a.y - rect.min_y),
        (dy, rect.max_y - a.y),
    ];
    for (p, q) in checks {
        if p.abs() <= EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let start = Vertex::new(a.x + dx * t0, a.y + dy * t0);
    let end = Vertex::new(a.x + dx * t1, a.y + dy * t1);
    Some((start, end))
}

/// Clips a polyline to a rectangle, splitting it wherever it leaves the
/// rectangle. Pieces shorter than two vertices are dropped.
pub fn clip_polyline(points: &[Vertex], rect: &BoundingBox) -> Vec<Vec<Vertex>> {
    let mut pieces: Vec<Vec<Vertex>> = Vec::new();
    let mut current: Vec<Vertex> = Vec::new();
    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], rect) {
            Some((start, end)) => {
                let continues = current
                    .last()
                    .map(|last| distance(*last, start) <= 1e-7)
                    .unwrap_or(false);
                if !continues {
                    if current.len() >= 2 {
                        pieces.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(start);
                }
                current.push(end);
            }
            None => {
                if current.len() >= 2 {
                    pieces.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

fn cross(o: Vertex, a: Vertex, b: Vertex) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Monotone-chain convex hull, returned as a closed ring.
pub fn convex_hull(points: &[Vertex]) -> Vec<Vertex> {
    let mut pts: Vec<Vertex> = points.iter().copied().filter(Vertex::is_finite).collect();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        let mut ring = pts.clone();
        if let Some(first) = pts.first() {
            ring.push(*first);
        }
        return ring;
    }
    let mut lower: Vec<Vertex> = Vec::new();
    for p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Vertex> = Vec::new();
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower.push(lower[0]);
    lower
}

/// Pushes every edge of a convex ring `margin` pixels outward and returns
/// the closed result. Rings with fewer than three distinct corners come back
/// unchanged.
pub fn grow_convex_ring(ring: &[Vertex], margin: f64) -> Vec<Vertex> {
    let mut corners: Vec<Vertex> = ring.to_vec();
    corners.dedup();
    if corners.len() > 1 && corners.first() == corners.last() {
        corners.pop();
    }
    let area = ring_signed_area(&corners);
    if corners.len() < 3 || area.abs() <= EPSILON || margin == 0.0 {
        return ring.to_vec();
    }
    let side = area.signum();
    let n = corners.len();
    let normals: Vec<Vertex> = (0..n)
        .map(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % n];
            let len = distance(a, b);
            Vertex::new(side * (b.y - a.y) / len, side * (a.x - b.x) / len)
        })
        .collect();
    let mut grown: Vec<Vertex> = (0..n)
        .map(|i| {
            let before = normals[(i + n - 1) % n];
            let after = normals[i];
            let dot = before.x * after.x + before.y * after.y;
            if 1.0 + dot <= EPSILON {
                return corners[i].translated(before.x * margin, before.y * margin);
            }
            // Shifting along the bisector keeps both edges `margin` away.
            let scale = margin / (1.0 + dot);
            corners[i].translated((before.x + after.x) * scale, (before.y + after.y) * scale)
        })
        .collect();
    grown.push(grown[0]);
    grown
}
