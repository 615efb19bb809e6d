//! Collision hull extraction from tile alpha
//!
//! A tile's solid region is the set of pixels whose alpha exceeds a
//! threshold. The hull is the convex polygon spanned by the pixel corners of
//! the region's boundary pixels, so every solid pixel lies inside it.
//!
//! Hull coordinates are tile-local with the origin at the tile's bottom-left
//! corner and y pointing up. Vertices are wound counter-clockwise and start
//! at the lowest-leftmost corner.

use image::{GenericImageView, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Alpha values strictly above this are solid
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 0;

/// Binary solid/empty mask of one tile, stored row-major from the top row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    solid: Vec<bool>,
}

impl AlphaMask {
    /// Build a mask covering exactly the given pixels
    pub fn from_view<I>(pixels: &I, alpha_threshold: u8) -> Self
    where
        I: GenericImageView<Pixel = Rgba<u8>>,
    {
        let (width, height) = pixels.dimensions();
        Self::from_view_sized(pixels, alpha_threshold, width, height)
    }

    /// Build a `width x height` mask from pixels that may not cover it
    ///
    /// Mask cells outside the pixel view are empty.
    pub fn from_view_sized<I>(pixels: &I, alpha_threshold: u8, width: u32, height: u32) -> Self
    where
        I: GenericImageView<Pixel = Rgba<u8>>,
    {
        let (view_width, view_height) = pixels.dimensions();
        Self::from_fn(width, height, |x, y| {
            x < view_width && y < view_height && pixels.get_pixel(x, y)[3] > alpha_threshold
        })
    }

    /// Build a `width x height` mask from the region of `image` at `(x, y)`
    ///
    /// Parts of the region outside the image are empty.
    pub fn from_region(
        image: &RgbaImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        alpha_threshold: u8,
    ) -> Self {
        Self::from_fn(width, height, |dx, dy| {
            image
                .get_pixel_checked(x + dx, y + dy)
                .is_some_and(|p| p[3] > alpha_threshold)
        })
    }

    /// Build a mask from a predicate over `(x, y)`, y counted from the top row
    pub fn from_fn(width: u32, height: u32, mut is_solid: impl FnMut(u32, u32) -> bool) -> Self {
        let mut solid = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                solid.push(is_solid(x, y));
            }
        }
        Self {
            width,
            height,
            solid,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether a pixel is solid; anything outside the mask is empty
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.solid[(y as usize) * self.width as usize + x as usize]
    }

    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|s| **s).count()
    }

    /// A solid pixel with at least one empty 4-neighbour
    fn is_boundary(&self, x: i64, y: i64) -> bool {
        self.is_solid(x, y)
            && (!self.is_solid(x - 1, y)
                || !self.is_solid(x + 1, y)
                || !self.is_solid(x, y - 1)
                || !self.is_solid(x, y + 1))
    }

    /// Corners of every boundary pixel in y-up coordinates, sorted and unique
    fn boundary_corners(&self) -> Vec<(i64, i64)> {
        let height = self.height as i64;
        let mut corners = Vec::new();
        for y in 0..height {
            for x in 0..self.width as i64 {
                if !self.is_boundary(x, y) {
                    continue;
                }
                let bottom = height - 1 - y;
                corners.push((x, bottom));
                corners.push((x + 1, bottom));
                corners.push((x + 1, bottom + 1));
                corners.push((x, bottom + 1));
            }
        }
        corners.sort_unstable();
        corners.dedup();
        corners
    }
}

/// A closed convex collision polygon in physics units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    /// Counter-clockwise vertices, already multiplied by `scale`
    vertices: Vec<[f32; 2]>,
    scale: f32,
}

impl Hull {
    pub fn vertices(&self) -> &[[f32; 2]] {
        &self.vertices
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices mapped back to tile pixel coordinates
    pub fn pixel_vertices(&self) -> Vec<[f32; 2]> {
        self.vertices
            .iter()
            .map(|v| [v[0] / self.scale, v[1] / self.scale])
            .collect()
    }

    /// Shoelace area, positive for counter-clockwise winding
    pub fn signed_area(&self) -> f32 {
        let n = self.vertices.len();
        let mut twice_area = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            twice_area += a[0] * b[1] - b[0] * a[1];
        }
        twice_area / 2.0
    }

    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Whether a point lies inside or on the hull
    pub fn contains(&self, point: [f32; 2]) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = (b[0] - a[0]) * (point[1] - a[1]) - (b[1] - a[1]) * (point[0] - a[0]);
            cross >= -1e-4
        })
    }
}

/// Derives hulls from tile pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullExtractor {
    pub alpha_threshold: u8,
    /// Uniform pixel-to-physics-unit multiplier applied to every vertex
    pub scale: f32,
}

impl Default for HullExtractor {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            scale: 1.0,
        }
    }
}

impl HullExtractor {
    pub fn new(alpha_threshold: u8, scale: f32) -> Self {
        Self {
            alpha_threshold,
            scale,
        }
    }

    /// Extract the hull of a tile's pixels, `None` when nothing is solid
    pub fn extract<I>(&self, pixels: &I) -> Option<Hull>
    where
        I: GenericImageView<Pixel = Rgba<u8>>,
    {
        self.extract_mask(&AlphaMask::from_view(pixels, self.alpha_threshold))
    }

    /// Extract the hull of an already thresholded mask
    pub fn extract_mask(&self, mask: &AlphaMask) -> Option<Hull> {
        let corners = mask.boundary_corners();
        let polygon = convex_hull(&corners);
        if polygon.len() < 3 {
            return None;
        }

        let vertices = polygon
            .into_iter()
            .map(|(x, y)| [x as f32 * self.scale, y as f32 * self.scale])
            .collect();

        Some(Hull {
            vertices,
            scale: self.scale,
        })
    }
}

/// Monotone chain over sorted, unique points
///
/// Collinear points are dropped, so consecutive edges always turn left.
fn convex_hull(points: &[(i64, i64)]) -> Vec<(i64, i64)> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut lower: Vec<(i64, i64)> = Vec::new();
    for &p in points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(i64, i64)> = Vec::new();
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn cross(o: (i64, i64), a: (i64, i64), b: (i64, i64)) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}
