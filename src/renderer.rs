//! Provides a software rasterizer for STL thumbnails.
//!
//! This module handles the fixed-function part of drawing: transforming
//! primitives with a perspective camera, lighting each vertex against a
//! single point light, clipping to the near/far planes and filling a
//! z-buffered framebuffer.
//!
//! No GPU is required; it runs entirely on the CPU. The framebuffer follows
//! the OpenGL conventions: window `y` grows upward and [`Renderer::read_pixels`]
//! returns rows bottom-first.
//!
//! # Examples
//! ```
//! use stl_thumbnail::renderer::{Renderer, SoftwareRenderer};
//!
//! let renderer = SoftwareRenderer::new(4, 2).unwrap();
//! assert_eq!(renderer.viewport(), (4, 2));
//! assert_eq!(renderer.read_pixels(0, 0, 4, 2).unwrap().len(), 4 * 2 * 3);
//! ```

use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

use crate::scene::{Color, FrameSetup, Light, Material, Primitive};

/// Ambient term that applies with or without any light (`GL_LIGHT_MODEL_AMBIENT`).
const SCENE_AMBIENT: f32 = 0.2;
/// Ambient reflectance of every surface.
const MATERIAL_AMBIENT: f32 = 0.2;

/// Errors raised by a renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Viewport must be at least 1x1, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
    #[error("Viewport {width}x{height} is too large to allocate")]
    ViewportTooLarge { width: u32, height: u32 },
    #[error("Readback rectangle {x},{y} {width}x{height} lies outside the viewport")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// The drawing surface the scene is submitted to.
pub trait Renderer {
    /// Returns the viewport size as `(width, height)`.
    fn viewport(&self) -> (u32, u32);

    /// Clears color and depth and installs the camera and light for the frame.
    fn begin_frame(&mut self, setup: &FrameSetup);

    /// Draws one primitive with depth testing.
    fn draw(&mut self, primitive: &Primitive);

    /// Reads an RGB8 rectangle; `y` counts from the bottom and rows are
    /// returned bottom-first.
    ///
    /// # Errors
    /// Returns [`RenderError::OutOfBounds`] if the rectangle leaves the viewport.
    fn read_pixels(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError>;
}

/// A vertex after projection, carrying everything that is interpolated
/// linearly in screen space.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    /// Window depth in `[0, 1]`.
    z: f32,
    inv_w: f32,
    /// Lit color divided by `w`.
    color_w: Vec3,
}

impl ScreenVertex {
    fn lerp(self, other: Self, t: f32) -> Self {
        ScreenVertex {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
            inv_w: self.inv_w + (other.inv_w - self.inv_w) * t,
            color_w: self.color_w.lerp(other.color_w, t),
        }
    }

    fn color(&self) -> Vec3 {
        self.color_w / self.inv_w
    }
}

/// A vertex in homogeneous clip space with its lit color.
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    pos: Vec4,
    color: Vec3,
}

impl ClipVertex {
    fn lerp(self, other: Self, t: f32) -> Self {
        ClipVertex {
            pos: self.pos.lerp(other.pos, t),
            color: self.color.lerp(other.color, t),
        }
    }
}

fn near_distance(p: Vec4) -> f32 {
    p.z + p.w
}

fn far_distance(p: Vec4) -> f32 {
    p.w - p.z
}

/// Signed distances to the near and far planes; inside when `>= 0`.
const CLIP_PLANES: [fn(Vec4) -> f32; 2] = [near_distance, far_distance];

/// A CPU rasterizer with a color and a depth buffer.
///
/// Buffers are stored bottom row first.
pub struct SoftwareRenderer {
    width: u32,
    height: u32,
    color_buf: Vec<Vec3>,
    depth_buf: Vec<f32>,
    view_proj: Mat4,
    eye: Vec3,
    light: Light,
}

impl SoftwareRenderer {
    /// Creates a renderer with a `width` x `height` viewport.
    ///
    /// # Errors
    /// Returns [`RenderError::EmptyViewport`] if either side is zero, and
    /// [`RenderError::ViewportTooLarge`] if the buffers cannot be allocated.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyViewport { width, height });
        }
        let too_large = || RenderError::ViewportTooLarge { width, height };
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;
        let color_buf = filled_buffer(len, Vec3::ZERO).ok_or_else(too_large)?;
        let depth_buf = filled_buffer(len, 1.0_f32).ok_or_else(too_large)?;

        Ok(SoftwareRenderer {
            width,
            height,
            color_buf,
            depth_buf,
            view_proj: Mat4::IDENTITY,
            eye: Vec3::ZERO,
            light: Light {
                position: Vec3::Z,
                ambient: Vec3::ZERO,
                diffuse: Vec3::ONE,
                specular: Vec3::ONE,
            },
        })
    }

    /// Lights one vertex: ambient, then Lambert diffuse driven by the
    /// primitive color, then a Blinn-Phong highlight.
    fn shade(&self, pos: Vec3, normal: Vec3, color: Color, material: &Material) -> Vec3 {
        let light = &self.light;
        let base = Vec3::from_array(color);

        let ambient =
            Vec3::splat(SCENE_AMBIENT * MATERIAL_AMBIENT) + light.ambient * MATERIAL_AMBIENT;

        let n = normal.normalize_or_zero();
        let l = (light.position - pos).normalize_or_zero();
        let n_dot_l = n.dot(l).max(0.0);
        let diffuse = light.diffuse * base * n_dot_l;

        let mut specular = Vec3::ZERO;
        if n_dot_l > 0.0 && material.specular > 0.0 {
            let v = (self.eye - pos).normalize_or_zero();
            let h = (l + v).normalize_or_zero();
            let n_dot_h = n.dot(h).max(0.0);
            specular = light.specular * material.specular * n_dot_h.powf(material.shininess);
        }

        (ambient + diffuse + specular).clamp(Vec3::ZERO, Vec3::ONE)
    }

    fn to_clip(&self, pos: Vec3, color: Vec3) -> ClipVertex {
        ClipVertex {
            pos: self.view_proj * pos.extend(1.0),
            color,
        }
    }

    fn to_screen(&self, v: &ClipVertex) -> ScreenVertex {
        let inv_w = 1.0 / v.pos.w;
        let ndc = v.pos.truncate() * inv_w;
        ScreenVertex {
            x: (ndc.x * 0.5 + 0.5) * self.width as f32,
            y: (ndc.y * 0.5 + 0.5) * self.height as f32,
            z: ndc.z * 0.5 + 0.5,
            inv_w,
            color_w: v.color * inv_w,
        }
    }

    fn draw_triangle(
        &mut self,
        normal: Vec3,
        verts: &[Vec3; 3],
        color: Color,
        material: &Material,
    ) {
        // Fall back to the geometric normal when the file stores none
        let normal = if normal.length_squared() > 0.0 {
            normal
        } else {
            (verts[1] - verts[0]).cross(verts[2] - verts[0])
        };

        let polygon: Vec<ClipVertex> = verts
            .iter()
            .map(|&p| self.to_clip(p, self.shade(p, normal, color, material)))
            .collect();
        let polygon = clip_polygon(polygon);
        if polygon.len() < 3 {
            return;
        }

        let screen: Vec<ScreenVertex> = polygon.iter().map(|v| self.to_screen(v)).collect();
        for i in 1..screen.len() - 1 {
            self.fill_triangle([screen[0], screen[i], screen[i + 1]]);
        }
    }

    fn fill_triangle(&mut self, tri: [ScreenVertex; 3]) {
        let w = self.width as usize;
        let h = self.height as usize;

        // Screen-space bounding box
        let min_x = tri[0].x.min(tri[1].x).min(tri[2].x).max(0.0) as usize;
        let max_x = (tri[0].x.max(tri[1].x).max(tri[2].x).ceil().max(0.0) as usize).min(w);
        let min_y = tri[0].y.min(tri[1].y).min(tri[2].y).max(0.0) as usize;
        let max_y = (tri[0].y.max(tri[1].y).max(tri[2].y).ceil().max(0.0) as usize).min(h);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some([b0, b1, b2]) = barycentric(&tri, px, py) else {
                    continue;
                };

                let z = b0 * tri[0].z + b1 * tri[1].z + b2 * tri[2].z;
                let inv_w = b0 * tri[0].inv_w + b1 * tri[1].inv_w + b2 * tri[2].inv_w;
                let color_w = tri[0].color_w * b0 + tri[1].color_w * b1 + tri[2].color_w * b2;

                self.plot(x, y, z, color_w / inv_w);
            }
        }
    }

    fn draw_line(&mut self, normal: Vec3, verts: &[Vec3; 2], color: Color, material: &Material) {
        let mut a = self.to_clip(verts[0], self.shade(verts[0], normal, color, material));
        let mut b = self.to_clip(verts[1], self.shade(verts[1], normal, color, material));

        for plane in CLIP_PLANES {
            let da = plane(a.pos);
            let db = plane(b.pos);
            match (da >= 0.0, db >= 0.0) {
                (true, true) => {}
                (false, false) => return,
                (true, false) => b = a.lerp(b, da / (da - db)),
                (false, true) => a = a.lerp(b, da / (da - db)),
            }
        }

        let (a, b) = (self.to_screen(&a), self.to_screen(&b));
        let Some((start, end)) = self.clip_to_viewport(a, b) else {
            return;
        };

        let steps = (end.x - start.x).abs().max((end.y - start.y).abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let v = start.lerp(end, i as f32 / steps as f32);
            if v.x < 0.0 || v.y < 0.0 {
                continue;
            }
            let (x, y) = (v.x as usize, v.y as usize);
            if x < self.width as usize && y < self.height as usize {
                self.plot(x, y, v.z, v.color());
            }
        }
    }

    /// Liang-Barsky clip of a screen-space segment to the viewport rectangle.
    fn clip_to_viewport(
        &self,
        a: ScreenVertex,
        b: ScreenVertex,
    ) -> Option<(ScreenVertex, ScreenVertex)> {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
        let edges = [
            (-dx, a.x),
            (dx, self.width as f32 - a.x),
            (-dy, a.y),
            (dy, self.height as f32 - a.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        let (w, h) = (self.width as f32, self.height as f32);
        let clamp = |mut v: ScreenVertex| {
            v.x = v.x.clamp(0.0, w);
            v.y = v.y.clamp(0.0, h);
            v
        };
        Some((clamp(a.lerp(b, t0)), clamp(a.lerp(b, t1))))
    }

    /// Depth-tested write (`GL_LESS`), clipping depth to the far plane.
    fn plot(&mut self, x: usize, y: usize, z: f32, color: Vec3) {
        if !(0.0..=1.0).contains(&z) {
            return;
        }
        let idx = y * self.width as usize + x;
        if z < self.depth_buf[idx] {
            self.depth_buf[idx] = z;
            self.color_buf[idx] = color;
        }
    }
}

impl Renderer for SoftwareRenderer {
    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self, setup: &FrameSetup) {
        self.color_buf.fill(Vec3::from_array(setup.background));
        self.depth_buf.fill(1.0);

        let aspect = self.width as f32 / self.height as f32;
        self.view_proj = setup.projection.matrix(aspect) * setup.camera.view_matrix();
        self.eye = setup.camera.eye;
        self.light = setup.light;
    }

    fn draw(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Triangle {
                normal,
                verts,
                color,
                material,
            } => self.draw_triangle(*normal, verts, *color, material),
            Primitive::Line {
                normal,
                verts,
                color,
                material,
            } => self.draw_line(*normal, verts, *color, material),
        }
    }

    fn read_pixels(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let inside = x.checked_add(width).is_some_and(|r| r <= self.width)
            && y.checked_add(height).is_some_and(|t| t <= self.height);
        if !inside {
            return Err(RenderError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        // ---- Convert f32 → u8 RGB ----
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
        for row in y..y + height {
            let start = row as usize * self.width as usize + x as usize;
            for c in &self.color_buf[start..start + width as usize] {
                pixels.push((c.x.clamp(0.0, 1.0) * 255.0) as u8);
                pixels.push((c.y.clamp(0.0, 1.0) * 255.0) as u8);
                pixels.push((c.z.clamp(0.0, 1.0) * 255.0) as u8);
            }
        }
        Ok(pixels)
    }
}

/// Allocates `len` copies of `value`, or `None` if the allocation is refused.
fn filled_buffer<T: Clone>(len: usize, value: T) -> Option<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).ok()?;
    buf.resize(len, value);
    Some(buf)
}

// ===========================================================================
// Rasterization helpers
// ===========================================================================

/// Sutherland-Hodgman clip against the near and far planes.
fn clip_polygon(mut polygon: Vec<ClipVertex>) -> Vec<ClipVertex> {
    for plane in CLIP_PLANES {
        if polygon.is_empty() {
            break;
        }
        let mut out = Vec::with_capacity(polygon.len() + 1);
        for i in 0..polygon.len() {
            let cur = polygon[i];
            let next = polygon[(i + 1) % polygon.len()];
            let dc = plane(cur.pos);
            let dn = plane(next.pos);
            if dc >= 0.0 {
                out.push(cur);
            }
            if (dc >= 0.0) != (dn >= 0.0) {
                out.push(cur.lerp(next, dc / (dc - dn)));
            }
        }
        polygon = out;
    }
    polygon
}

/// Barycentric weights of `(px, py)` from edge functions, or `None` when the
/// point is outside or the triangle has no area. Either winding is accepted.
fn barycentric(tri: &[ScreenVertex; 3], px: f32, py: f32) -> Option<[f32; 3]> {
    let edge = |a: &ScreenVertex, b: &ScreenVertex, x: f64, y: f64| {
        (b.x as f64 - a.x as f64) * (y - a.y as f64) - (b.y as f64 - a.y as f64) * (x - a.x as f64)
    };

    let area = edge(&tri[0], &tri[1], tri[2].x as f64, tri[2].y as f64);
    if area.abs() < 1e-10 {
        return None;
    }

    let (px, py) = (px as f64, py as f64);
    let b0 = edge(&tri[1], &tri[2], px, py) / area;
    let b1 = edge(&tri[2], &tri[0], px, py) / area;
    let b2 = edge(&tri[0], &tri[1], px, py) / area;

    if b0 >= 0.0 && b1 >= 0.0 && b2 >= 0.0 {
        Some([b0 as f32, b1 as f32, b2 as f32])
    } else {
        None
    }
}
