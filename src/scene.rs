//! Derives the camera, light, floor and grid from a mesh's bounding box and
//! turns everything into an ordered list of self-contained draw primitives.
//!
//! The camera is not a bounding-sphere fit: it sits at a scaled copy of the
//! box's upper corner and looks at the world origin, so models roughly
//! centered on the origin frame best.
//!
//! # Examples
//! ```
//! use stl_thumbnail::formats::{Mesh, Triangle};
//! use stl_thumbnail::scene;
//!
//! let mesh = Mesh::from_triangles(vec![Triangle {
//!     normal: [0.0, 0.0, 1.0],
//!     verts: [[-10.0, -10.0, 0.0], [10.0, -10.0, 0.0], [10.0, 10.0, 10.0]],
//! }]);
//! let params = scene::compose(&mesh).unwrap();
//! assert_eq!(params.camera.eye.to_array(), [14.0, 14.0, 20.0]);
//! assert_eq!(scene::draw_list(&params, &mesh).len(), 1 + 2 + 200);
//! ```

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::formats::{BoundingBox, Mesh};
use crate::renderer::Renderer;

/// Linear RGB in `[0, 1]`.
pub type Color = [f32; 3];

/// Base color of the model.
pub const MESH_COLOR: Color = [0.2, 0.4, 1.0];
/// Color of the floor quad and of the cleared background.
pub const FLOOR_COLOR: Color = [0.9, 0.9, 0.9];
/// Color of the grid lines.
pub const GRID_COLOR: Color = [1.0, 1.0, 1.0];

/// Errors from deriving scene parameters.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Cannot place camera at {eye:?} looking at the origin")]
    DegenerateView { eye: [f32; 3] },
}

/// Look-at camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Right-handed view matrix.
    ///
    /// When the view direction is parallel to `up` the basis would be
    /// undefined, so +Y is used as the up hint instead.
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.target - self.eye;
        let parallel =
            forward.cross(self.up).length_squared() <= f32::EPSILON * forward.length_squared();
        let up = if parallel { Vec3::Y } else { self.up };
        Mat4::look_at_rh(self.eye, self.target, up)
    }
}

/// Perspective projection; the aspect ratio comes from the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// OpenGL-style clip-space projection (`-w <= z <= w`).
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Single positional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// Specular response of a surface. Diffuse color travels with each primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub specular: f32,
    pub shininess: f32,
}

impl Material {
    /// The shiny material applied to the model.
    pub const GLOSSY: Material = Material {
        specular: 1.0,
        shininess: 50.0,
    };

    /// No highlight at all.
    pub const MATTE: Material = Material {
        specular: 0.0,
        shininess: 0.0,
    };
}

/// Two-triangle floor quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floor {
    pub half_extent: f32,
    pub height: f32,
}

/// Reference grid drawn just above the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Lines per axis direction.
    pub lines: u32,
    pub spacing: f32,
    pub half_extent: f32,
    pub height: f32,
}

impl Grid {
    /// Offset of line `i` from the origin, centered on line `lines / 2`.
    pub fn offset(&self, i: u32) -> f32 {
        (i as f32 - (self.lines / 2) as f32) * self.spacing
    }
}

/// Everything a frame needs besides the primitives themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSetup {
    pub background: Color,
    pub camera: Camera,
    pub projection: Projection,
    pub light: Light,
}

/// View, lighting and reference geometry derived from a mesh's bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParameters {
    pub camera: Camera,
    pub projection: Projection,
    pub light: Light,
    pub material: Material,
    pub floor: Floor,
    pub grid: Grid,
    pub background: Color,
}

impl SceneParameters {
    /// Picks out the per-frame state a [`Renderer`] installs in `begin_frame`.
    ///
    /// # Examples
    /// ```
    /// use stl_thumbnail::formats::BoundingBox;
    /// use stl_thumbnail::scene;
    ///
    /// let bounds = BoundingBox { min: [0.0; 3], max: [1.0; 3] };
    /// let params = scene::compose_bounds(&bounds).unwrap();
    /// let setup = params.frame_setup();
    /// assert_eq!(setup.camera, params.camera);
    /// assert_eq!(setup.background, scene::FLOOR_COLOR);
    /// ```
    pub fn frame_setup(&self) -> FrameSetup {
        FrameSetup {
            background: self.background,
            camera: self.camera,
            projection: self.projection,
            light: self.light,
        }
    }
}

/// One self-describing draw command.
///
/// Each primitive carries its own normal, color and material; nothing is
/// inherited from earlier draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Triangle {
        normal: Vec3,
        verts: [Vec3; 3],
        color: Color,
        material: Material,
    },
    Line {
        normal: Vec3,
        verts: [Vec3; 2],
        color: Color,
        material: Material,
    },
}

/// Derives scene parameters from the mesh's bounding box.
///
/// # Errors
/// Returns [`SceneError::DegenerateView`] if the derived eye is not finite or
/// coincides with the origin (e.g. the box's max corner is the origin).
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use stl_thumbnail::formats::{Mesh, Triangle};
/// use stl_thumbnail::scene;
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 10.0]],
/// }]);
/// let params = scene::compose(&mesh).unwrap();
/// assert_eq!(params.camera.eye, Vec3::new(14.0, 14.0, 20.0));
/// assert_eq!(params.floor.height, -2.0);
/// ```
pub fn compose(mesh: &Mesh) -> Result<SceneParameters, SceneError> {
    compose_bounds(&mesh.bounds)
}

/// Same as [`compose`], from the bounds alone.
///
/// # Errors
/// See [`compose`].
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::BoundingBox;
/// use stl_thumbnail::scene::{self, SceneError};
///
/// let result = scene::compose_bounds(&BoundingBox::EMPTY);
/// assert!(matches!(result, Err(SceneError::DegenerateView { .. })));
/// ```
pub fn compose_bounds(bounds: &BoundingBox) -> Result<SceneParameters, SceneError> {
    let max = Vec3::from_array(bounds.max);
    let min = Vec3::from_array(bounds.min);

    let eye = max * Vec3::new(1.4, 1.4, 2.0);
    let target = Vec3::ZERO;
    if !eye.is_finite() || eye.distance(target) <= 1e-6 {
        return Err(SceneError::DegenerateView { eye: eye.to_array() });
    }

    let light = Light {
        position: max * Vec3::new(2.0, 2.0, 1.7),
        ambient: Vec3::ONE,
        diffuse: Vec3::ONE,
        specular: Vec3::ONE,
    };

    Ok(SceneParameters {
        camera: Camera {
            eye,
            target,
            up: Vec3::Z,
        },
        projection: Projection::default(),
        light,
        material: Material::GLOSSY,
        floor: Floor {
            half_extent: 2000.0,
            height: min.z - 2.0,
        },
        grid: Grid {
            lines: 100,
            spacing: 20.0,
            half_extent: 1000.0,
            height: min.z - 1.0,
        },
        background: FLOOR_COLOR,
    })
}

/// Iterates the primitives of a frame in draw order: mesh, floor, grid.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{Mesh, Triangle};
/// use stl_thumbnail::scene::{self, Primitive};
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 1.0]],
/// }]);
/// let params = scene::compose(&mesh).unwrap();
/// let mut prims = scene::primitives(&params, &mesh);
/// let first = prims.next();
/// assert!(matches!(first, Some(Primitive::Triangle { color, .. }) if color == scene::MESH_COLOR));
/// assert_eq!(prims.count(), 2 + 2 * params.grid.lines as usize);
/// ```
pub fn primitives<'a>(
    params: &'a SceneParameters,
    mesh: &'a Mesh,
) -> impl Iterator<Item = Primitive> + 'a {
    let material = params.material;
    let model = mesh.triangles.iter().map(move |tri| Primitive::Triangle {
        normal: Vec3::from_array(tri.normal),
        verts: tri.verts.map(Vec3::from_array),
        color: MESH_COLOR,
        material,
    });

    model
        .chain(floor_primitives(&params.floor))
        .chain(grid_primitives(&params.grid))
}

/// Collects [`primitives`] into a vector.
///
/// # Examples
/// ```
/// use stl_thumbnail::formats::{Mesh, Triangle};
/// use stl_thumbnail::scene::{self, Primitive};
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 1.0]],
/// }]);
/// let params = scene::compose(&mesh).unwrap();
/// let list = scene::draw_list(&params, &mesh);
/// assert!(matches!(list.last(), Some(Primitive::Line { .. })));
/// ```
pub fn draw_list(params: &SceneParameters, mesh: &Mesh) -> Vec<Primitive> {
    primitives(params, mesh).collect()
}

fn floor_primitives(floor: &Floor) -> [Primitive; 2] {
    let e = floor.half_extent;
    let z = floor.height;
    let tri = |verts: [Vec3; 3]| Primitive::Triangle {
        normal: Vec3::Z,
        verts,
        color: FLOOR_COLOR,
        material: Material::MATTE,
    };
    [
        tri([
            Vec3::new(e, -e, z),
            Vec3::new(-e, e, z),
            Vec3::new(-e, -e, z),
        ]),
        tri([
            Vec3::new(-e, e, z),
            Vec3::new(e, -e, z),
            Vec3::new(e, e, z),
        ]),
    ]
}

fn grid_primitives(grid: &Grid) -> impl Iterator<Item = Primitive> {
    let grid = *grid;
    let line = |a: Vec3, b: Vec3| Primitive::Line {
        normal: Vec3::Z,
        verts: [a, b],
        color: GRID_COLOR,
        material: Material::MATTE,
    };
    (0..grid.lines).flat_map(move |i| {
        let o = grid.offset(i);
        let e = grid.half_extent;
        let z = grid.height;
        [
            // parallel to x
            line(Vec3::new(-e, o, z), Vec3::new(e, o, z)),
            // parallel to y
            line(Vec3::new(o, -e, z), Vec3::new(o, e, z)),
        ]
    })
}

/// Draws one frame of the scene into `renderer`.
///
/// # Examples
/// ```
/// use stl_thumbnail::capture;
/// use stl_thumbnail::formats::{Mesh, Triangle};
/// use stl_thumbnail::renderer::SoftwareRenderer;
/// use stl_thumbnail::scene;
///
/// let mesh = Mesh::from_triangles(vec![Triangle {
///     normal: [0.0, 0.0, 1.0],
///     verts: [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 1.0]],
/// }]);
/// let params = scene::compose(&mesh).unwrap();
/// let mut renderer = SoftwareRenderer::new(16, 16).unwrap();
/// scene::render(&params, &mesh, &mut renderer);
/// assert_eq!(capture::capture(&renderer).unwrap().data.len(), 16 * 16 * 3);
/// ```
pub fn render<R: Renderer + ?Sized>(params: &SceneParameters, mesh: &Mesh, renderer: &mut R) {
    renderer.begin_frame(&params.frame_setup());
    for primitive in primitives(params, mesh) {
        renderer.draw(&primitive);
    }
}
