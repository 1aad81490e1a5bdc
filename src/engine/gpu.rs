//! GL Render Backend
//!
//! Draws through macroquad's underlying miniquad context with one small
//! shader program. Every draw is flushed immediately (no batching), after
//! flushing whatever macroquad itself has queued, so the HUD text drawn
//! later in the frame lands on top.
//!
//! miniquad only knows triangle and line lists, so `assemble` turns line
//! loops, strips and points into indexed lists first.

use log::{info, warn};
use macroquad::file::load_string;
use macroquad::math::Vec2;
use macroquad::miniquad::{
    Bindings, BlendFactor, BlendState, BlendValue, BufferId, BufferLayout, BufferSource, BufferType,
    BufferUsage, Equation, PassAction, Pipeline, PipelineParams, PrimitiveType, ShaderError,
    ShaderMeta, ShaderSource, ShaderType, UniformBlockLayout, UniformDesc, UniformType,
    UniformsSource, VertexAttribute, VertexFormat,
};
use macroquad::window::get_internal_gl;

use super::components::{DrawMode, Rgba};
use super::error::EngineError;
use super::render::{DrawCall, RenderBackend};

/// Largest vertex list a single draw may submit (after assembly)
pub const MAX_VERTICES: usize = 4096;
const MAX_INDICES: usize = MAX_VERTICES * 3;

/// Half extent of the quad a point is expanded to
const POINT_HALF_SIZE: f32 = 1.0;

const EMBEDDED_VERTEX: &str = include_str!("../../assets/shaders/vertex.glsl");
const EMBEDDED_FRAGMENT: &str = include_str!("../../assets/shaders/fragment.glsl");

// =============================================================================
// Shader sources
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    /// The sources compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            vertex: EMBEDDED_VERTEX.to_string(),
            fragment: EMBEDDED_FRAGMENT.to_string(),
        }
    }

    /// Load both stages from disk (or the web server on WASM). A stage that
    /// cannot be read falls back to the embedded copy.
    pub async fn fetch(vertex_path: &str, fragment_path: &str) -> Self {
        let vertex = match load_string(vertex_path).await {
            Ok(source) => source,
            Err(e) => {
                warn!("could not load {}: {}, using built-in vertex shader", vertex_path, e);
                EMBEDDED_VERTEX.to_string()
            }
        };
        let fragment = match load_string(fragment_path).await {
            Ok(source) => source,
            Err(e) => {
                warn!("could not load {}: {}, using built-in fragment shader", fragment_path, e);
                EMBEDDED_FRAGMENT.to_string()
            }
        };
        Self { vertex, fragment }
    }
}

// =============================================================================
// Primitive assembly
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Lines,
}

/// Indexed geometry ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub positions: Vec<f32>,
    pub indices: Vec<u16>,
    pub primitive: Primitive,
}

/// Convert a flat vertex list in the given mode into an indexed triangle
/// or line list. Trailing vertices that do not form a whole primitive are
/// ignored.
pub fn assemble(vertices: &[f32], mode: DrawMode) -> Assembled {
    let n = vertices.len() / 2;
    let positions = vertices[..n * 2].to_vec();

    match mode {
        DrawMode::Triangles => Assembled {
            positions,
            indices: (0..(n - n % 3) as u16).collect(),
            primitive: Primitive::Triangles,
        },
        DrawMode::Lines => Assembled {
            positions,
            indices: (0..(n - n % 2) as u16).collect(),
            primitive: Primitive::Lines,
        },
        DrawMode::LineLoop => {
            let indices = if n < 2 {
                Vec::new()
            } else {
                (0..n as u16)
                    .flat_map(|i| [i, ((i as usize + 1) % n) as u16])
                    .collect()
            };
            Assembled {
                positions,
                indices,
                primitive: Primitive::Lines,
            }
        }
        DrawMode::TriangleStrip => {
            let mut indices = Vec::new();
            for i in 0..n.saturating_sub(2) {
                let i = i as u16;
                // Alternate winding like GL does
                if i % 2 == 0 {
                    indices.extend_from_slice(&[i, i + 1, i + 2]);
                } else {
                    indices.extend_from_slice(&[i + 1, i, i + 2]);
                }
            }
            Assembled {
                positions,
                indices,
                primitive: Primitive::Triangles,
            }
        }
        DrawMode::Points => {
            let mut quads = Vec::with_capacity(n * 8);
            let mut indices = Vec::with_capacity(n * 6);
            let h = POINT_HALF_SIZE;
            for (i, p) in positions.chunks_exact(2).enumerate() {
                let (x, y) = (p[0], p[1]);
                quads.extend_from_slice(&[x - h, y - h, x + h, y - h, x - h, y + h, x + h, y + h]);
                let base = (i * 4) as u16;
                indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
            }
            Assembled {
                positions: quads,
                indices,
                primitive: Primitive::Triangles,
            }
        }
    }
}

// =============================================================================
// GL backend
// =============================================================================

#[repr(C)]
struct Uniforms {
    resolution: [f32; 2],
    translation: [f32; 2],
    rotation: f32,
    color: [f32; 4],
}

fn shader_meta() -> ShaderMeta {
    ShaderMeta {
        images: vec![],
        uniforms: UniformBlockLayout {
            uniforms: vec![
                UniformDesc::new("u_resolution", UniformType::Float2),
                UniformDesc::new("u_translation", UniformType::Float2),
                UniformDesc::new("u_rotation", UniformType::Float1),
                UniformDesc::new("u_color", UniformType::Float4),
            ],
        },
    }
}

fn shader_error(err: ShaderError) -> EngineError {
    match err {
        ShaderError::CompilationError { shader_type, error_message } => EngineError::ShaderCompile {
            stage: match shader_type {
                ShaderType::Vertex => "vertex",
                ShaderType::Fragment => "fragment",
            },
            log: error_message,
        },
        ShaderError::LinkError(log) => EngineError::ShaderLink(log),
        other => EngineError::ShaderLink(format!("{:?}", other)),
    }
}

struct PipelineSet {
    triangles: Pipeline,
    lines: Pipeline,
}

pub struct GlBackend {
    blended: PipelineSet,
    opaque: PipelineSet,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    bindings: Bindings,
    resolution: Vec2,
    blending: bool,
}

impl GlBackend {
    /// Compile the program and allocate the streaming buffers. Must run on
    /// the main thread after the window exists.
    pub fn new(sources: &ShaderSources, resolution: Vec2) -> Result<Self, EngineError> {
        let gl = unsafe { get_internal_gl() };
        let ctx = gl.quad_context;

        let shader = ctx
            .new_shader(
                ShaderSource::Glsl {
                    vertex: &sources.vertex,
                    fragment: &sources.fragment,
                },
                shader_meta(),
            )
            .map_err(shader_error)?;

        let blend = BlendState::new(
            Equation::Add,
            BlendFactor::Value(BlendValue::SourceAlpha),
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        );
        let mut pipeline = |primitive_type: PrimitiveType, color_blend: Option<BlendState>| {
            ctx.new_pipeline(
                &[BufferLayout::default()],
                &[VertexAttribute::new("a_position", VertexFormat::Float2)],
                shader,
                PipelineParams {
                    primitive_type,
                    color_blend,
                    ..Default::default()
                },
            )
        };
        let blended = PipelineSet {
            triangles: pipeline(PrimitiveType::Triangles, Some(blend)),
            lines: pipeline(PrimitiveType::Lines, Some(blend)),
        };
        let opaque = PipelineSet {
            triangles: pipeline(PrimitiveType::Triangles, None),
            lines: pipeline(PrimitiveType::Lines, None),
        };

        let vertex_buffer = ctx.new_buffer(
            BufferType::VertexBuffer,
            BufferUsage::Stream,
            BufferSource::empty::<f32>(MAX_VERTICES * 2),
        );
        let index_buffer = ctx.new_buffer(
            BufferType::IndexBuffer,
            BufferUsage::Stream,
            BufferSource::empty::<u16>(MAX_INDICES),
        );
        let bindings = Bindings {
            vertex_buffers: vec![vertex_buffer],
            index_buffer,
            images: vec![],
        };

        info!("shader program ready ({}x{})", resolution.x, resolution.y);
        Ok(Self {
            blended,
            opaque,
            vertex_buffer,
            index_buffer,
            bindings,
            resolution,
            blending: false,
        })
    }
}

impl RenderBackend for GlBackend {
    fn resolution(&self) -> Vec2 {
        self.resolution
    }

    fn clear(&mut self, color: Rgba) {
        let mut gl = unsafe { get_internal_gl() };
        gl.flush();
        let [r, g, b, a] = color;
        gl.quad_context.begin_default_pass(PassAction::clear_color(r, g, b, a));
        gl.quad_context.end_render_pass();
    }

    fn enable_blending(&mut self) {
        self.blending = true;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let geometry = assemble(call.vertices, call.mode);
        if geometry.indices.is_empty() {
            return;
        }
        if geometry.positions.len() / 2 > MAX_VERTICES || geometry.indices.len() > MAX_INDICES {
            warn!("draw of {} vertices exceeds buffer, skipped", geometry.positions.len() / 2);
            return;
        }

        let set = if self.blending { &self.blended } else { &self.opaque };
        let pipeline = match geometry.primitive {
            Primitive::Triangles => &set.triangles,
            Primitive::Lines => &set.lines,
        };

        let mut gl = unsafe { get_internal_gl() };
        gl.flush();
        let ctx = gl.quad_context;
        ctx.buffer_update(self.vertex_buffer, BufferSource::slice(&geometry.positions));
        ctx.buffer_update(self.index_buffer, BufferSource::slice(&geometry.indices));

        ctx.begin_default_pass(PassAction::Nothing);
        ctx.apply_pipeline(pipeline);
        ctx.apply_bindings(&self.bindings);
        ctx.apply_uniforms(UniformsSource::table(&Uniforms {
            resolution: [self.resolution.x, self.resolution.y],
            translation: [call.translation.x, call.translation.y],
            rotation: call.rotation,
            color: call.color,
        }));
        ctx.draw(0, geometry.indices.len() as i32, 1);
        ctx.end_render_pass();
    }
}
