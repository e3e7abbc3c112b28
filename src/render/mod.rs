use std::{ops::Range, path::Path};

use parley::{Alignment, FontStyle, FontWeight, Layout, PositionedLayoutItem, StyleProperty};
use vello::{
  Renderer,
  kurbo::{Affine, Point, Shape, Size, Stroke},
  peniko::{Brush, BrushRef, Color, Fill, Mix},
  wgpu::{self, TextureDescriptor},
};

use crate::{Error, Plot, Result};

mod texture;
mod window;

pub(crate) struct Render {
  pub scene:      vello::Scene,
  pub background: Color,
  font:           parley::FontContext,
  layout:         parley::LayoutContext<Brush>,
}

pub(crate) struct GpuHandle {
  pub device:  wgpu::Device,
  pub queue:   wgpu::Queue,
  pub texture: wgpu::Texture,
  pub view:    wgpu::TextureView,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RenderConfig {
  pub width:  u32,
  pub height: u32,
}

impl Default for RenderConfig {
  fn default() -> Self { RenderConfig { width: 1280, height: 960 } }
}

#[derive(Clone, Copy, Default)]
pub(crate) enum Align {
  #[default]
  Start,
  Center,
  End,
}

pub(crate) struct DrawText<'a> {
  pub text:             &'a str,
  /// Byte ranges of `text` set in italics.
  pub italic:           &'a [Range<usize>],
  pub size:             f32,
  pub weight:           FontWeight,
  pub brush:            Brush,
  pub position:         Point,
  /// Applied around `position`, after alignment.
  pub transform:        Affine,
  pub horizontal_align: Align,
  pub vertical_align:   Align,
}

impl Default for DrawText<'_> {
  fn default() -> Self {
    DrawText {
      text:             "",
      italic:           &[],
      size:             16.0,
      weight:           FontWeight::NORMAL,
      brush:            Brush::Solid(Color::BLACK),
      position:         Point::ZERO,
      transform:        Affine::IDENTITY,
      horizontal_align: Align::Start,
      vertical_align:   Align::Start,
    }
  }
}

impl Plot<'_> {
  /// Renders the plot offscreen and writes it as a PNG, replacing any existing
  /// file at `path`.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let config = self.config;

    let mut render = Render::new(self.theme.background);
    self.draw(&mut render, config.size())?;

    let handle = GpuHandle::new(&config, None)?;

    let mut renderer = Renderer::new(&handle.device, vello::RendererOptions::default())
      .map_err(|e| Error::Gpu(e.to_string()))?;
    renderer
      .render_to_texture(
        &handle.device,
        &handle.queue,
        &render.scene,
        &handle.view,
        &config.params(render.background),
      )
      .map_err(|e| Error::Gpu(e.to_string()))?;

    let pixels = texture::read_pixels(&handle, &config)?;
    texture::write_png(path, &config, pixels)?;

    tracing::info!(path = %path.display(), width = config.width, height = config.height, "saved plot");
    Ok(())
  }

  /// Opens the plot in a window and blocks until it is closed. Returns
  /// immediately if there is no display to open it on.
  pub fn show(&self) -> Result<()> { window::show(self) }
}

impl Render {
  pub fn new(background: Color) -> Self {
    Render {
      scene: vello::Scene::new(),
      background,
      font: parley::FontContext::new(),
      layout: parley::LayoutContext::new(),
    }
  }

  pub fn fill<'b>(&mut self, shape: &impl Shape, transform: Affine, brush: impl Into<BrushRef<'b>>) {
    self.scene.fill(Fill::NonZero, transform, brush, None, shape);
  }

  pub fn stroke<'b>(
    &mut self,
    shape: &impl Shape,
    transform: Affine,
    brush: impl Into<BrushRef<'b>>,
    stroke: &Stroke,
  ) {
    self.scene.stroke(stroke, transform, brush, None, shape);
  }

  /// Everything drawn until the matching [`Render::pop_clip`] is clipped to
  /// `shape`.
  pub fn push_clip(&mut self, shape: &impl Shape) {
    self.scene.push_layer(Mix::Clip, 1.0, Affine::IDENTITY, shape);
  }

  pub fn pop_clip(&mut self) { self.scene.pop_layer(); }

  pub fn layout_text(&mut self, text: &DrawText) -> Layout<Brush> {
    let mut builder = self.layout.ranged_builder(&mut self.font, text.text, 1.0, true);

    builder.push_default(StyleProperty::FontSize(text.size));
    builder.push_default(StyleProperty::Brush(text.brush.clone()));
    builder.push_default(StyleProperty::FontWeight(text.weight));
    for range in text.italic {
      builder.push(StyleProperty::FontStyle(FontStyle::Italic), range.clone());
    }

    let mut layout = builder.build(text.text);
    layout.break_all_lines(None);
    layout.align(None, Alignment::Start, Default::default());
    layout
  }

  pub fn draw_text(&mut self, text: DrawText) {
    let layout = self.layout_text(&text);
    self.draw_text_layout(layout, text);
  }

  pub fn draw_text_layout(&mut self, layout: Layout<Brush>, text: DrawText) {
    let offset = |align: Align, extent: f32| match align {
      Align::Start => 0.0,
      Align::Center => -f64::from(extent) / 2.0,
      Align::End => -f64::from(extent),
    };
    let transform = Affine::translate(text.position.to_vec2())
      * text.transform
      * Affine::translate((
        offset(text.horizontal_align, layout.width()),
        offset(text.vertical_align, layout.height()),
      ));

    for line in layout.lines() {
      for item in line.items() {
        let PositionedLayoutItem::GlyphRun(glyph_run) = item else { continue };

        let run = glyph_run.run();
        let mut x = glyph_run.offset();
        let baseline = glyph_run.baseline();

        self
          .scene
          .draw_glyphs(run.font())
          .brush(&glyph_run.style().brush)
          .transform(transform)
          .glyph_transform(
            run.synthesis().skew().map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0)),
          )
          .font_size(run.font_size())
          .normalized_coords(run.normalized_coords())
          .draw(
            Fill::NonZero,
            glyph_run.glyphs().map(|glyph| {
              let gx = x + glyph.x;
              let gy = baseline + glyph.y;
              x += glyph.advance;
              vello::Glyph { id: glyph.id.into(), x: gx, y: gy }
            }),
          );
      }
    }
  }
}

impl GpuHandle {
  /// Creates a device and a render target of `config`'s size. Without an
  /// `adapter`, the default one is requested.
  pub fn new(config: &RenderConfig, adapter: Option<wgpu::Adapter>) -> Result<Self> {
    let adapter = match adapter {
      Some(adapter) => adapter,
      None => {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
          .map_err(|e| Error::Gpu(e.to_string()))?
      }
    };

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
      label:             None,
      required_features: wgpu::Features::empty(),
      required_limits:   wgpu::Limits::defaults(),
      memory_hints:      wgpu::MemoryHints::MemoryUsage,
      trace:             wgpu::Trace::Off,
    }))
    .map_err(|e| Error::Gpu(e.to_string()))?;

    let (texture, view) = create_target(&device, config);
    Ok(GpuHandle { device, queue, texture, view })
  }

  pub fn resize(&mut self, config: &RenderConfig) {
    let (texture, view) = create_target(&self.device, config);
    self.texture = texture;
    self.view = view;
  }
}

fn create_target(device: &wgpu::Device, config: &RenderConfig) -> (wgpu::Texture, wgpu::TextureView) {
  let texture = device.create_texture(&TextureDescriptor {
    label:           Some("Render Texture"),
    size:            config.extent_3d(),
    mip_level_count: 1,
    sample_count:    1,
    dimension:       wgpu::TextureDimension::D2,
    format:          wgpu::TextureFormat::Rgba8Unorm,
    usage:           wgpu::TextureUsages::STORAGE_BINDING
      | wgpu::TextureUsages::TEXTURE_BINDING
      | wgpu::TextureUsages::COPY_SRC,
    view_formats:    &[],
  });
  let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
  (texture, view)
}

impl RenderConfig {
  pub fn size(&self) -> Size { Size::new(f64::from(self.width), f64::from(self.height)) }

  fn extent_3d(&self) -> wgpu::Extent3d {
    wgpu::Extent3d {
      width:                 self.width,
      height:                self.height,
      depth_or_array_layers: 1,
    }
  }

  fn params(&self, background: Color) -> vello::RenderParams {
    vello::RenderParams {
      base_color:          background,
      width:               self.width,
      height:              self.height,
      antialiasing_method: vello::AaConfig::Msaa16,
    }
  }
}
