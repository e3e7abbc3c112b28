use std::path::Path;

use image::{ImageBuffer, Rgba};
use vello::wgpu;

use crate::{
  Error, Result,
  render::{GpuHandle, RenderConfig},
};

/// Copies the render target back to the CPU as tightly packed RGBA rows.
pub(crate) fn read_pixels(handle: &GpuHandle, config: &RenderConfig) -> Result<Vec<u8>> {
  let row_bytes = 4 * config.width;
  let padded_row_bytes = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
    * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

  let buffer = handle.device.create_buffer(&wgpu::BufferDescriptor {
    label:              Some("Output Buffer"),
    size:               u64::from(padded_row_bytes * config.height),
    usage:              wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
    mapped_at_creation: false,
  });

  let mut encoder = handle.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
    label: Some("texture_buffer_copy_encoder"),
  });

  encoder.copy_texture_to_buffer(
    wgpu::TexelCopyTextureInfo {
      texture:   &handle.texture,
      mip_level: 0,
      origin:    wgpu::Origin3d::ZERO,
      aspect:    wgpu::TextureAspect::All,
    },
    wgpu::TexelCopyBufferInfo {
      buffer: &buffer,
      layout: wgpu::TexelCopyBufferLayout {
        offset:         0,
        bytes_per_row:  Some(padded_row_bytes),
        rows_per_image: Some(config.height),
      },
    },
    config.extent_3d(),
  );

  handle.queue.submit(std::iter::once(encoder.finish()));

  let slice = buffer.slice(..);
  let (tx, rx) = std::sync::mpsc::channel();
  slice.map_async(wgpu::MapMode::Read, move |result| {
    let _ = tx.send(result);
  });
  handle.device.poll(wgpu::PollType::Wait).map_err(|e| Error::Gpu(e.to_string()))?;
  rx.recv()
    .map_err(|e| Error::Gpu(e.to_string()))?
    .map_err(|e| Error::Gpu(e.to_string()))?;

  let data = slice.get_mapped_range();
  let pixels = unpad_rows(&data, row_bytes as usize, padded_row_bytes as usize);
  drop(data);
  buffer.unmap();

  Ok(pixels)
}

fn unpad_rows(data: &[u8], row_bytes: usize, padded_row_bytes: usize) -> Vec<u8> {
  data.chunks(padded_row_bytes).flat_map(|row| &row[..row_bytes]).copied().collect()
}

pub(crate) fn write_png(path: &Path, config: &RenderConfig, pixels: Vec<u8>) -> Result<()> {
  let expected = 4 * config.width as usize * config.height as usize;
  let found = pixels.len();
  let buffer = ImageBuffer::<Rgba<u8>, _>::from_raw(config.width, config.height, pixels)
    .ok_or(Error::LengthMismatch { expected, found })?;

  buffer.save_with_format(path, image::ImageFormat::Png)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_row_padding() {
    let data = [1, 2, 0, 0, 3, 4, 0, 0];
    assert_eq!(unpad_rows(&data, 2, 4), vec![1, 2, 3, 4]);
  }

  #[test]
  fn writes_and_overwrites_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ch4.png");
    let config = RenderConfig { width: 4, height: 2 };

    write_png(&path, &config, vec![255; 4 * 4 * 2]).unwrap();
    let first = std::fs::metadata(&path).unwrap().len();
    assert!(first > 0);

    write_png(&path, &config, vec![0; 4 * 4 * 2]).unwrap();
    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (4, 2));
    assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
  }

  #[test]
  fn rejects_short_pixel_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig { width: 4, height: 2 };

    let err = write_png(&dir.path().join("short.png"), &config, vec![0; 3]).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 32, found: 3 }));
  }
}
