use color::{OpaqueColor, Srgb};
use peniko::{Brush, Color};

pub struct Theme {
  pub background: Color,
  pub text:       Color,
  pub frame:      Color,
  /// Colors handed to series that don't set their own, in insertion order.
  pub cycle:      &'static [OpaqueColor<Srgb>],
}

pub const TAB10: [OpaqueColor<Srgb>; 10] = [
  OpaqueColor::new([0.122, 0.467, 0.706]),
  OpaqueColor::new([1.000, 0.498, 0.055]),
  OpaqueColor::new([0.173, 0.627, 0.173]),
  OpaqueColor::new([0.839, 0.153, 0.157]),
  OpaqueColor::new([0.580, 0.404, 0.741]),
  OpaqueColor::new([0.549, 0.337, 0.294]),
  OpaqueColor::new([0.890, 0.467, 0.761]),
  OpaqueColor::new([0.498, 0.498, 0.498]),
  OpaqueColor::new([0.737, 0.741, 0.133]),
  OpaqueColor::new([0.090, 0.745, 0.812]),
];

impl Default for Theme {
  fn default() -> Self {
    Theme {
      background: Color::WHITE,
      text:       Color::from_rgb8(32, 32, 32),
      frame:      Color::from_rgb8(128, 128, 128),
      cycle:      &TAB10,
    }
  }
}

impl Theme {
  /// Falls back to the text color when the cycle is empty.
  pub fn series_color(&self, index: usize) -> Brush {
    match self.cycle {
      [] => Brush::Solid(self.text),
      cycle => Brush::Solid(cycle[index % cycle.len()].with_alpha(1.0)),
    }
  }
}
