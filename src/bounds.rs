use kurbo::Affine;
use polars::prelude::Column;

use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
  pub x: Range,
  pub y: Range,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
  pub min: f64,
  pub max: f64,
}

impl Bounds {
  pub const fn empty() -> Self { Bounds { x: Range::empty(), y: Range::empty() } }
  pub const fn new(x: Range, y: Range) -> Self { Bounds { x, y } }

  pub const fn expand_by(self, fract: f64) -> Self {
    Bounds { x: self.x.expand_by(fract), y: self.y.expand_by(fract) }
  }

  pub fn union(&self, other: Bounds) -> Bounds {
    Bounds { x: self.x.union(other.x), y: self.y.union(other.y) }
  }

  /// Maps data coordinates in `self` onto `viewport`. A viewport whose y range
  /// runs from bottom to top flips the y axis.
  pub(crate) fn transform_to(&self, viewport: Bounds) -> Affine {
    let scale_x = viewport.x.size() / self.x.size();
    let scale_y = viewport.y.size() / self.y.size();
    let translate_x = viewport.x.min - self.x.min * scale_x;
    let translate_y = viewport.y.min - self.y.min * scale_y;

    Affine::new([scale_x, 0.0, 0.0, scale_y, translate_x, translate_y])
  }
}

impl Default for Range {
  fn default() -> Self { Range::empty() }
}

impl Range {
  /// Contains nothing. The union of an empty range with any other range is
  /// that other range.
  pub const fn empty() -> Self { Range { min: f64::INFINITY, max: f64::NEG_INFINITY } }
  pub const fn new(min: f64, max: f64) -> Self { Range { min, max } }
  pub const fn size(&self) -> f64 { self.max - self.min }
  pub const fn is_empty(&self) -> bool { !(self.min <= self.max) }

  pub const fn expand(self, amount: f64) -> Self {
    Range {
      min: self.min - amount * self.size().signum(),
      max: self.max + amount * self.size().signum(),
    }
  }
  pub const fn expand_by(self, fract: f64) -> Self { self.expand(self.size() * fract) }

  pub const fn contains(&self, value: &f64) -> bool {
    (*value >= self.min && *value <= self.max) || (*value <= self.min && *value >= self.max)
  }

  pub fn union(&self, other: Range) -> Range {
    Range { min: self.min.min(other.min), max: self.max.max(other.max) }
  }

  /// Range covering every value yielded, or `None` if there are none.
  pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Range> {
    values.into_iter().fold(None, |acc, v| match acc {
      None => Some(Range::new(v, v)),
      Some(r) => Some(Range::new(r.min.min(v), r.max.max(v))),
    })
  }

  /// Smallest and largest value of a numeric column.
  pub fn from_column(column: &Column) -> Result<Range> {
    Ok(Range::new(
      column.min_reduce()?.into_value().try_extract::<f64>()?,
      column.max_reduce()?.into_value().try_extract::<f64>()?,
    ))
  }

  /// A degenerate range is widened so it still has a size to scale against.
  pub(crate) fn non_degenerate(self) -> Range {
    if !(self.min.is_finite() && self.max.is_finite()) {
      Range::new(0.0, 1.0)
    } else if self.size() != 0.0 {
      self
    } else if self.min == 0.0 {
      Range::new(-1.0, 1.0)
    } else {
      let pad = self.min.abs() * 0.05;
      Range::new(self.min - pad, self.max + pad)
    }
  }

  /// `count` evenly spaced values from `min` to `max` inclusive. The last
  /// value is exactly `max`.
  pub fn linspace(&self, count: usize) -> Vec<f64> {
    match count {
      0 => vec![],
      1 => vec![self.min],
      _ => {
        let step = self.size() / (count - 1) as f64;
        (0..count)
          .map(|i| if i == count - 1 { self.max } else { self.min + step * i as f64 })
          .collect()
      }
    }
  }

  /// Round-numbered ticks covering the range, about `count` of them. Empty if
  /// the range has no size.
  pub fn nice_ticks(&self, count: u32) -> NiceTicksIter {
    let (min, max) = (self.min.min(self.max), self.max.max(self.min));
    let step = (max - min) / f64::from(count.max(1));
    if !(step.is_finite() && step > 0.0) {
      return NiceTicksIter::empty();
    }

    let k = step.log10().floor();
    let base = step / 10f64.powf(k);

    let nice_base = match base {
      b if b < 1.0 => 1.0,
      b if b < 2.0 => 2.0,
      b if b < 2.5 => 2.5,
      b if b < 5.0 => 5.0,
      _ => 10.0,
    };

    let step = nice_base * 10f64.powf(k);
    let lo = (min / step).floor() * step;
    let hi = (max / step).ceil() * step;
    let steps = ((hi - lo) / step).round();
    if !steps.is_finite() {
      return NiceTicksIter::empty();
    }

    let precision = 4i32.saturating_sub(k as i32).clamp(0, MAX_PRECISION) as usize;
    NiceTicksIter {
      lo,
      step,
      ticks: 0..(steps as usize).min(MAX_TICKS) + 1,
      precision,
    }
  }
}

const MAX_TICKS: usize = 1000;
const MAX_PRECISION: i32 = 300;

pub struct NiceTicksIter {
  lo:        f64,
  step:      f64,
  ticks:     std::ops::Range<usize>,
  precision: usize,
}

impl NiceTicksIter {
  fn empty() -> Self { NiceTicksIter { lo: 0.0, step: 0.0, ticks: 0..0, precision: 0 } }

  /// Fewest decimal places that print every tick of this step exactly.
  pub fn decimals(&self) -> usize {
    (0..self.precision)
      .find(|&d| {
        let scaled = self.step * 10f64.powi(d as i32);
        (scaled - scaled.round()).abs() < 1e-6
      })
      .unwrap_or(self.precision)
  }
}

impl Iterator for NiceTicksIter {
  type Item = f64;
  fn next(&mut self) -> Option<Self::Item> {
    let i = self.ticks.next()?;
    let value = self.lo + i as f64 * self.step;

    let p = 10f64.powi(self.precision as i32);
    let scaled = value * p;
    Some(if scaled.is_finite() { scaled.round() / p } else { value })
  }
}

#[cfg(test)]
mod tests {
  use kurbo::Point;

  use super::*;

  #[test]
  fn linspace_hits_both_ends() {
    let xs = Range::new(1.0, 5.0).linspace(100);
    assert_eq!(xs.len(), 100);
    assert_eq!(xs[0], 1.0);
    assert_eq!(xs[99], 5.0);

    let step = 4.0 / 99.0;
    for pair in xs.windows(2) {
      assert!((pair[1] - pair[0] - step).abs() < 1e-12);
    }
  }

  #[test]
  fn linspace_small_counts() {
    assert!(Range::new(1.0, 5.0).linspace(0).is_empty());
    assert_eq!(Range::new(1.0, 5.0).linspace(1), vec![1.0]);
    assert_eq!(Range::new(1.0, 5.0).linspace(2), vec![1.0, 5.0]);
  }

  #[test]
  fn nice_ticks_round_steps() {
    let iter = Range::new(0.0, 54.0).nice_ticks(10);
    assert_eq!(iter.decimals(), 0);
    let ticks: Vec<f64> = iter.collect();
    assert_eq!(ticks, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);

    let iter = Range::new(0.8, 5.2).nice_ticks(10);
    assert_eq!(iter.decimals(), 1);
    let ticks: Vec<f64> = iter.collect();
    assert_eq!(ticks[0], 0.5);
    assert_eq!(ticks[1], 1.0);
  }

  #[test]
  fn expand_by_adds_margin_both_sides() {
    let r = Range::new(0.0, 10.0).expand_by(0.05);
    assert_eq!(r, Range::new(-0.5, 10.5));
  }

  #[test]
  fn union_ignores_empty() {
    let r = Range::empty().union(Range::new(2.0, 3.0));
    assert_eq!(r, Range::new(2.0, 3.0));
    let r = Range::new(2.0, 3.0).union(Range::new(-1.0, 2.5));
    assert_eq!(r, Range::new(-1.0, 3.0));
    assert!(Range::empty().is_empty());
    assert!(Range::empty().union(Range::empty()).is_empty());
  }

  #[test]
  fn union_keeps_single_values() {
    let r = Range::new(0.0, 1.0).union(Range::new(10.0, 10.0));
    assert_eq!(r, Range::new(0.0, 10.0));
    let r = Range::empty().union(Range::new(4.0, 4.0));
    assert_eq!(r, Range::new(4.0, 4.0));
  }

  #[test]
  fn non_degenerate_widens() {
    assert_eq!(Range::empty().non_degenerate(), Range::new(0.0, 1.0));
    assert_eq!(Range::new(0.0, 0.0).non_degenerate(), Range::new(-1.0, 1.0));
    assert_eq!(Range::new(10.0, 10.0).non_degenerate(), Range::new(9.5, 10.5));
    assert_eq!(Range::new(1.0, 2.0).non_degenerate(), Range::new(1.0, 2.0));
  }

  #[test]
  fn nice_ticks_without_size_are_empty() {
    assert_eq!(Range::new(1.0, 1.0).nice_ticks(8).count(), 0);
    assert_eq!(Range::empty().nice_ticks(8).count(), 0);
    assert_eq!(Range::new(f64::NAN, 1.0).nice_ticks(8).count(), 0);
    assert_eq!(Range::new(0.0, 1.0).nice_ticks(0).count(), 2);
  }

  #[test]
  fn nice_ticks_end_far_from_zero() {
    let ticks: Vec<f64> = Range::new(1e16, 1e16 + 2.0).nice_ticks(8).take(100_000).collect();
    assert!(!ticks.is_empty());
    assert!(ticks.len() <= 20, "{} ticks", ticks.len());
  }

  #[test]
  fn nice_ticks_reversed_range() {
    let forward: Vec<f64> = Range::new(0.0, 54.0).nice_ticks(10).collect();
    let reversed: Vec<f64> = Range::new(54.0, 0.0).nice_ticks(10).collect();
    assert_eq!(forward, reversed);
  }

  #[test]
  fn from_values_covers_all() {
    assert_eq!(Range::from_values([3.0, -1.0, 2.0]), Some(Range::new(-1.0, 3.0)));
    assert_eq!(Range::from_values(Vec::new()), None);
  }

  #[test]
  fn from_column_reads_extremes() {
    let column = Column::new("x".into(), [3, 1, 5, 2, 4]);
    assert_eq!(Range::from_column(&column).unwrap(), Range::new(1.0, 5.0));
  }

  #[test]
  fn transform_flips_y() {
    let data = Bounds::new(Range::new(0.0, 10.0), Range::new(0.0, 100.0));
    let viewport = Bounds::new(Range::new(100.0, 200.0), Range::new(500.0, 300.0));
    let t = data.transform_to(viewport);

    let p = t * Point::new(0.0, 0.0);
    assert!((p.x - 100.0).abs() < 1e-9 && (p.y - 500.0).abs() < 1e-9);
    let p = t * Point::new(10.0, 100.0);
    assert!((p.x - 200.0).abs() < 1e-9 && (p.y - 300.0).abs() < 1e-9);
  }
}
