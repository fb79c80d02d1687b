// Scales — map data values onto pixel offsets
//
// Two kinds are needed:
//   - LinearScale: horizontal axes (batch index, epoch index)
//   - PowScale:    the shared vertical accuracy axis, stretched towards the
//                  top so the 90–100% band gets most of the height
//
// A degenerate domain (both ends equal, or non-finite) maps every value to
// the middle of the range. Nothing here ever produces NaN for finite input.

/// Number of ticks an axis asks for when none is given.
pub const DEFAULT_TICK_COUNT: usize = 10;

/// Affine map from `domain` onto `range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        interpolate(self.domain, self.range, value)
    }

    /// Round tick values covering the domain, roughly `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }

    /// Spacing between the values returned by [`ticks`](Self::ticks).
    pub fn tick_step(&self, count: usize) -> f64 {
        tick_step(self.domain.0, self.domain.1, count)
    }
}

/// `y = sign(x) · |x|^exponent`, then linear onto the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    exponent: f64,
    domain: (f64, f64),
    range: (f64, f64),
}

impl PowScale {
    pub fn new(exponent: f64, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            exponent,
            domain,
            range,
        }
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        let t = |v: f64| v.signum() * v.abs().powf(self.exponent);
        interpolate((t(self.domain.0), t(self.domain.1)), self.range, t(value))
    }

    /// Ticks are chosen in the untransformed domain, so they stay round.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

fn interpolate(domain: (f64, f64), range: (f64, f64), value: f64) -> f64 {
    let (d0, d1) = domain;
    let (r0, r1) = range;
    let span = d1 - d0;
    if span == 0.0 || !span.is_finite() {
        return (r0 + r1) / 2.0;
    }
    r0 + (value - d0) / span * (r1 - r0)
}

/// `(min, max)` of the values, or `None` if there are none.
pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ---------------------------------------------------------------------------
// Tick generation
// ---------------------------------------------------------------------------
//
// Steps are 1, 2 or 5 times a power of ten, picked so that about `count`
// ticks fall inside [start, stop]. Tick values are computed as integer
// multiples (or quotients for sub-unit steps) so 0.1 · 3 comes out as 0.3,
// not 0.30000000000000004.

/// Round tick values in `[start, stop]` (either order).
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let Some(spec) = tick_spec(lo, hi, count as f64) else {
        return Vec::new();
    };
    let mut out: Vec<f64> = (spec.first..=spec.last).map(|i| spec.value(i)).collect();
    if reverse {
        out.reverse();
    }
    out
}

/// Spacing of the ticks [`ticks`] would return; `0.0` when there are none.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    if count == 0 || !start.is_finite() || !stop.is_finite() || start == stop {
        return 0.0;
    }
    let (lo, hi) = if stop < start { (stop, start) } else { (start, stop) };
    match tick_spec(lo, hi, count as f64) {
        Some(spec) if spec.increment < 0.0 => 1.0 / -spec.increment,
        Some(spec) => spec.increment,
        None => 0.0,
    }
}

struct TickSpec {
    first: i64,
    last: i64,
    /// Positive: step size. Negative: the reciprocal of the step, negated.
    increment: f64,
}

impl TickSpec {
    fn value(&self, i: i64) -> f64 {
        if self.increment < 0.0 {
            i as f64 / -self.increment
        } else {
            i as f64 * self.increment
        }
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<TickSpec> {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    let (first, last, increment) = if power < 0.0 {
        let inc = 10f64.powf(-power) / factor;
        let mut first = (start * inc).round();
        let mut last = (stop * inc).round();
        if first / inc < start {
            first += 1.0;
        }
        if last / inc > stop {
            last -= 1.0;
        }
        (first, last, -inc)
    } else {
        let inc = 10f64.powf(power) * factor;
        let mut first = (start / inc).round();
        let mut last = (stop / inc).round();
        if first * inc < start {
            first += 1.0;
        }
        if last * inc > stop {
            last -= 1.0;
        }
        (first, last, inc)
    };

    if last < first {
        if (0.5..2.0).contains(&count) {
            return tick_spec(start, stop, count * 2.0);
        }
        return None;
    }
    if !first.is_finite() || !last.is_finite() {
        return None;
    }
    Some(TickSpec {
        first: first as i64,
        last: last as i64,
        increment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_maps_endpoints() {
        let s = LinearScale::new((0.0, 10.0), (0.0, 200.0));
        assert_eq!(s.map(0.0), 0.0);
        assert_eq!(s.map(10.0), 200.0);
        assert_eq!(s.map(2.5), 50.0);
    }

    #[test]
    fn test_degenerate_domain_maps_to_midpoint() {
        let s = LinearScale::new((4.0, 4.0), (0.0, 300.0));
        assert_eq!(s.map(4.0), 150.0);
        assert_eq!(s.map(99.0), 150.0);
    }

    #[test]
    fn test_pow_scale_inverted_range() {
        let y = PowScale::new(5.0, (0.0, 1.0), (100.0, 0.0));
        assert_eq!(y.map(0.0), 100.0);
        assert_eq!(y.map(1.0), 0.0);
        // 0.5^5 = 1/32 of the height from the bottom.
        assert!((y.map(0.5) - (100.0 - 100.0 / 32.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unit_ticks_are_exact_tenths() {
        let t = ticks(0.0, 1.0, 10);
        assert_eq!(t.len(), 11);
        assert_eq!(t[3], 0.3);
        assert_eq!(t[7], 0.7);
        assert_eq!(tick_step(0.0, 1.0, 10), 0.1);
    }

    #[test]
    fn test_integer_ticks() {
        assert_eq!(ticks(0.0, 117.0, 10), (0..=11).map(|i| i as f64 * 10.0).collect::<Vec<_>>());
        assert_eq!(ticks(0.0, 2925.0, 10).first(), Some(&0.0));
        assert_eq!(tick_step(0.0, 2925.0, 10), 200.0);
    }

    #[test]
    fn test_ticks_reverse_and_degenerate() {
        assert_eq!(ticks(5.0, 0.0, 5), vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
        assert_eq!(ticks(3.0, 3.0, 10), vec![3.0]);
        assert!(ticks(0.0, 1.0, 0).is_empty());
        assert!(ticks(f64::NAN, 1.0, 10).is_empty());
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent(Vec::<f64>::new()), None);
        assert_eq!(extent([3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(extent([2.0]), Some((2.0, 2.0)));
    }
}
