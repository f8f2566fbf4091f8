/// Maps `[0, domain_max]` to `range` through a square root, so that the area of a circle with
/// the output radius grows linearly with the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    domain_max: f64,
    range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain_max: f64, range: (f64, f64)) -> SqrtScale {
        SqrtScale { domain_max, range }
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// An empty domain maps everything to the start of the range. Negative input is treated as 0.
    pub fn apply(&self, value: f64) -> f64 {
        let (low, high) = self.range;
        if !(self.domain_max > 0.) {
            return low;
        }
        let t = (value.max(0.) / self.domain_max).sqrt();
        low + t * (high - low)
    }
}

/// Divides a continuous domain into equal segments, one for each output in the range.
/// Values on a boundary belong to the upper segment, values outside the domain to the nearest end.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeScale<T> {
    domain: (f64, f64),
    range: Vec<T>,
}

impl<T: Copy> QuantizeScale<T> {
    /// # Panics
    /// if range is empty
    pub fn new(domain: (f64, f64), range: Vec<T>) -> QuantizeScale<T> {
        assert!(!range.is_empty(), "quantize scale needs at least one output");
        QuantizeScale { domain, range }
    }

    fn thresholds(&self) -> impl Iterator<Item = f64> + '_ {
        let (x0, x1) = self.domain;
        let n = self.range.len() as f64;
        (1..self.range.len()).map(move |i| x0 + i as f64 * (x1 - x0) / n)
    }

    pub fn apply(&self, value: f64) -> T {
        let index = self.thresholds().take_while(|&threshold| threshold <= value).count();
        self.range[index]
    }
}
