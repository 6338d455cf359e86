use crate::io::error::{Result, try_buffer};

/// Exponentially smoothed preference score per variable
///
/// Persists across iterations of one solve. Only the variable that was
/// committed keeps its score into the next iteration.
#[derive(Debug, Clone)]
pub struct Momentum {
    values: Vec<f64>,
    factor: f64,
}

impl Momentum {
    /// Create zeroed scores for `len` variables
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the score buffer cannot be reserved
    pub fn new(len: usize, factor: f64) -> Result<Self> {
        let mut values = try_buffer("momentum", len)?;
        values.resize(len, 0.0);
        Ok(Self {
            values,
            factor: factor.clamp(0.0, 1.0),
        })
    }

    /// Blend a new update into a variable's score
    pub fn update(&mut self, index: usize, update_value: f64) {
        let factor = self.factor;
        if let Some(score) = self.values.get_mut(index) {
            *score = (*score).mul_add(factor, update_value * (1.0 - factor));
        }
    }

    /// Zero every score
    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    /// Zero every score except the committed variable's
    pub fn retain_only(&mut self, index: usize) {
        for (i, score) in self.values.iter_mut().enumerate() {
            if i != index {
                *score = 0.0;
            }
        }
    }

    /// Score of a variable (zero if unknown)
    pub fn get(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    /// Pick the eligible variable with the strictly largest score
    ///
    /// Scans in ascending index order, so the earliest index wins ties.
    pub fn best_choice(&self, eligible: impl IntoIterator<Item = usize>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for index in eligible {
            let score = self.get(index);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }
}
