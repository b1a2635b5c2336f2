use serde::Serialize;

/// One boolean per input position, `true` meaning flagged anomalous
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnomalyMask(Vec<bool>);

impl AnomalyMask {
    /// All-False mask of length `n`
    pub fn empty(n: usize) -> Self {
        AnomalyMask(vec![false; n])
    }

    pub fn from_flags(flags: Vec<bool>) -> Self {
        AnomalyMask(flags)
    }

    /// Mask of length `n` with every index in `indices` set
    pub fn from_indices(n: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut mask = Self::empty(n);
        for i in indices {
            mask.set(i);
        }
        mask
    }

    /// Flag `index`; out-of-range indices are ignored
    pub fn set(&mut self, index: usize) {
        if let Some(flag) = self.0.get_mut(index) {
            *flag = true;
        }
    }

    /// Flag every position in `[start, end)` that lies inside the mask
    pub fn set_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.0.len());
        for flag in self.0.iter_mut().take(end).skip(start) {
            *flag = true;
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&f| f).count()
    }

    /// Flagged positions in ascending order
    pub fn indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| if f { Some(i) } else { None })
            .collect()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Maximal runs of consecutive `true` values as `[start, end)` pairs
    pub fn runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, &f) in self.0.iter().enumerate() {
            match (f, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push((s, i));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, self.0.len()));
        }
        runs
    }
}

impl std::ops::Index<usize> for AnomalyMask {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.0[index]
    }
}

impl From<AnomalyMask> for Vec<bool> {
    fn from(mask: AnomalyMask) -> Self {
        mask.0
    }
}
