use dclocate_domain::{DomainError, SrvCandidate};
use tracing::{debug, trace};

/// Handle to a candidate inside one [`CandidateDirectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateId(usize);

impl CandidateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// SRV candidates for one lookup, iterated in RFC 2782 order.
///
/// Entries are kept sorted by ascending priority then weight, in insertion
/// order among equals. The directory is filled once; the first call to
/// [`next`](Self::next) seals it.
pub struct CandidateDirectory {
    candidates: Vec<SrvCandidate>,
    priority_floor: u16,
    sealed: bool,
    rng: fastrand::Rng,
}

impl CandidateDirectory {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Uses `rng` for the weighted draw inside a priority tier.
    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            candidates: Vec::new(),
            priority_floor: 0,
            sealed: false,
            rng,
        }
    }

    /// Adds a candidate. Returns `Ok(false)` when an entry with the same
    /// target, priority and weight is already present.
    pub fn insert(&mut self, candidate: SrvCandidate) -> Result<bool, DomainError> {
        if self.sealed {
            return Err(DomainError::DirectorySealed);
        }

        if self.candidates.iter().any(|c| c.same_entry(&candidate)) {
            trace!(target = %candidate.target_name, "Duplicate SRV entry ignored");
            return Ok(false);
        }

        let pos = self
            .candidates
            .partition_point(|c| (c.priority, c.weight) <= (candidate.priority, candidate.weight));
        self.candidates.insert(pos, candidate);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn candidates(&self) -> &[SrvCandidate] {
        &self.candidates
    }

    pub fn get(&self, id: CandidateId) -> Option<&SrvCandidate> {
        self.candidates.get(id.0)
    }

    /// Returns the next candidate to probe, or `None` once every eligible
    /// candidate has been handed out.
    ///
    /// `None` as `previous` starts a fresh iteration and clears every `used`
    /// flag. Otherwise `previous` is marked used and its priority becomes the
    /// floor below which nothing is eligible.
    pub fn next(&mut self, previous: Option<CandidateId>) -> Option<CandidateId> {
        match previous {
            None => {
                self.sealed = true;
                self.priority_floor = 0;
                for candidate in &mut self.candidates {
                    candidate.used = false;
                }
            }
            Some(id) => {
                if let Some(candidate) = self.candidates.get_mut(id.0) {
                    candidate.used = true;
                    self.priority_floor = candidate.priority;
                }
            }
        }

        let floor = self.priority_floor;
        let tier = self
            .candidates
            .iter()
            .filter(|c| !c.used && c.priority >= floor)
            .map(|c| c.priority)
            .min()?;
        self.priority_floor = tier;

        let in_tier = |c: &SrvCandidate| !c.used && c.priority == tier;

        let weight_sum: u32 = self
            .candidates
            .iter()
            .filter(|&c| in_tier(c))
            .map(|c| u32::from(c.weight))
            .sum();

        if weight_sum == 0 {
            let idx = self.candidates.iter().position(in_tier)?;
            debug!(priority = tier, target = %self.candidates[idx].target_name, "Selected zero-weight candidate");
            return Some(CandidateId(idx));
        }

        let draw = self.rng.u32(0..=weight_sum);
        let mut running = 0u32;
        for (idx, candidate) in self.candidates.iter().enumerate() {
            if !in_tier(candidate) {
                continue;
            }
            running += u32::from(candidate.weight);
            if running >= draw {
                debug!(
                    priority = tier,
                    draw,
                    weight_sum,
                    target = %candidate.target_name,
                    "Selected weighted candidate"
                );
                return Some(CandidateId(idx));
            }
        }

        None
    }

    /// Drains a fresh iteration and returns the candidates in the order
    /// they would be probed.
    pub fn selection_order(&mut self) -> Vec<SrvCandidate> {
        let mut order = Vec::with_capacity(self.candidates.len());
        let mut current = self.next(None);
        while let Some(id) = current {
            order.push(self.candidates[id.0].clone());
            current = self.next(Some(id));
        }
        order
    }
}

impl Default for CandidateDirectory {
    fn default() -> Self {
        Self::new()
    }
}
