use crate::shared::entities::{ExpressionSample, SessionPhase};

/// Buffer of per-frame classifications for the current analysis window.
/// Owned by the coordinator; handed to the resolver by reference only.
pub struct ExpressionSampler {
    buf: Vec<ExpressionSample>,
}

impl ExpressionSampler {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends iff the session is analyzing. Stray frames arriving after
    /// window close must not corrupt the next decision, so anything else
    /// is a no-op. Returns whether the sample was accepted.
    pub fn record(&mut self, phase: SessionPhase, sample: ExpressionSample) -> bool {
        if phase != SessionPhase::Analyzing {
            return false;
        }
        self.buf.push(sample);
        true
    }

    pub fn samples(&self) -> &[ExpressionSample] {
        &self.buf
    }

    /// Wholesale clear at a phase boundary. Never partially consumed.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for ExpressionSampler {
    fn default() -> Self {
        Self::new()
    }
}
