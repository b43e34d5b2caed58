//! Cognitive-trace display derivation
//!
//! The trace monitor holds the most recent [`CognitiveTrace`] and derives
//! everything the display layer needs from it: which layer is active, whether
//! the request is still in flight, and the latency/confidence severity bands.
//! Each update replaces the snapshot wholesale; there is no history.

use crate::types::{CognitiveTrace, TraceLayer, TraceStatus};

/// Latency severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBand {
    /// < 500 ms
    Nominal,
    /// [500, 2000) ms
    Elevated,
    /// >= 2000 ms
    Severe,
}

impl LatencyBand {
    /// Classify a latency. Boundary values belong to the upper band.
    pub fn classify(latency_ms: f64) -> Self {
        if latency_ms < 500.0 {
            LatencyBand::Nominal
        } else if latency_ms < 2000.0 {
            LatencyBand::Elevated
        } else {
            LatencyBand::Severe
        }
    }
}

/// Confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// >= 0.8
    High,
    /// [0.5, 0.8)
    Medium,
    /// < 0.5
    Low,
}

impl ConfidenceBand {
    /// Classify a confidence value. Boundary values belong to the upper band.
    pub fn classify(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceBand::High
        } else if confidence >= 0.5 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

impl CognitiveTrace {
    /// True while the traced request is still producing output.
    pub fn is_processing(&self) -> bool {
        matches!(self.status, TraceStatus::Processing | TraceStatus::Streaming)
    }

    /// Latency severity band for display coloring.
    pub fn latency_band(&self) -> LatencyBand {
        LatencyBand::classify(self.latency_ms)
    }

    /// Confidence band, when the trace reported a confidence.
    pub fn confidence_band(&self) -> Option<ConfidenceBand> {
        self.confidence.map(ConfidenceBand::classify)
    }
}

/// Holds the latest trace update for one observability surface.
#[derive(Debug, Clone, Default)]
pub struct TraceMonitor {
    latest: Option<CognitiveTrace>,
}

impl TraceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trace update, replacing the previous snapshot.
    pub fn apply(&mut self, trace: CognitiveTrace) {
        self.latest = Some(trace);
    }

    /// Most recent trace, if any update has arrived.
    pub fn latest(&self) -> Option<&CognitiveTrace> {
        self.latest.as_ref()
    }

    /// True if `layer` is the layer of the latest trace.
    pub fn is_layer_active(&self, layer: TraceLayer) -> bool {
        self.latest.as_ref().is_some_and(|t| t.layer == layer)
    }

    /// True while the latest traced request is still in flight.
    pub fn is_processing(&self) -> bool {
        self.latest.as_ref().is_some_and(CognitiveTrace::is_processing)
    }
}
