//! Decode cascade.
//!
//! Four strategies, cheapest and broadest first, evaluated strictly in order
//! until one yields a payload. Each step's failure is carried forward; when
//! every step comes back empty the last carried diagnostic is the outcome.

use crate::decoder::{DecodeAttemptConfig, DecodeProfiles, Decoder, Diagnostic};
use crate::models::{BitMatrix, PayloadResult};
use crate::utils::binarization::{ADAPTIVE_WINDOW, adaptive_binarize, histogram_binarize};
use crate::utils::grayscale::SamplingSurface;
use serde::Serialize;
use std::cell::OnceCell;
use std::fmt;
use tracing::{debug, trace};

/// Which binarizer a step reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarization {
    /// Global Otsu threshold, computed once and shared by three steps
    Histogram,
    /// Local mean threshold, only computed if the last step runs
    Adaptive,
}

/// How many symbols a step looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Every symbol in the frame
    Multi,
    /// The first symbol found
    Single,
}

/// Name of a cascade step, reported with a successful decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStage {
    /// Multi-symbol pass on the histogram matrix
    MultiSymbol,
    /// Single pass on the histogram matrix assuming a pure symbol
    PureSymbol,
    /// Single pass on the histogram matrix
    Standard,
    /// Single pass on the adaptive matrix
    AlternateBinarization,
}

impl fmt::Display for CascadeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeStage::MultiSymbol => write!(f, "multi-symbol"),
            CascadeStage::PureSymbol => write!(f, "pure-symbol"),
            CascadeStage::Standard => write!(f, "standard"),
            CascadeStage::AlternateBinarization => write!(f, "alternate-binarization"),
        }
    }
}

/// One `(configuration, matrix builder)` entry of the cascade
#[derive(Debug, Clone, Copy)]
pub struct CascadeStep {
    /// Step name
    pub stage: CascadeStage,
    /// Symbol count sought
    pub pass: Pass,
    /// Matrix the step decodes
    pub binarization: Binarization,
    /// Decoder configuration
    pub config: DecodeAttemptConfig,
}

/// The fixed cascade order
pub fn cascade_steps(profiles: &DecodeProfiles) -> [CascadeStep; 4] {
    [
        CascadeStep {
            stage: CascadeStage::MultiSymbol,
            pass: Pass::Multi,
            binarization: Binarization::Histogram,
            config: profiles.standard,
        },
        CascadeStep {
            stage: CascadeStage::PureSymbol,
            pass: Pass::Single,
            binarization: Binarization::Histogram,
            config: profiles.pure,
        },
        CascadeStep {
            stage: CascadeStage::Standard,
            pass: Pass::Single,
            binarization: Binarization::Histogram,
            config: profiles.standard,
        },
        CascadeStep {
            stage: CascadeStage::AlternateBinarization,
            pass: Pass::Single,
            binarization: Binarization::Adaptive,
            config: profiles.standard,
        },
    ]
}

/// Successful cascade outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    /// Payloads in discovery order, never empty
    pub payloads: Vec<PayloadResult>,
    /// Step that produced them
    pub stage: CascadeStage,
}

/// Binarized views of one surface, each built at most once
struct Matrices<'a> {
    surface: &'a SamplingSurface,
    histogram: OnceCell<BitMatrix>,
    adaptive: OnceCell<BitMatrix>,
}

impl<'a> Matrices<'a> {
    fn new(surface: &'a SamplingSurface) -> Self {
        Self {
            surface,
            histogram: OnceCell::new(),
            adaptive: OnceCell::new(),
        }
    }

    fn get(&self, binarization: Binarization) -> &BitMatrix {
        match binarization {
            Binarization::Histogram => self
                .histogram
                .get_or_init(|| histogram_binarize(self.surface)),
            Binarization::Adaptive => self
                .adaptive
                .get_or_init(|| adaptive_binarize(self.surface, ADAPTIVE_WINDOW)),
        }
    }
}

impl CascadeStep {
    fn run<D: Decoder + ?Sized>(
        &self,
        decoder: &D,
        matrices: &Matrices<'_>,
    ) -> Result<Vec<PayloadResult>, Diagnostic> {
        let bits = matrices.get(self.binarization);
        match self.pass {
            Pass::Multi => decoder.decode_all(bits, &self.config),
            Pass::Single => decoder.decode_one(bits, &self.config).map(|p| vec![p]),
        }
    }
}

/// Run the cascade over one surface.
///
/// Stops at the first step with a non-empty result. Otherwise returns the
/// most recent step diagnostic, or a generic not-found if no step produced
/// one.
pub fn run_cascade<D: Decoder + ?Sized>(
    surface: &SamplingSurface,
    decoder: &D,
    profiles: &DecodeProfiles,
) -> Result<Decoded, Diagnostic> {
    let matrices = Matrices::new(surface);
    let mut carried: Option<Diagnostic> = None;

    for step in cascade_steps(profiles) {
        match step.run(decoder, &matrices) {
            Ok(payloads) if !payloads.is_empty() => {
                debug!(stage = %step.stage, count = payloads.len(), "cascade step decoded");
                return Ok(Decoded {
                    payloads,
                    stage: step.stage,
                });
            }
            Ok(_) => trace!(stage = %step.stage, "cascade step found nothing"),
            Err(diagnostic) => {
                trace!(stage = %step.stage, %diagnostic, "cascade step failed");
                carried = Some(diagnostic);
            }
        }
    }

    Err(carried.unwrap_or_else(Diagnostic::not_found))
}
