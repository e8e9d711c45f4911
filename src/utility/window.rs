//! Fixed-length, non-overlapping assessment windows and top-K peak selection.

use std::cmp::Ordering;

use thiserror::Error;

use super::types::Timeslot;

/// Lifecycle of an assessment window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Collecting snapshots.
    Open,
    /// Peaks selected; never revisited.
    Assessed,
}

/// A timeslot selected as one of its window's largest loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePeak {
    /// Timeslot of the peak.
    pub timeslot: Timeslot,
    /// Total usage magnitude at that timeslot (kWh).
    pub total_magnitude: f64,
}

/// Error returned when a window is assessed a second time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assessment window starting at timeslot {start:?} was already assessed")]
pub struct AlreadyAssessed {
    /// First timeslot of the window.
    pub start: Option<Timeslot>,
}

/// A block of `length` consecutive activations evaluated together once complete.
///
/// Slots are filled per `push`, so gaps between timeslot numbers do not
/// shorten or lengthen a window.
///
/// Each slot holds the tick's total usage magnitude, or `None` when no
/// broker reported data.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentWindow {
    length: usize,
    slots: Vec<(Timeslot, Option<f64>)>,
    state: WindowState,
}

impl AssessmentWindow {
    /// Creates an open, empty window of `length` ticks.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            slots: Vec::with_capacity(length),
            state: WindowState::Open,
        }
    }

    /// First timeslot collected, once any.
    pub fn start(&self) -> Option<Timeslot> {
        self.slots.first().map(|(t, _)| *t)
    }

    /// Configured window length in ticks.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of ticks collected so far.
    pub fn collected(&self) -> usize {
        self.slots.len()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Returns `true` once `length` ticks have been collected.
    pub fn is_complete(&self) -> bool {
        self.slots.len() >= self.length
    }

    /// Appends one tick. Ignored once the window is complete or assessed.
    pub fn push(&mut self, timeslot: Timeslot, total_magnitude: Option<f64>) {
        if self.state == WindowState::Open && !self.is_complete() {
            self.slots.push((timeslot, total_magnitude));
        }
    }

    /// Selects up to `count` peaks and marks the window assessed.
    ///
    /// Peaks are ordered by descending magnitude; equal magnitudes keep the
    /// earliest timeslot first. Ticks without data are never peaks.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyAssessed`] if the window was assessed before.
    pub fn assess(&mut self, count: usize) -> Result<Vec<CandidatePeak>, AlreadyAssessed> {
        if self.state == WindowState::Assessed {
            return Err(AlreadyAssessed {
                start: self.start(),
            });
        }
        self.state = WindowState::Assessed;

        let mut candidates: Vec<CandidatePeak> = self
            .slots
            .iter()
            .filter_map(|&(timeslot, magnitude)| {
                magnitude.map(|total_magnitude| CandidatePeak {
                    timeslot,
                    total_magnitude,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.total_magnitude
                .partial_cmp(&a.total_magnitude)
                .unwrap_or(Ordering::Equal)
                .then(a.timeslot.cmp(&b.timeslot))
        });
        candidates.truncate(count);
        Ok(candidates)
    }
}

/// Peaks selected from one assessed window.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessedWindow {
    /// First timeslot of the window.
    pub start: Option<Timeslot>,
    /// Last timeslot of the window.
    pub end: Option<Timeslot>,
    /// Selected peaks, largest first.
    pub peaks: Vec<CandidatePeak>,
}

/// Drives consecutive assessment windows.
///
/// # Examples
///
/// ```
/// use du_sim::utility::window::PeakWindowAssessor;
///
/// let mut assessor = PeakWindowAssessor::new(2, 1);
/// assert!(assessor.take_due().is_none());
/// assessor.push(4, Some(9.0));
/// assessor.push(5, Some(14.5));
/// let window = assessor.take_due().expect("window of two ticks is complete");
/// assert_eq!(window.peaks[0].timeslot, 5);
/// ```
#[derive(Debug, Clone)]
pub struct PeakWindowAssessor {
    interval: usize,
    count: usize,
    open: AssessmentWindow,
    assessed: usize,
}

impl PeakWindowAssessor {
    /// Creates an assessor for windows of `interval` ticks, billing `count` peaks each.
    pub fn new(interval: usize, count: usize) -> Self {
        Self {
            interval,
            count,
            open: AssessmentWindow::new(interval),
            assessed: 0,
        }
    }

    /// The window currently collecting ticks.
    pub fn open_window(&self) -> &AssessmentWindow {
        &self.open
    }

    /// Number of windows assessed so far.
    pub fn windows_assessed(&self) -> usize {
        self.assessed
    }

    /// Appends one tick to the open window.
    pub fn push(&mut self, timeslot: Timeslot, total_magnitude: Option<f64>) {
        self.open.push(timeslot, total_magnitude);
    }

    /// Assesses the open window if it is complete and opens the next one.
    ///
    /// Returns `None` while the open window is still collecting.
    pub fn take_due(&mut self) -> Option<AssessedWindow> {
        if !self.open.is_complete() {
            return None;
        }
        let mut window = std::mem::replace(&mut self.open, AssessmentWindow::new(self.interval));
        // a freshly rotated window cannot have been assessed before
        let peaks = window.assess(self.count).ok()?;
        self.assessed += 1;
        Some(AssessedWindow {
            start: window.start(),
            end: window.slots.last().map(|(t, _)| *t),
            peaks,
        })
    }
}
