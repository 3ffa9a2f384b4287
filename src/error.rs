//! Error types for the BME68x driver.

use core::fmt;

/// Identifies one of the two factory calibration memory blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibBlock {
    /// Temperature/pressure block starting at `0x8A`.
    Tph,
    /// Humidity block starting at `0xE1` (also carries `par_t1`).
    Humidity,
}

/// A calibration buffer was shorter than the highest offset the parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSizeError {
    pub block: CalibBlock,
    pub required: usize,
    pub actual: usize,
}

impl fmt::Display for CalibrationSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} calibration block too short: {} bytes, need {}",
            self.block, self.actual, self.required
        )
    }
}

impl core::error::Error for CalibrationSizeError {}

/// Errors that can occur while talking to the sensor or decoding its memory.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bme68xError<E> {
    /// The register read failed. The bus error is passed through untouched.
    Transport(E),
    /// Calibration memory could not be decoded.
    CalibrationSize(CalibrationSizeError),
    /// The chip id register did not contain `0x61`.
    UnknownChip(u8),
}

impl<E> From<CalibrationSizeError> for Bme68xError<E> {
    fn from(e: CalibrationSizeError) -> Self {
        Bme68xError::CalibrationSize(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Bme68xError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bme68xError::Transport(e) => write!(f, "register read failed: {:?}", e),
            Bme68xError::CalibrationSize(e) => fmt::Display::fmt(e, f),
            Bme68xError::UnknownChip(id) => write!(f, "unexpected chip id {:#04x}", id),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Bme68xError<E> {}

/// Result type alias for BME68x operations.
pub type Result<T, E> = core::result::Result<T, Bme68xError<E>>;
