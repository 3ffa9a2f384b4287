#![no_std]

//! # BME68x TPH Compensation
//!
//! A `no_std` driver core for the temperature, pressure and humidity channels
//! of the Bosch BME680 and BME688. The gas channel is not supported.
//!
//! The driver reads the factory calibration once, then turns each burst of
//! raw ADC registers into calibrated physical quantities with the Bosch
//! reference compensation code.
//!
//! ## Features
//! - **Flexible Channels**: Pressure and humidity can be left out of a reading;
//!   temperature is always compensated because the other two depend on it.
//! - **Bit-exact Compensation**: Integer arithmetic for temperature and
//!   humidity, double precision for pressure, exactly as the vendor API does.
//! - **Typestate Pattern**: Prevents measuring before calibration is loaded.
//! - **Transport Agnostic**: Anything implementing [`RegisterRead`] works; an
//!   `embedded-hal` I²C adapter is included.
//!
//! ## Units
//! - **Temperature**: Milli-Kelvin -> 324380 = 51.23 °C
//! - **Pressure**: Nano-Pascal -> 96386257812500 = 963.86 hPa
//! - **Humidity**: 0.0001 %rH -> 407460 = 40.746 %rH
//!
//! ## Concurrency
//! The sensor is a single-owner resource. Every bus access takes the register
//! reader by `&mut`, so the caller must hold whatever device lock it uses for
//! the duration of the call. Nothing here locks or retries.

#[cfg(test)]
#[macro_use]
extern crate std;

mod fmt;

mod calc;
pub mod calibration;
pub mod error;
pub mod interface;
pub mod sense;
pub mod settings;

use core::marker::PhantomData;
use embedded_hal::i2c;

pub use calibration::{read_calibration, CalibData};
pub use error::{Bme68xError, CalibBlock, CalibrationSizeError};
pub use interface::{I2cInterface, RegisterRead};
pub use sense::{is_idle, read_chip_id, read_measurement};
pub use settings::{Bme68xBuilder, Channels, Config};

/// Default I²C address (SDO pulled low).
pub const DEFAULT_ADDRESS: u8 = 0x76;
/// Alternative I²C address (SDO pulled high).
pub const SECONDARY_ADDRESS: u8 = 0x77;
/// Content of the chip id register for BME680 and BME688.
pub const CHIP_ID: u8 = 0x61;

/// Memory addresses and sizes for calibration data registers.
mod calib_mem {
    /// Temperature/pressure coefficients, `0x8A..=0xA0`.
    pub const TPH_ADDR: u8 = 0x8A;
    pub const TPH_SIZE: usize = 23;
    /// Humidity coefficients and `par_t1`, `0xE1..=0xEA`.
    pub const HUM_ADDR: u8 = 0xE1;
    pub const HUM_SIZE: usize = 10;
}

/// Memory address and size for the measurement data registers.
mod raw_data_mem {
    pub const ADDR: u8 = 0x1F;
    /// Pressure and temperature.
    pub const SIZE: usize = 6;
    /// Pressure, temperature and humidity.
    pub const SIZE_WITH_HUM: usize = 8;
}

/// Measurement status register (`meas_status_0`).
mod status_mem {
    pub const ADDR: u8 = 0x1D;
    /// Any of bits 2 to 5 set means a TPH or gas conversion is still running.
    pub const MEASURING_MASK: u8 = 0b0011_1100;
}

mod regs {
    pub const CHIP_ID: u8 = 0xD0;
}

// --- Typestates ---

/// Sensor has been created but calibration data has not been loaded.
#[derive(Debug)]
pub struct Uninitialized;
/// Calibration is loaded; measurements can be taken.
#[derive(Debug)]
pub struct Ready;

/// Raw ADC output read directly from the sensor registers.
///
/// Lives for one measurement cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawData {
    /// 20 bit pressure code.
    pub press_adc: u32,
    /// 20 bit temperature code.
    pub temp_adc: u32,
    /// 16 bit humidity code, only present when the humidity registers were read.
    pub hum_adc: Option<u16>,
}

/// Intermediate temperature values used for compensation.
///
/// These values are calculated during temperature compensation and are required
/// for the subsequent pressure and humidity compensation formulas (t_fine).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CalcTempData {
    pub temp_fine: i32,
    /// Centi-degrees Celsius.
    pub temp_comp: i32,
}

/// Absolute temperature in milli-Kelvin.
///
/// # Example
/// A value of `324380` represents **51.23 °C**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    /// 0 °C expressed in milli-Kelvin.
    pub const ZERO_CELSIUS: i32 = 273_150;

    pub fn from_centi_celsius(centi: i32) -> Self {
        Temperature(centi * 10 + Self::ZERO_CELSIUS)
    }

    pub fn as_centi_celsius(&self) -> i32 {
        (self.0 - Self::ZERO_CELSIUS) / 10
    }

    /// Splits the value into integral degrees Celsius and hundredths.
    ///
    /// # Example
    /// ```rust
    /// use bme68x_tph::Temperature;
    /// let temp = Temperature::from_centi_celsius(2350);
    /// assert_eq!(temp.split(), (23, 50)); // Represents 23.50 °C
    /// ```
    pub fn split(&self) -> (i32, i32) {
        let centi = self.as_centi_celsius();
        (centi / 100, centi % 100)
    }
}

/// Atmospheric pressure in nano-Pascal.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub i64);

impl Pressure {
    /// Converts a compensated Pascal value, keeping 8 fractional bits.
    ///
    /// The value is first fixed to 1/256 Pa and then scaled by 15625/4 so no
    /// precision is lost to a direct float-to-unit conversion.
    pub fn from_pascal(pascal: f64) -> Self {
        let fixed = (pascal * 256.0) as i64;
        Pressure(fixed.saturating_mul(15625 * 1000) / 4)
    }

    pub fn as_pascal(&self) -> f64 {
        self.0 as f64 / 1e9
    }

    /// Whole Pascal split into hPa and the remaining hundredths.
    ///
    /// # Example
    /// ```rust
    /// use bme68x_tph::Pressure;
    /// let press = Pressure::from_pascal(101325.0);
    /// assert_eq!(press.as_hpa(), (1013, 25)); // Represents 1013.25 hPa
    /// ```
    pub fn as_hpa(&self) -> (i64, i64) {
        let pascal = self.0 / 1_000_000_000;
        (pascal / 100, pascal % 100)
    }
}

/// Relative humidity in units of 0.0001 %rH (1_000_000 = 100 %rH).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub i32);

impl Humidity {
    /// Rescales the compensated humidity from base 1024 to base 1000.
    ///
    /// Compensation never yields more than `100_000`; larger inputs saturate
    /// at `i32::MAX`.
    pub fn from_q22_10(raw: u32) -> Self {
        Humidity(i32::try_from(raw as u64 * 10000 / 1024).unwrap_or(i32::MAX))
    }

    /// Splits the value into whole percent and four decimal places.
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 10000, self.0 % 10000)
    }
}

/// Compensated measurement result in physical units.
///
/// Pressure and humidity are `None` unless their channel was requested.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub temp: Temperature,
    pub pres: Option<Pressure>,
    pub hum: Option<Humidity>,
}

/// Produces an environmental reading from raw ADC codes.
///
/// Implemented by the coefficient set of a chip family. Sibling Bosch parts
/// use different register maps and formulas and implement this with their own
/// calibration type.
pub trait Compensate {
    fn compensate(&self, raw: &RawData, channels: Channels) -> Measurement;
}

/// The main BME68x driver structure.
///
/// Use `Bme68x::new(...)` to start. The `STATE` generic uses the Typestate pattern
/// to track whether calibration has been loaded.
#[derive(Debug)]
pub struct Bme68x<R, STATE> {
    bus: R,
    pub(crate) calib_data: CalibData,
    channels: Channels,
    _state: PhantomData<STATE>,
}

impl<I2C: i2c::I2c> Bme68x<I2cInterface<I2C>, Uninitialized> {
    /// Creates a new driver instance on an I²C bus in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self::with_interface(I2cInterface::new(i2c, config.address), config.channels)
    }
}

impl<R: RegisterRead> Bme68x<R, Uninitialized> {
    /// Creates a driver on top of any register reader.
    pub fn with_interface(bus: R, channels: Channels) -> Self {
        Bme68x {
            bus,
            calib_data: CalibData::default(),
            channels,
            _state: PhantomData,
        }
    }

    /// Verifies the chip id and loads the factory calibration data.
    ///
    /// This transitions the driver state from `Uninitialized` to `Ready`.
    ///
    /// # Errors
    /// [`Bme68xError::UnknownChip`] if the device is not a BME68x, or the bus error
    /// of the first failing read.
    pub fn init(mut self) -> error::Result<Bme68x<R, Ready>, R::Error> {
        let id = read_chip_id(&mut self.bus)?;
        if id != CHIP_ID {
            return Err(Bme68xError::UnknownChip(id));
        }

        let calib_data = read_calibration(&mut self.bus)?;

        Ok(Bme68x {
            bus: self.bus,
            calib_data,
            channels: self.channels,
            _state: PhantomData,
        })
    }
}

impl<R: RegisterRead> Bme68x<R, Ready> {
    /// Creates a ready driver from calibration data obtained elsewhere.
    pub fn with_calibration(bus: R, calib_data: CalibData, channels: Channels) -> Self {
        Bme68x {
            bus,
            calib_data,
            channels,
            _state: PhantomData,
        }
    }

    /// Reads the latest conversion results and returns compensated data.
    ///
    /// The caller must have exclusive access to the device for the duration of
    /// the call.
    pub fn sense(&mut self) -> error::Result<Measurement, R::Error> {
        read_measurement(&mut self.bus, &self.calib_data, self.channels)
    }

    /// Returns `true` if no measurement cycle is in progress.
    pub fn is_idle(&mut self) -> error::Result<bool, R::Error> {
        is_idle(&mut self.bus)
    }

    pub fn calib_data(&self) -> &CalibData {
        &self.calib_data
    }
}

impl<R, STATE> Bme68x<R, STATE> {
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Changes which channels subsequent readings include.
    pub fn set_channels(&mut self, channels: Channels) {
        self.channels = channels;
    }

    /// Destroys the driver and returns the register reader.
    pub fn release(self) -> R {
        self.bus
    }
}
