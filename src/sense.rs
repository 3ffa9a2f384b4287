//! One measurement cycle: burst read, ADC extraction, compensation, scaling.
//!
//! Every function here performs bus reads and assumes the caller has exclusive
//! use of the device for the whole call. Taking the bus as `&mut R` makes that
//! exclusivity visible; no locking happens in this crate.

use crate::error::{self, Bme68xError};
use crate::interface::RegisterRead;
use crate::settings::Channels;
use crate::{
    raw_data_mem, regs, status_mem, CalibData, Compensate, Humidity, Measurement, Pressure,
    RawData, Temperature,
};

impl RawData {
    /// Reconstructs the 20 bit pressure and temperature codes from the six
    /// registers at `0x1F` and, if given, the 16 bit humidity code from the two
    /// that follow.
    pub fn from_registers(tp: &[u8; raw_data_mem::SIZE], hum: Option<[u8; 2]>) -> Self {
        let press_adc = ((tp[0] as u32) << 12) | ((tp[1] as u32) << 4) | ((tp[2] as u32) >> 4);
        let temp_adc = ((tp[3] as u32) << 12) | ((tp[4] as u32) << 4) | ((tp[5] as u32) >> 4);

        RawData {
            press_adc,
            temp_adc,
            hum_adc: hum.map(u16::from_be_bytes),
        }
    }

    /// Like [`RawData::from_registers`] for a block of unknown length: 6 bytes
    /// give pressure and temperature, 8 or more add humidity. `None` if the
    /// block is shorter than 6 bytes.
    pub fn from_slice(buffer: &[u8]) -> Option<Self> {
        let tp: &[u8; raw_data_mem::SIZE] = buffer.get(..raw_data_mem::SIZE)?.try_into().ok()?;
        let hum = match buffer.get(raw_data_mem::SIZE..raw_data_mem::SIZE_WITH_HUM) {
            Some(&[msb, lsb]) => Some([msb, lsb]),
            _ => None,
        };

        Some(Self::from_registers(tp, hum))
    }
}

impl Compensate for CalibData {
    fn compensate(&self, raw: &RawData, channels: Channels) -> Measurement {
        // Temperature always runs first: pressure and humidity need `temp_fine`.
        let temp = self.calc_temp(raw.temp_adc);

        let pres = if channels.pressure {
            Some(Pressure::from_pascal(self.calc_pres(raw.press_adc, temp.temp_fine)))
        } else {
            None
        };

        let hum = match (channels.humidity, raw.hum_adc) {
            (true, Some(hum_adc)) => Some(Humidity::from_q22_10(
                self.calc_hum(hum_adc, temp.temp_fine),
            )),
            _ => None,
        };

        Measurement {
            temp: Temperature::from_centi_celsius(temp.temp_comp),
            pres,
            hum,
        }
    }
}

/// Reads the data registers once and returns the compensated measurement.
///
/// Exactly one burst read is issued: 6 bytes when humidity is not requested,
/// 8 bytes otherwise. A bus error aborts the cycle and is returned as is.
pub fn read_measurement<R, C>(
    bus: &mut R,
    calib: &C,
    channels: Channels,
) -> error::Result<Measurement, R::Error>
where
    R: RegisterRead,
    C: Compensate,
{
    let mut buffer = [0u8; raw_data_mem::SIZE_WITH_HUM];
    let len = if channels.humidity {
        raw_data_mem::SIZE_WITH_HUM
    } else {
        raw_data_mem::SIZE
    };

    if let Err(e) = bus.read_register(raw_data_mem::ADDR, &mut buffer[..len]) {
        debug!("measurement read failed");
        return Err(Bme68xError::Transport(e));
    }

    let [p0, p1, p2, t0, t1, t2, h0, h1] = buffer;
    let hum = if channels.humidity { Some([h0, h1]) } else { None };
    let raw = RawData::from_registers(&[p0, p1, p2, t0, t1, t2], hum);
    trace!(
        "raw adc: press={} temp={} hum={}",
        raw.press_adc,
        raw.temp_adc,
        raw.hum_adc.unwrap_or(0)
    );

    Ok(calib.compensate(&raw, channels))
}

/// Returns `true` once no TPH or gas conversion is running.
///
/// Only bits 2 to 5 of the status register are looked at.
pub fn is_idle<R: RegisterRead>(bus: &mut R) -> error::Result<bool, R::Error> {
    let mut status = [0u8; 1];
    bus.read_register(status_mem::ADDR, &mut status)
        .map_err(Bme68xError::Transport)?;

    Ok((status[0] & status_mem::MEASURING_MASK) == 0)
}

/// Reads the chip id register. A BME680 or BME688 answers [`crate::CHIP_ID`].
pub fn read_chip_id<R: RegisterRead>(bus: &mut R) -> error::Result<u8, R::Error> {
    let mut id = [0u8; 1];
    bus.read_register(regs::CHIP_ID, &mut id)
        .map_err(Bme68xError::Transport)?;

    Ok(id[0])
}
