use crate::error::{self, CalibBlock, CalibrationSizeError};
use crate::interface::RegisterRead;
use crate::{calib_mem, Bme68xError};

/// Factory-fused calibration coefficients read from the sensor.
/// These are unique to every individual chip and required for compensation formulas.
///
/// Built once from the two calibration memory blocks and never modified
/// afterwards. If the memory is read again, build a new value.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibData {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    /// 12 bit value.
    pub par_h1: u16,
    /// 12 bit value.
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
}

fn le_u16(lsb: u8, msb: u8) -> u16 {
    (lsb as u16) | ((msb as u16) << 8)
}

fn le_i16(lsb: u8, msb: u8) -> i16 {
    le_u16(lsb, msb) as i16
}

/// `par_h1`: low nibble of the shared byte, upper eight bits from `msb`.
fn h1_from(shared: u8, msb: u8) -> u16 {
    ((shared & 0x0F) as u16) | ((msb as u16) << 4)
}

/// `par_h2`: high nibble of the shared byte, upper eight bits from `msb`.
fn h2_from(shared: u8, msb: u8) -> u16 {
    ((shared >> 4) as u16) | ((msb as u16) << 4)
}

impl CalibData {
    /// Decodes the coefficients from the two calibration blocks.
    ///
    /// `tph` is the block starting at `0x8A` (at least 23 bytes), `hum` the block
    /// starting at `0xE1` (at least 10 bytes; `par_t1` sits at its end).
    /// Lengths are checked before any byte is looked at.
    pub fn from_blocks(tph: &[u8], hum: &[u8]) -> Result<Self, CalibrationSizeError> {
        if tph.len() < calib_mem::TPH_SIZE {
            return Err(CalibrationSizeError {
                block: CalibBlock::Tph,
                required: calib_mem::TPH_SIZE,
                actual: tph.len(),
            });
        }
        if hum.len() < calib_mem::HUM_SIZE {
            return Err(CalibrationSizeError {
                block: CalibBlock::Humidity,
                required: calib_mem::HUM_SIZE,
                actual: hum.len(),
            });
        }

        // See BME680 datasheet, Section 3.11.1. Offsets into `hum` are relative
        // to 0xE1; `par_t1` lives at 0xE9/0xEA.
        Ok(CalibData {
            par_t1: le_u16(hum[8], hum[9]),
            par_t2: le_i16(tph[0], tph[1]),
            par_t3: tph[2] as i8,
            par_p1: le_u16(tph[4], tph[5]),
            par_p2: le_i16(tph[6], tph[7]),
            par_p3: tph[8] as i8,
            par_p4: le_i16(tph[10], tph[11]),
            par_p5: le_i16(tph[12], tph[13]),
            par_p7: tph[14] as i8,
            par_p6: tph[15] as i8,
            par_p8: le_i16(tph[18], tph[19]),
            par_p9: le_i16(tph[20], tph[21]),
            par_p10: tph[22],
            par_h1: h1_from(hum[1], hum[2]),
            par_h2: h2_from(hum[1], hum[0]),
            par_h3: hum[3] as i8,
            par_h4: hum[4] as i8,
            par_h5: hum[5] as i8,
            par_h6: hum[6],
            par_h7: hum[7] as i8,
        })
    }
}

/// Reads factory-fused calibration coefficients from the sensor's ROM.
///
/// The BME68x stores calibration data in two non-contiguous memory blocks;
/// each is fetched with one burst read.
pub fn read_calibration<R: RegisterRead>(bus: &mut R) -> error::Result<CalibData, R::Error> {
    let mut tph = [0u8; calib_mem::TPH_SIZE];
    let mut hum = [0u8; calib_mem::HUM_SIZE];

    bus.read_register(calib_mem::TPH_ADDR, &mut tph)
        .map_err(Bme68xError::Transport)?;
    bus.read_register(calib_mem::HUM_ADDR, &mut hum)
        .map_err(Bme68xError::Transport)?;

    let calib = CalibData::from_blocks(&tph, &hum)?;
    debug!(
        "calibration loaded: t1={} t2={} t3={} p1={}",
        calib.par_t1,
        calib.par_t2,
        calib.par_t3,
        calib.par_p1
    );
    Ok(calib)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use crate::interface::I2cInterface;

    /// Calibration memory of a real BME680.
    pub const TPH_BLOCK: [u8; 23] = [
        0x02, 0x67, 0x03, 0x00, 0x67, 0x8A, 0x76, 0xD7, 0x58, 0x00, 0xAC, 0x1B, 0x53, 0xFF,
        0x27, 0x1E, 0x00, 0x00, 0x60, 0xF5, 0xB5, 0xF2, 0x1E,
    ];
    pub const HUM_BLOCK: [u8; 10] = [0x40, 0x46, 0x30, 0x00, 0x2D, 0x14, 0x78, 0x9C, 0x0D, 0x66];

    pub fn reference_calib() -> CalibData {
        CalibData {
            par_t1: 26125,
            par_t2: 26370,
            par_t3: 3,
            par_p1: 35431,
            par_p2: -10378,
            par_p3: 88,
            par_p4: 7084,
            par_p5: -173,
            par_p6: 30,
            par_p7: 39,
            par_p8: -2720,
            par_p9: -3403,
            par_p10: 30,
            par_h1: 774,
            par_h2: 1028,
            par_h3: 0,
            par_h4: 45,
            par_h5: 20,
            par_h6: 120,
            par_h7: -100,
        }
    }

    /// Every offset gets a distinct byte so a misplaced index shows up.
    fn synthetic_blocks() -> ([u8; 23], [u8; 10]) {
        let mut tph = [0u8; 23];
        for (i, b) in tph.iter_mut().enumerate() {
            *b = 0x80 + i as u8;
        }
        let hum = [0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6, 0x07, 0x98, 0x29, 0x3A];
        (tph, hum)
    }

    #[test]
    fn decodes_reference_memory() {
        let calib = CalibData::from_blocks(&TPH_BLOCK, &HUM_BLOCK).unwrap();
        assert_eq!(calib, reference_calib());
    }

    #[test]
    fn temperature_coefficients() {
        let (tph, hum) = synthetic_blocks();
        let calib = CalibData::from_blocks(&tph, &hum).unwrap();
        assert_eq!(calib.par_t1, 0x3A29);
        assert_eq!(calib.par_t2, 0x8180u16 as i16);
        assert_eq!(calib.par_t3, 0x82u8 as i8);
    }

    #[test]
    fn pressure_coefficients() {
        let (tph, hum) = synthetic_blocks();
        let calib = CalibData::from_blocks(&tph, &hum).unwrap();
        assert_eq!(calib.par_p1, 0x8584);
        assert_eq!(calib.par_p2, 0x8786u16 as i16);
        assert_eq!(calib.par_p3, 0x88u8 as i8);
        assert_eq!(calib.par_p4, 0x8B8Au16 as i16);
        assert_eq!(calib.par_p5, 0x8D8Cu16 as i16);
        assert_eq!(calib.par_p6, 0x8Fu8 as i8);
        assert_eq!(calib.par_p7, 0x8Eu8 as i8);
        assert_eq!(calib.par_p8, 0x9392u16 as i16);
        assert_eq!(calib.par_p9, 0x9594u16 as i16);
        assert_eq!(calib.par_p10, 0x96);
    }

    #[test]
    fn humidity_nibble_split() {
        let (tph, hum) = synthetic_blocks();
        let calib = CalibData::from_blocks(&tph, &hum).unwrap();
        // hum[1] = 0xB2: low nibble 0x2 belongs to h1, high nibble 0xB to h2.
        assert_eq!(calib.par_h1, 0xC32);
        assert_eq!(calib.par_h2, 0xA1B);
        assert_eq!(h1_from(0xFF, 0x00), 0x00F);
        assert_eq!(h2_from(0xFF, 0x00), 0x00F);
        assert_eq!(h1_from(0x0F, 0xFF), 0xFFF);
        assert_eq!(h2_from(0x0F, 0xFF), 0xFF0);
    }

    #[test]
    fn humidity_coefficients() {
        let (tph, hum) = synthetic_blocks();
        let calib = CalibData::from_blocks(&tph, &hum).unwrap();
        assert_eq!(calib.par_h3, 0xD4u8 as i8);
        assert_eq!(calib.par_h4, 0xE5u8 as i8);
        assert_eq!(calib.par_h5, 0xF6u8 as i8);
        assert_eq!(calib.par_h6, 0x07);
        assert_eq!(calib.par_h7, 0x98u8 as i8);
    }

    #[test]
    fn rejects_short_tph_block() {
        let err = CalibData::from_blocks(&TPH_BLOCK[..22], &HUM_BLOCK).unwrap_err();
        assert_eq!(
            err,
            CalibrationSizeError {
                block: CalibBlock::Tph,
                required: 23,
                actual: 22,
            }
        );
    }

    #[test]
    fn rejects_short_humidity_block() {
        let err = CalibData::from_blocks(&TPH_BLOCK, &HUM_BLOCK[..9]).unwrap_err();
        assert_eq!(err.block, CalibBlock::Humidity);
        assert_eq!(err.actual, 9);

        let err = CalibData::from_blocks(&TPH_BLOCK, &[]).unwrap_err();
        assert_eq!(err.block, CalibBlock::Humidity);
    }

    #[test]
    fn longer_blocks_are_accepted() {
        let mut tph = [0u8; 25];
        tph[..23].copy_from_slice(&TPH_BLOCK);
        let mut hum = [0xFFu8; 16];
        hum[..10].copy_from_slice(&HUM_BLOCK);
        assert_eq!(CalibData::from_blocks(&tph, &hum).unwrap(), reference_calib());
    }

    #[test]
    fn reads_both_blocks_from_the_bus() {
        let i2c = I2cMock::new(&[
            I2cTransaction::write_read(0x76, vec![0x8A], TPH_BLOCK.to_vec()),
            I2cTransaction::write_read(0x76, vec![0xE1], HUM_BLOCK.to_vec()),
        ]);
        let mut bus = I2cInterface::new(i2c, 0x76);
        assert_eq!(read_calibration(&mut bus).unwrap(), reference_calib());

        bus.release().done();
    }

    #[test]
    fn bus_failure_aborts_calibration() {
        let i2c = I2cMock::new(&[I2cTransaction::write_read(0x76, vec![0x8A], TPH_BLOCK.to_vec())
            .with_error(ErrorKind::Other)]);
        let mut bus = I2cInterface::new(i2c, 0x76);
        let err = read_calibration(&mut bus).unwrap_err();
        assert!(matches!(
            err,
            Bme68xError::Transport(ErrorKind::Other)
        ));

        bus.release().done();
    }
}
