//! Bosch compensation formulas for the BME68x TPH channels.
//!
//! Temperature and humidity use the integer reference code, pressure the
//! double precision one. The two are kept as Bosch ships them so results match
//! the vendor API bit for bit.

use crate::{CalcTempData, CalibData};

/// Upper bound of the humidity output, 100 %rH.
const HUM_MAX: i64 = 100_000;

impl CalibData {
    /// Converts the raw temperature ADC code to centi-degrees Celsius
    /// (5123 = 51.23 °C).
    ///
    /// `temp_fine` must be computed even if only pressure or humidity is
    /// wanted: both formulas depend on it. Intermediates are 64 bit wide.
    pub fn calc_temp(&self, temp_adc: u32) -> CalcTempData {
        let var1 = ((temp_adc as i64) >> 3) - ((self.par_t1 as i64) << 1);
        let var2 = (var1 * self.par_t2 as i64) >> 11;
        let var3 = (((var1 >> 1) * (var1 >> 1)) >> 12) * ((self.par_t3 as i64) << 4) >> 14;
        let temp_fine = var2 + var3;

        CalcTempData {
            temp_fine: temp_fine as i32,
            temp_comp: ((temp_fine * 5 + 128) >> 8) as i32,
        }
    }

    /// Converts the raw pressure ADC code to Pascal (96386.2 = 963.862 hPa).
    ///
    /// When the denominator truncates to zero the result is exactly `0.0`,
    /// the same value the Bosch floating point API returns. It is not an error.
    pub fn calc_pres(&self, press_adc: u32, t_fine: i32) -> f64 {
        let mut var1 = (t_fine as f64 / 2.0) - 64000.0;
        let mut var2 = var1 * var1 * (self.par_p6 as f64 / 131072.0);
        var2 += var1 * self.par_p5 as f64 * 2.0;
        var2 = (var2 / 4.0) + (self.par_p4 as f64 * 65536.0);
        var1 = (((self.par_p3 as f64 * var1 * var1) / 16384.0) + (self.par_p2 as f64 * var1))
            / 524288.0;
        var1 = (1.0 + (var1 / 32768.0)) * self.par_p1 as f64;

        if var1 as i32 == 0 {
            warn!("pressure compensation denominator is zero, reporting 0 Pa");
            return 0.0;
        }

        let mut press_comp = 1048576.0 - press_adc as f64;
        press_comp = ((press_comp - (var2 / 4096.0)) * 6250.0) / var1;
        let var1 = (self.par_p9 as f64 * press_comp * press_comp) / 2147483648.0;
        let var2 = press_comp * (self.par_p8 as f64 / 32768.0);
        let var3 = (press_comp / 256.0)
            * (press_comp / 256.0)
            * (press_comp / 256.0)
            * (self.par_p10 as f64 / 131072.0);

        press_comp + (var1 + var2 + var3 + (self.par_p7 as f64 * 128.0)) / 16.0
    }

    /// Converts the raw humidity ADC code. The result is limited to
    /// `0..=100_000`; values outside are clamped, not reported.
    pub fn calc_hum(&self, hum_adc: u16, t_fine: i32) -> u32 {
        let temp_scaled = ((t_fine as i64 * 5) + 128) >> 8;

        let var1 = (hum_adc as i64 - ((self.par_h1 as i64) << 4))
            - (((temp_scaled * self.par_h3 as i64) / 100) >> 1);
        let var2 = (self.par_h2 as i64
            * (((temp_scaled * self.par_h4 as i64) / 100)
                + (((temp_scaled * ((temp_scaled * self.par_h5 as i64) / 100)) >> 6) / 100)
                + (1 << 14)))
            >> 10;
        let var3 = var1 * var2;
        let var4 = (((self.par_h6 as i64) << 7) + ((temp_scaled * self.par_h7 as i64) / 100)) >> 4;
        let var5 = ((var3 >> 14) * (var3 >> 14)) >> 10;
        let var6 = (var4 * var5) >> 1;
        let hum_comp = (((var3 + var6) >> 10) * 1000) >> 12;

        if !(0..=HUM_MAX).contains(&hum_comp) {
            trace!("humidity {} out of range, clamped", hum_comp);
        }
        hum_comp.clamp(0, HUM_MAX) as u32
    }
}
