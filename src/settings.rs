use crate::DEFAULT_ADDRESS;

/// Auswahl der Messkanäle, die kompensiert und ausgegeben werden.
///
/// Die Temperatur wird immer berechnet, da Druck und Feuchtigkeit von
/// `temp_fine` abhängen. Diese Auswahl wird nicht an den Sensor übertragen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channels {
    /// Luftdruck kompensieren.
    pub pressure: bool,
    /// Luftfeuchtigkeit kompensieren (liest zwei zusätzliche Register).
    pub humidity: bool,
}

impl Channels {
    /// Temperatur, Druck und Feuchtigkeit.
    pub const fn all() -> Self {
        Self {
            pressure: true,
            humidity: true,
        }
    }

    /// Nur Temperatur.
    pub const fn temperature_only() -> Self {
        Self {
            pressure: false,
            humidity: false,
        }
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::all()
    }
}

/// Vollständiges Konfigurationsobjekt für den BME68x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// I²C-Adresse des Sensors (`0x76` oder `0x77`).
    pub address: u8,
    /// Angeforderte Messkanäle.
    pub channels: Channels,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            channels: Channels::default(),
        }
    }
}

/// Komfortabler Builder zum Erstellen einer `Config`.
#[derive(Default)]
pub struct Bme68xBuilder {
    config: Config,
}

impl Bme68xBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setzt die I²C-Adresse.
    pub fn address(mut self, address: u8) -> Self {
        self.config.address = address;
        self
    }

    /// Aktiviert oder deaktiviert den Druckkanal.
    pub fn pressure(mut self, enabled: bool) -> Self {
        self.config.channels.pressure = enabled;
        self
    }

    /// Aktiviert oder deaktiviert den Feuchtigkeitskanal.
    pub fn humidity(mut self, enabled: bool) -> Self {
        self.config.channels.humidity = enabled;
        self
    }

    /// Finalisiert den Builder und gibt das `Config` Objekt zurück.
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDARY_ADDRESS;

    #[test]
    fn defaults_enable_everything() {
        let config = Bme68xBuilder::new().build();
        assert_eq!(config.address, 0x76);
        assert_eq!(config.channels, Channels::all());
    }

    #[test]
    fn builder_sets_fields() {
        let config = Bme68xBuilder::new()
            .address(SECONDARY_ADDRESS)
            .pressure(false)
            .humidity(true)
            .build();
        assert_eq!(config.address, 0x77);
        assert!(!config.channels.pressure);
        assert!(config.channels.humidity);
    }
}
