//! Channel and frequency conversion

/// Wi-Fi frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Ghz2_4,
    Ghz5,
    Ghz6,
}

impl Band {
    /// Band a frequency (MHz) falls into
    pub fn of(frequency: u32) -> Option<Band> {
        match frequency {
            2401..=2495 => Some(Band::Ghz2_4),
            4910..=5895 => Some(Band::Ghz5),
            5925..=7125 => Some(Band::Ghz6),
            _ => None,
        }
    }

    /// Channel-number origin in MHz
    fn base(self) -> u32 {
        match self {
            Band::Ghz2_4 => 2407,
            Band::Ghz5 => 5000,
            Band::Ghz6 => 5950,
        }
    }
}

/// Convert frequency (MHz) to channel number
pub fn frequency_to_channel(frequency: u32) -> Option<u32> {
    match Band::of(frequency)? {
        Band::Ghz2_4 if frequency == 2484 => Some(14),
        Band::Ghz6 if frequency == 5935 => Some(2),
        band => {
            let offset = frequency.checked_sub(band.base())?;
            (offset % 5 == 0).then_some(offset / 5)
        }
    }
}

/// Convert channel number to its center frequency (MHz) within a band
pub fn channel_to_frequency(channel: u32, band: Band) -> u32 {
    match (band, channel) {
        (Band::Ghz2_4, 14) => 2484,
        (Band::Ghz6, 2) => 5935,
        (band, channel) => band.base() + channel * 5,
    }
}
