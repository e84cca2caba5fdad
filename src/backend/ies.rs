//! Information element decoding
//!
//! Derives the Wi-Fi standard, channel width and center frequencies an access
//! point operates with from the information elements of its beacon or scan
//! response.

use crate::core::{
    channel::{Band, channel_to_frequency},
    types::{ChannelWidth, WifiStandard},
};

const HT_CAPABILITIES: u8 = 45;
const HT_OPERATION: u8 = 61;
const VHT_CAPABILITIES: u8 = 191;
const VHT_OPERATION: u8 = 192;
const EXTENSION: u8 = 255;

const EXT_HE_CAPABILITIES: u8 = 35;
const EXT_HE_OPERATION: u8 = 36;
const EXT_EHT_OPERATION: u8 = 106;
const EXT_EHT_CAPABILITIES: u8 = 108;

/// HE operation parameter bits
const HE_VHT_OPERATION_PRESENT: u32 = 1 << 14;
const HE_CO_HOSTED_BSS: u32 = 1 << 15;
const HE_6GHZ_OPERATION_PRESENT: u32 = 1 << 17;

/// Radio parameters decoded from information elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioInfo {
    pub standard: WifiStandard,
    pub width: ChannelWidth,
    pub center_freq0: i32,
    pub center_freq1: i32,
}

/// Information elements present in a frame, by role
#[derive(Debug, Default)]
struct Elements<'a> {
    ht_capabilities: bool,
    vht_capabilities: bool,
    he_capabilities: bool,
    eht_capabilities: bool,
    ht_operation: Option<&'a [u8]>,
    vht_operation: Option<&'a [u8]>,
    he_operation: Option<&'a [u8]>,
    eht_operation: Option<&'a [u8]>,
}

impl<'a> Elements<'a> {
    /// Walk the id/length/payload list; a truncated tail is ignored
    fn parse(mut ies: &'a [u8]) -> Self {
        let mut elements = Elements::default();

        while ies.len() >= 2 {
            let id = ies[0];
            let len = ies[1] as usize;
            let Some(body) = ies.get(2..2 + len) else {
                break;
            };
            ies = &ies[2 + len..];

            match id {
                HT_CAPABILITIES => elements.ht_capabilities = true,
                VHT_CAPABILITIES => elements.vht_capabilities = true,
                HT_OPERATION => elements.ht_operation = Some(body),
                VHT_OPERATION => elements.vht_operation = Some(body),
                EXTENSION => match body.split_first() {
                    Some((&EXT_HE_CAPABILITIES, _)) => elements.he_capabilities = true,
                    Some((&EXT_EHT_CAPABILITIES, _)) => elements.eht_capabilities = true,
                    Some((&EXT_HE_OPERATION, rest)) => elements.he_operation = Some(rest),
                    Some((&EXT_EHT_OPERATION, rest)) => elements.eht_operation = Some(rest),
                    _ => {}
                },
                _ => {}
            }
        }

        elements
    }

    fn standard(&self, band: Option<Band>) -> WifiStandard {
        if self.eht_capabilities {
            WifiStandard::Ieee80211be
        } else if self.he_capabilities {
            WifiStandard::Ieee80211ax
        } else if self.vht_capabilities && band == Some(Band::Ghz5) {
            WifiStandard::Ieee80211ac
        } else if self.ht_capabilities {
            WifiStandard::Ieee80211n
        } else {
            WifiStandard::Legacy
        }
    }
}

/// Decode radio parameters for an access point on `frequency` (MHz)
pub fn decode(ies: &[u8], frequency: i32) -> RadioInfo {
    let elements = Elements::parse(ies);
    let band = u32::try_from(frequency).ok().and_then(Band::of);

    let mut info = RadioInfo {
        standard: elements.standard(band),
        width: ChannelWidth::Mhz20,
        center_freq0: frequency,
        center_freq1: 0,
    };

    if let Some(ht) = elements.ht_operation {
        apply_ht_operation(&mut info, ht, frequency);
    }
    if let (Some(vht), Some(band)) = (elements.vht_operation, band) {
        apply_vht_operation(&mut info, vht, band);
    }
    if let Some(he) = elements.he_operation {
        apply_he_operation(&mut info, he);
    }
    if let (Some(eht), Some(band)) = (elements.eht_operation, band) {
        apply_eht_operation(&mut info, eht, band);
    }

    info
}

fn center(channel: u8, band: Band) -> i32 {
    channel_to_frequency(u32::from(channel), band) as i32
}

/// 40 MHz via the secondary channel offset
fn apply_ht_operation(info: &mut RadioInfo, ht: &[u8], frequency: i32) {
    let Some(&params) = ht.get(1) else {
        return;
    };
    if params & 0x04 == 0 {
        return;
    }
    match params & 0x03 {
        1 => {
            info.width = ChannelWidth::Mhz40;
            info.center_freq0 = frequency + 10;
        }
        3 => {
            info.width = ChannelWidth::Mhz40;
            info.center_freq0 = frequency - 10;
        }
        _ => {}
    }
}

fn apply_vht_operation(info: &mut RadioInfo, vht: &[u8], band: Band) {
    let [width, seg0, seg1, ..] = *vht else {
        return;
    };

    match width {
        1 if seg1 == 0 => {
            info.width = ChannelWidth::Mhz80;
            info.center_freq0 = center(seg0, band);
        }
        1 if seg1.abs_diff(seg0) == 8 => {
            info.width = ChannelWidth::Mhz160;
            info.center_freq0 = center(seg1, band);
        }
        1 | 3 => {
            info.width = ChannelWidth::Mhz80Plus80;
            info.center_freq0 = center(seg0, band);
            info.center_freq1 = center(seg1, band);
        }
        // Deprecated 160 MHz signalling
        2 => {
            info.width = ChannelWidth::Mhz160;
            info.center_freq0 = center(seg0, band);
        }
        _ => {}
    }
}

/// 6 GHz operation information carried in the HE operation element
fn apply_he_operation(info: &mut RadioInfo, he: &[u8]) {
    let [p0, p1, p2, ..] = *he else {
        return;
    };
    let params = u32::from_le_bytes([p0, p1, p2, 0]);
    if params & HE_6GHZ_OPERATION_PRESENT == 0 {
        return;
    }

    // parameters (3), BSS color (1), basic HE-MCS set (2)
    let mut offset = 6;
    if params & HE_VHT_OPERATION_PRESENT != 0 {
        offset += 3;
    }
    if params & HE_CO_HOSTED_BSS != 0 {
        offset += 1;
    }

    let Some(&[_primary, control, ccfs0, ccfs1, ..]) = he.get(offset..offset + 5) else {
        return;
    };

    let band = Band::Ghz6;
    match control & 0x03 {
        0 => {
            info.width = ChannelWidth::Mhz20;
            info.center_freq0 = center(ccfs0, band);
        }
        1 => {
            info.width = ChannelWidth::Mhz40;
            info.center_freq0 = center(ccfs0, band);
        }
        2 => {
            info.width = ChannelWidth::Mhz80;
            info.center_freq0 = center(ccfs0, band);
        }
        _ if ccfs1 == 0 => {
            info.width = ChannelWidth::Mhz160;
            info.center_freq0 = center(ccfs0, band);
        }
        _ if ccfs1.abs_diff(ccfs0) == 8 => {
            info.width = ChannelWidth::Mhz160;
            info.center_freq0 = center(ccfs1, band);
        }
        _ => {
            info.width = ChannelWidth::Mhz80Plus80;
            info.center_freq0 = center(ccfs0, band);
            info.center_freq1 = center(ccfs1, band);
        }
    }
}

/// 320 MHz is only signalled by the EHT operation element
fn apply_eht_operation(info: &mut RadioInfo, eht: &[u8], band: Band) {
    let Some(&params) = eht.first() else {
        return;
    };
    if params & 0x01 == 0 {
        return;
    }

    // parameters (1), basic EHT-MCS and NSS set (4)
    let Some(&[control, _ccfs0, ccfs1]) = eht.get(5..8) else {
        return;
    };
    if control & 0x07 == 4 {
        info.width = ChannelWidth::Mhz320;
        info.center_freq0 = center(ccfs1, band);
        info.center_freq1 = 0;
    }
}
