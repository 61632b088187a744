//! Class/id dispatch for the UBX message subset spec §4.K names.

pub mod esf;
pub mod hnr;
pub mod mon;
pub mod nav;
pub mod rxm;

use crate::constants::*;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    NavPvt(nav::NavPvt),
    NavAtt(nav::NavAtt),
    NavVelEcef(nav::NavVelEcef),
    NavSat(nav::NavSat),
    NavStatus(nav::NavStatus),
    RxmRawx(rxm::RxmRawx),
    RxmSfrbx(rxm::RxmSfrbx),
    EsfRaw(esf::EsfRaw),
    EsfMeas(esf::EsfMeas),
    HnrPvt(hnr::HnrPvt),
    MonHw(mon::MonHw),
    Unknown { class: u8, id: u8, payload: Vec<u8> },
}

pub fn decode(class: u8, id: u8, payload: &[u8]) -> Result<Message, Error> {
    match (class, id) {
        (CLASS_NAV, ID_NAV_PVT) => Ok(Message::NavPvt(nav::decode_pvt(payload)?)),
        (CLASS_NAV, ID_NAV_ATT) => Ok(Message::NavAtt(nav::decode_att(payload)?)),
        (CLASS_NAV, ID_NAV_VELECEF) => Ok(Message::NavVelEcef(nav::decode_velecef(payload)?)),
        (CLASS_NAV, ID_NAV_SAT) => Ok(Message::NavSat(nav::decode_sat(payload)?)),
        (CLASS_NAV, ID_NAV_STATUS) => Ok(Message::NavStatus(nav::decode_status(payload)?)),
        (CLASS_RXM, ID_RXM_RAWX) => Ok(Message::RxmRawx(rxm::decode_rawx(payload)?)),
        (CLASS_RXM, ID_RXM_SFRBX) => Ok(Message::RxmSfrbx(rxm::decode_sfrbx(payload)?)),
        (CLASS_ESF, ID_ESF_RAW) => Ok(Message::EsfRaw(esf::decode_raw(payload)?)),
        (CLASS_ESF, ID_ESF_MEAS) => Ok(Message::EsfMeas(esf::decode_meas(payload)?)),
        (CLASS_HNR, ID_HNR_PVT) => Ok(Message::HnrPvt(hnr::decode(payload)?)),
        (CLASS_MON, ID_MON_HW) => Ok(Message::MonHw(mon::decode(payload)?)),
        _ => {
            log::debug!("UBX message class={class:#04x} id={id:#04x} has no decoder, passing through as Unknown");
            Ok(Message::Unknown { class, id, payload: payload.to_vec() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_class_id_passes_through() {
        let decoded = decode(0x99, 0x01, &[1, 2, 3]).unwrap();
        assert!(matches!(decoded, Message::Unknown { class: 0x99, id: 0x01, .. }));
    }
}
