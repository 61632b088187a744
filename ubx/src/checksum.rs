//! UBX's Fletcher-8 (8-bit-sum) checksum, computed over class/id/length/
//! payload. Streaming-style calculator, grounded in the teacher's
//! `UbxChecksumCalc` (`ublox/src/parser/checksum.rs`).

#[derive(Default)]
pub struct ChecksumCalc {
    ck_a: u8,
    ck_b: u8,
}

impl ChecksumCalc {
    pub const fn new() -> Self {
        Self { ck_a: 0, ck_b: 0 }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.ck_a = self.ck_a.wrapping_add(b);
            self.ck_b = self.ck_b.wrapping_add(self.ck_a);
        }
    }

    pub fn result(&self) -> (u8, u8) {
        (self.ck_a, self.ck_b)
    }
}

pub fn compute(class_id_len_payload: &[u8]) -> (u8, u8) {
    let mut calc = ChecksumCalc::new();
    calc.update(class_id_len_payload);
    calc.result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_ack_ack_checksum() {
        // UBX-ACK-ACK: class=0x05 id=0x01 len=2 payload=[0x04,0x05]
        let (a, b) = compute(&[0x05, 0x01, 0x02, 0x00, 0x04, 0x05]);
        assert_eq!((a, b), (0x11, 0x38));
    }
}
