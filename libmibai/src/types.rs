use heapless::Vec;

/// Largest payload a single inbound message can carry. This is the usable
/// ATT write payload at the negotiated MTU of 256.
pub const MAX_PAYLOAD: usize = 253;

/// Opaque key distinguishing logical message streams over the shared
/// transport. On the wire each stream is a GATT characteristic; the id is the
/// 32-bit vendor prefix of its UUID.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u32);

/// Update control commands (`Start`/`Cancel`/`Confirm`), one byte each.
pub const OTA_CONTROL: ChannelId = ChannelId(0xef04_0001);
/// Raw firmware image chunks, appended in arrival order.
pub const OTA_DATA: ChannelId = ChannelId(0xef04_0002);
/// Outbound status byte, notified on every update-state transition.
pub const OTA_STATUS: ChannelId = ChannelId(0xef04_0003);
/// Servo motion commands.
pub const MOTION_CONTROL: ChannelId = ChannelId(0xef02_0001);

/// One inbound write as delivered by the transport. Owned by whichever
/// structure currently holds it: producer, queue, then consumer.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    pub channel: ChannelId,
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

impl Message {
    /// Builds a message from a raw payload. `None` when the payload exceeds
    /// [`MAX_PAYLOAD`].
    pub fn from_slice(channel: ChannelId, payload: &[u8]) -> Option<Self> {
        let payload = Vec::from_slice(payload).ok()?;
        Some(Self { channel, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_respects_payload_bound() {
        let exact = [0u8; MAX_PAYLOAD];
        assert!(Message::from_slice(OTA_DATA, &exact).is_some());

        let too_big = [0u8; MAX_PAYLOAD + 1];
        assert!(Message::from_slice(OTA_DATA, &too_big).is_none());
    }
}
