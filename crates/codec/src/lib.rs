//! Fixed-layout wire codec for per-tick avatar updates.
//!
//! One message is one avatar's state at one tick: 21 bytes, big-endian, no
//! header or versioning. Format changes are breaking.
//!
//! # Invariants
//! - Encoding is stateless and allocation-free; safe to use from any thread.
//! - `decode(encode(u))` reproduces `u` exactly except the two rotation
//!   components, which land within 1/32767 of their inputs.

use byteorder::{BigEndian, ByteOrder};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use avatarspace_common::SessionId;

/// Size in bytes of one encoded avatar update.
pub const UPDATE_SIZE: usize = 21;

/// Scale for i16 quantization of the rotation components. Downstream
/// consumers assume this precision/bandwidth tradeoff; do not change the
/// integer width without changing the wire format.
const ROTATION_SCALE: f32 = 32767.0;

/// Errors from decoding a wire buffer.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed message: got {len} bytes, need {UPDATE_SIZE}")]
    MalformedMessage { len: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// One avatar's transform and state at one tick.
///
/// Constructed by the sender each tick, encoded, transmitted, decoded by the
/// receiver, discarded. Orientation is yaw-constrained: only the quaternion
/// Y and W components travel; X and Z are fixed/derived by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvatarUpdate {
    pub session_id: SessionId,
    pub position: Vec3,
    /// Quaternion Y component of the orientation.
    pub rotation_y: f32,
    /// Quaternion W component of the orientation.
    pub rotation_w: f32,
    /// Animation state wire value; unknown values pass through untouched
    /// (see `avatarspace_common::AnimationState` for the named mapping).
    pub state: u8,
    /// Selector of the visual character the avatar currently uses.
    pub character_id: u16,
}

impl AvatarUpdate {
    /// Encode into the fixed 21-byte wire layout.
    pub fn encode(&self) -> [u8; UPDATE_SIZE] {
        let mut buf = [0u8; UPDATE_SIZE];
        BigEndian::write_u16(&mut buf[0..2], self.session_id.0);
        BigEndian::write_f32(&mut buf[2..6], self.position.x);
        BigEndian::write_f32(&mut buf[6..10], self.position.y);
        BigEndian::write_f32(&mut buf[10..14], self.position.z);
        BigEndian::write_i16(&mut buf[14..16], quantize_rotation(self.rotation_y));
        BigEndian::write_i16(&mut buf[16..18], quantize_rotation(self.rotation_w));
        buf[18] = self.state;
        BigEndian::write_u16(&mut buf[19..21], self.character_id);
        buf
    }

    /// Decode from a wire buffer.
    ///
    /// Buffers shorter than [`UPDATE_SIZE`] fail with
    /// [`CodecError::MalformedMessage`]; the caller should drop the message
    /// and keep the connection. Longer buffers decode from their 21-byte
    /// prefix.
    pub fn decode(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < UPDATE_SIZE {
            return Err(CodecError::MalformedMessage { len: buffer.len() });
        }
        Ok(Self {
            session_id: SessionId(BigEndian::read_u16(&buffer[0..2])),
            position: Vec3::new(
                BigEndian::read_f32(&buffer[2..6]),
                BigEndian::read_f32(&buffer[6..10]),
                BigEndian::read_f32(&buffer[10..14]),
            ),
            rotation_y: dequantize_rotation(BigEndian::read_i16(&buffer[14..16])),
            rotation_w: dequantize_rotation(BigEndian::read_i16(&buffer[16..18])),
            state: buffer[18],
            character_id: BigEndian::read_u16(&buffer[19..21]),
        })
    }
}

/// Quantize a quaternion component in [-1, 1] to a signed 16-bit value.
/// Out-of-range inputs saturate at the i16 bounds.
fn quantize_rotation(component: f32) -> i16 {
    (component * ROTATION_SCALE).round() as i16
}

fn dequantize_rotation(quantized: i16) -> f32 {
    quantized as f32 / ROTATION_SCALE
}

pub fn crate_info() -> &'static str {
    "avatarspace-codec v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Max round-trip error for one rotation component.
    const ROTATION_EPSILON: f32 = 1.0 / 32767.0;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("codec"));
    }

    fn sample_update() -> AvatarUpdate {
        AvatarUpdate {
            session_id: SessionId(0x1234),
            position: Vec3::new(1.5, -20.25, 300.125),
            rotation_y: 0.7071,
            rotation_w: -0.7071,
            state: 2,
            character_id: 7,
        }
    }

    #[test]
    fn roundtrip_exact_fields() {
        let update = sample_update();
        let decoded = AvatarUpdate::decode(&update.encode()).unwrap();
        assert_eq!(decoded.session_id, update.session_id);
        assert_eq!(decoded.position, update.position);
        assert_eq!(decoded.state, update.state);
        assert_eq!(decoded.character_id, update.character_id);
    }

    #[test]
    fn roundtrip_rotation_within_bound() {
        // Sweep the representable range including the endpoints.
        let mut component = -1.0f32;
        while component <= 1.0 {
            let update = AvatarUpdate {
                rotation_y: component,
                rotation_w: -component,
                ..sample_update()
            };
            let decoded = AvatarUpdate::decode(&update.encode()).unwrap();
            assert!(
                (decoded.rotation_y - component).abs() <= ROTATION_EPSILON,
                "rotation_y error too large at {component}"
            );
            assert!(
                (decoded.rotation_w + component).abs() <= ROTATION_EPSILON,
                "rotation_w error too large at {component}"
            );
            component += 0.0173;
        }
    }

    #[test]
    fn unit_rotation_components_are_exact() {
        let update = AvatarUpdate {
            rotation_y: 1.0,
            rotation_w: -1.0,
            ..sample_update()
        };
        let encoded = update.encode();
        assert_eq!(BigEndian::read_i16(&encoded[14..16]), 32767);
        assert_eq!(BigEndian::read_i16(&encoded[16..18]), -32767);
        let decoded = AvatarUpdate::decode(&encoded).unwrap();
        assert_eq!(decoded.rotation_y, 1.0);
        assert_eq!(decoded.rotation_w, -1.0);
    }

    #[test]
    fn every_short_length_is_malformed() {
        let encoded = sample_update().encode();
        for len in 0..UPDATE_SIZE {
            let result = AvatarUpdate::decode(&encoded[..len]);
            match result {
                Err(CodecError::MalformedMessage { len: reported }) => {
                    assert_eq!(reported, len);
                }
                Ok(_) => panic!("decode accepted a {len}-byte buffer"),
            }
        }
    }

    #[test]
    fn oversized_buffer_decodes_prefix() {
        let update = sample_update();
        let mut buffer = update.encode().to_vec();
        buffer.extend_from_slice(&[0xAA; 7]);
        let decoded = AvatarUpdate::decode(&buffer).unwrap();
        assert_eq!(decoded.session_id, update.session_id);
        assert_eq!(decoded.character_id, update.character_id);
    }

    #[test]
    fn byte_layout_offsets() {
        let update = AvatarUpdate {
            session_id: SessionId(0xABCD),
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation_y: 0.0,
            rotation_w: 1.0,
            state: 0x5E,
            character_id: 0x0102,
        };
        let buf = update.encode();
        assert_eq!(&buf[0..2], &[0xAB, 0xCD]);
        assert_eq!(&buf[2..6], &1.0f32.to_be_bytes());
        assert_eq!(&buf[6..10], &2.0f32.to_be_bytes());
        assert_eq!(&buf[10..14], &3.0f32.to_be_bytes());
        assert_eq!(&buf[14..16], &[0x00, 0x00]);
        assert_eq!(&buf[16..18], &32767i16.to_be_bytes());
        assert_eq!(buf[18], 0x5E);
        assert_eq!(&buf[19..21], &[0x01, 0x02]);
    }

    #[test]
    fn state_values_pass_through_unmapped() {
        // The wire never rejects an unknown animation state.
        let update = AvatarUpdate {
            state: 250,
            ..sample_update()
        };
        let decoded = AvatarUpdate::decode(&update.encode()).unwrap();
        assert_eq!(decoded.state, 250);
    }
}
