//! Object creation, attachment, movement, materials and the edit flow.

use crate::{Channel, Message, MessageCategory};
use crowbar_bitstream::compressed::{read_compressed_str, write_compressed_str};
use crowbar_bitstream::{BitStream, ProtocolError, ProtocolResult};
use crowbar_types::{Colour, Vec3, INVALID_OBJECT_ID, INVALID_VEHICLE_ID, MAX_OBJECT_MATERIAL_SLOTS};

/// What an object is attached to. The wire encodes this as a pair of
/// vehicle/object IDs where the unused one is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ObjectAttachment {
    #[default]
    None,
    Vehicle(u16),
    Object(u16),
    Player(u16),
}

/// Offset and rotation of an attachment, plus whether rotation stays in
/// sync with the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttachmentOffsets {
    pub offset: Vec3,
    pub rotation: Vec3,
    pub sync_rotation: bool,
}

/// One object material slot override.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMaterial {
    /// Retexture from another model's TXD.
    Default {
        model: u16,
        txd: String,
        texture: String,
        colour: Colour,
    },
    /// Rendered text.
    Text {
        size: u8,
        font: String,
        font_size: u8,
        bold: u8,
        font_colour: Colour,
        background_colour: Colour,
        alignment: u8,
        text: String,
    },
}

const MATERIAL_TYPE_DEFAULT: u8 = 1;
const MATERIAL_TYPE_TEXT: u8 = 2;

fn write_material_payload(bs: &mut BitStream, material: &ObjectMaterial) {
    match material {
        ObjectMaterial::Default {
            model,
            txd,
            texture,
            colour,
        } => {
            bs.write_u16(*model);
            bs.write_str8(txd);
            bs.write_str8(texture);
            bs.write_u32(colour.argb());
        }
        ObjectMaterial::Text {
            size,
            font,
            font_size,
            bold,
            font_colour,
            background_colour,
            alignment,
            text,
        } => {
            bs.write_u8(*size);
            bs.write_str8(font);
            bs.write_u8(*font_size);
            bs.write_u8(*bold);
            bs.write_u32(font_colour.argb());
            bs.write_u32(background_colour.argb());
            bs.write_u8(*alignment);
            write_compressed_str(bs, text);
        }
    }
}

fn material_type(material: &ObjectMaterial) -> u8 {
    match material {
        ObjectMaterial::Default { .. } => MATERIAL_TYPE_DEFAULT,
        ObjectMaterial::Text { .. } => MATERIAL_TYPE_TEXT,
    }
}

fn read_material_payload(bs: &mut BitStream, kind: u8) -> ProtocolResult<ObjectMaterial> {
    match kind {
        MATERIAL_TYPE_DEFAULT => Ok(ObjectMaterial::Default {
            model: bs.read_u16()?,
            txd: bs.read_str8()?,
            texture: bs.read_str8()?,
            colour: Colour::from_argb(bs.read_u32()?),
        }),
        MATERIAL_TYPE_TEXT => Ok(ObjectMaterial::Text {
            size: bs.read_u8()?,
            font: bs.read_str8()?,
            font_size: bs.read_u8()?,
            bold: bs.read_u8()?,
            font_colour: Colour::from_argb(bs.read_u32()?),
            background_colour: Colour::from_argb(bs.read_u32()?),
            alignment: bs.read_u8()?,
            text: read_compressed_str(bs)?,
        }),
        _ => Err(ProtocolError::Malformed),
    }
}

/// Object snapshot sent on stream-in: transform, attachment and every used
/// material slot in one payload. Material slots are sparse; the wire
/// carries a count and `(type, slot, payload)` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateObject {
    pub object_id: u16,
    pub model: i32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub draw_distance: f32,
    pub camera_collision: bool,
    pub attachment: ObjectAttachment,
    pub attachment_offsets: AttachmentOffsets,
    pub materials: Vec<(u8, ObjectMaterial)>,
}

impl Default for CreateObject {
    fn default() -> Self {
        Self {
            object_id: 0,
            model: 0,
            position: Vec3::default(),
            rotation: Vec3::default(),
            draw_distance: 0.0,
            camera_collision: true,
            attachment: ObjectAttachment::None,
            attachment_offsets: AttachmentOffsets::default(),
            materials: Vec::new(),
        }
    }
}

impl Message for CreateObject {
    const ID: u8 = 44;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
        bs.write_i32(self.model);
        bs.write_vec3(self.position);
        bs.write_vec3(self.rotation);
        bs.write_f32(self.draw_distance);
        bs.write_u8(!self.camera_collision as u8);

        let vehicle = match self.attachment {
            ObjectAttachment::Vehicle(id) => id,
            _ => INVALID_VEHICLE_ID,
        };
        let object = match self.attachment {
            ObjectAttachment::Object(id) => id,
            _ => INVALID_OBJECT_ID,
        };
        bs.write_u16(vehicle);
        bs.write_u16(object);
        if matches!(
            self.attachment,
            ObjectAttachment::Vehicle(_) | ObjectAttachment::Object(_)
        ) {
            bs.write_vec3(self.attachment_offsets.offset);
            bs.write_vec3(self.attachment_offsets.rotation);
            bs.write_u8(self.attachment_offsets.sync_rotation as u8);
        }

        let used = self
            .materials
            .iter()
            .filter(|(slot, _)| (*slot as usize) < MAX_OBJECT_MATERIAL_SLOTS)
            .count();
        bs.write_u8(used as u8);
        for (slot, material) in &self.materials {
            if (*slot as usize) >= MAX_OBJECT_MATERIAL_SLOTS {
                continue;
            }
            bs.write_u8(material_type(material));
            bs.write_u8(*slot);
            write_material_payload(bs, material);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DestroyObject {
    pub object_id: u16,
}

impl Message for DestroyObject {
    const ID: u8 = 47;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoveObject {
    pub object_id: u16,
    pub current_position: Vec3,
    pub target_position: Vec3,
    pub speed: f32,
    pub target_rotation: Vec3,
}

impl Message for MoveObject {
    const ID: u8 = 99;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
            current_position: bs.read_vec3()?,
            target_position: bs.read_vec3()?,
            speed: bs.read_f32()?,
            target_rotation: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
        bs.write_vec3(self.current_position);
        bs.write_vec3(self.target_position);
        bs.write_f32(self.speed);
        bs.write_vec3(self.target_rotation);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopObject {
    pub object_id: u16,
}

impl Message for StopObject {
    const ID: u8 = 122;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetObjectPosition {
    pub object_id: u16,
    pub position: Vec3,
}

impl Message for SetObjectPosition {
    const ID: u8 = 45;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
            position: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
        bs.write_vec3(self.position);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetObjectRotation {
    pub object_id: u16,
    pub rotation: Vec3,
}

impl Message for SetObjectRotation {
    const ID: u8 = 46;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
            rotation: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
        bs.write_vec3(self.rotation);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachObjectToPlayer {
    pub object_id: u16,
    pub player_id: u16,
    pub offset: Vec3,
    pub rotation: Vec3,
}

impl Message for AttachObjectToPlayer {
    const ID: u8 = 75;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            object_id: bs.read_u16()?,
            player_id: bs.read_u16()?,
            offset: bs.read_vec3()?,
            rotation: bs.read_vec3()?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
        bs.write_u16(self.player_id);
        bs.write_vec3(self.offset);
        bs.write_vec3(self.rotation);
    }
}

/// Single-slot material change for an already-created object.
#[derive(Debug, Clone, PartialEq)]
pub struct SetPlayerObjectMaterial {
    pub object_id: u16,
    pub slot: u8,
    pub material: ObjectMaterial,
}

impl Message for SetPlayerObjectMaterial {
    const ID: u8 = 84;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let object_id = bs.read_u16()?;
        let kind = bs.read_u8()?;
        let slot = bs.read_u8()?;
        Ok(Self {
            object_id,
            slot,
            material: read_material_payload(bs, kind)?,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.object_id);
        bs.write_u8(material_type(&self.material));
        bs.write_u8(self.slot);
        write_material_payload(bs, &self.material);
    }
}

/// Accessory model data for a player attachment slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachedObjectSlot {
    pub model: u32,
    pub bone: u32,
    pub offset: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub colour1: Colour,
    pub colour2: Colour,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPlayerAttachedObject {
    pub player_id: u16,
    pub index: u32,
    pub create: bool,
    pub attachment: AttachedObjectSlot,
}

impl Message for SetPlayerAttachedObject {
    const ID: u8 = 113;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        let player_id = bs.read_u16()?;
        let index = bs.read_u32()?;
        let create = bs.read_bit()?;
        let attachment = if create {
            AttachedObjectSlot {
                model: bs.read_u32()?,
                bone: bs.read_u32()?,
                offset: bs.read_vec3()?,
                rotation: bs.read_vec3()?,
                scale: bs.read_vec3()?,
                colour1: Colour::from_argb(bs.read_u32()?),
                colour2: Colour::from_argb(bs.read_u32()?),
            }
        } else {
            AttachedObjectSlot::default()
        };
        Ok(Self {
            player_id,
            index,
            create,
            attachment,
        })
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u16(self.player_id);
        bs.write_u32(self.index);
        bs.write_bit(self.create);
        if self.create {
            bs.write_u32(self.attachment.model);
            bs.write_u32(self.attachment.bone);
            bs.write_vec3(self.attachment.offset);
            bs.write_vec3(self.attachment.rotation);
            bs.write_vec3(self.attachment.scale);
            bs.write_u32(self.attachment.colour1.argb());
            bs.write_u32(self.attachment.colour2.argb());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerBeginObjectSelect;

impl Message for PlayerBeginObjectSelect {
    const ID: u8 = 27;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerSelectObject {
    pub select_type: u32,
    pub object_id: u16,
    pub model: u32,
    pub position: Vec3,
}

impl Message for OnPlayerSelectObject {
    const ID: u8 = 27;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            select_type: bs.read_u32()?,
            object_id: bs.read_u16()?,
            model: bs.read_u32()?,
            position: bs.read_vec3()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerCancelObjectEdit;

impl Message for PlayerCancelObjectEdit {
    const ID: u8 = 28;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self)
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerBeginObjectEdit {
    pub player_object: bool,
    pub object_id: u16,
}

impl Message for PlayerBeginObjectEdit {
    const ID: u8 = 117;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_bit(self.player_object);
        bs.write_u16(self.object_id);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerEditObject {
    pub player_object: bool,
    pub object_id: u16,
    pub response: u32,
    pub offset: Vec3,
    pub rotation: Vec3,
}

impl Message for OnPlayerEditObject {
    const ID: u8 = 117;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            player_object: bs.read_bit()?,
            object_id: bs.read_u16()?,
            response: bs.read_u32()?,
            offset: bs.read_vec3()?,
            rotation: bs.read_vec3()?,
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerBeginAttachedObjectEdit {
    pub index: u32,
}

impl Message for PlayerBeginAttachedObjectEdit {
    const ID: u8 = 116;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(_bs: &mut BitStream) -> ProtocolResult<Self> {
        Err(ProtocolError::Malformed)
    }

    fn write(&self, bs: &mut BitStream) {
        bs.write_u32(self.index);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnPlayerEditAttachedObject {
    pub response: u32,
    pub index: u32,
    pub attachment: AttachedObjectSlot,
}

impl Message for OnPlayerEditAttachedObject {
    const ID: u8 = 116;
    const CATEGORY: MessageCategory = MessageCategory::Rpc;
    const CHANNEL: Channel = Channel::SyncRpc;

    fn read(bs: &mut BitStream) -> ProtocolResult<Self> {
        Ok(Self {
            response: bs.read_u32()?,
            index: bs.read_u32()?,
            attachment: AttachedObjectSlot {
                model: bs.read_u32()?,
                bone: bs.read_u32()?,
                offset: bs.read_vec3()?,
                rotation: bs.read_vec3()?,
                scale: bs.read_vec3()?,
                colour1: Colour::from_argb(bs.read_u32()?),
                colour2: Colour::from_argb(bs.read_u32()?),
            },
        })
    }

    fn write(&self, _bs: &mut BitStream) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_object_unattached() {
        let msg = CreateObject {
            object_id: 3,
            model: 1337,
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, 0.0, 90.0),
            draw_distance: 300.0,
            camera_collision: true,
            ..Default::default()
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        // Both attachment IDs are the invalid sentinel, no offsets follow,
        // material count is zero.
        // Header is id(2) model(4) pos(12) rot(12) dist(4) cam(1) = 35 bytes.
        let bytes = bs.as_bytes();
        assert_eq!(&bytes[35..39], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(bytes[39], 0);
    }

    #[test]
    fn test_create_object_with_attachment() {
        let msg = CreateObject {
            object_id: 3,
            model: 1337,
            attachment: ObjectAttachment::Vehicle(12),
            attachment_offsets: AttachmentOffsets {
                offset: Vec3::new(0.0, 0.0, 1.0),
                rotation: Vec3::default(),
                sync_rotation: true,
            },
            ..Default::default()
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        let bytes = bs.as_bytes();
        assert_eq!(&bytes[35..37], &[12, 0]);
        // Two attachment IDs, a 25-byte offset block, then the count.
        assert_eq!(bytes.len(), 35 + 4 + 25 + 1);
    }

    #[test]
    fn test_material_roundtrip_via_set() {
        let msg = SetPlayerObjectMaterial {
            object_id: 9,
            slot: 2,
            material: ObjectMaterial::Text {
                size: 90,
                font: "Arial".into(),
                font_size: 24,
                bold: 1,
                font_colour: Colour::from_argb(0xFFFF0000),
                background_colour: Colour::from_argb(0xFF000000),
                alignment: 1,
                text: "For Sale".into(),
            },
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(SetPlayerObjectMaterial::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_default_material_roundtrip() {
        let msg = SetPlayerObjectMaterial {
            object_id: 1,
            slot: 0,
            material: ObjectMaterial::Default {
                model: 18646,
                txd: "mat_tube".into(),
                texture: "tube1".into(),
                colour: Colour::from_argb(0x00000000),
            },
        };
        let mut bs = BitStream::new();
        msg.write(&mut bs);
        assert_eq!(SetPlayerObjectMaterial::read(&mut bs).unwrap(), msg);
    }

    #[test]
    fn test_attached_object_conditional_block() {
        let remove = SetPlayerAttachedObject {
            player_id: 1,
            index: 3,
            create: false,
            ..Default::default()
        };
        let mut bs = BitStream::new();
        remove.write(&mut bs);
        assert_eq!(bs.len_bits(), 16 + 32 + 1);
        assert_eq!(SetPlayerAttachedObject::read(&mut bs).unwrap(), remove);
    }

    #[test]
    fn test_edit_object_roundtrip() {
        let mut bs = BitStream::new();
        bs.write_bit(true);
        bs.write_u16(44);
        bs.write_u32(1);
        bs.write_vec3(Vec3::new(1.0, 2.0, 3.0));
        bs.write_vec3(Vec3::new(0.0, 0.0, 45.0));
        let msg = OnPlayerEditObject::read(&mut bs).unwrap();
        assert!(msg.player_object);
        assert_eq!(msg.object_id, 44);
        assert_eq!(msg.response, 1);
    }
}
