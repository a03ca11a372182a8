//! Registry of every known `(category, id)` pair: protocol name and
//! ordering channel, used for router diagnostics and handler registration
//! checks. IDs shared by a request/response pair appear once under the
//! request's name.

use crate::{Channel, MessageCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub category: MessageCategory,
    pub id: u8,
    pub name: &'static str,
    pub channel: Channel,
}

macro_rules! descriptors {
    ($($cat:ident $id:expr, $name:expr, $chan:ident;)*) => {
        pub const CATALOG: &[MessageDescriptor] = &[
            $(MessageDescriptor {
                category: MessageCategory::$cat,
                id: $id,
                name: $name,
                channel: Channel::$chan,
            },)*
        ];
    };
}

descriptors! {
    Rpc 11, "SetPlayerName", SyncRpc;
    Rpc 12, "SetPlayerPosition", SyncRpc;
    Rpc 13, "SetPlayerPositionFindZ", SyncRpc;
    Rpc 14, "SetPlayerHealth", SyncRpc;
    Rpc 15, "TogglePlayerControllable", SyncRpc;
    Rpc 16, "PlayerPlaySound", SyncRpc;
    Rpc 17, "SetWorldBounds", SyncRpc;
    Rpc 18, "GivePlayerMoney", SyncRpc;
    Rpc 19, "SetPlayerFacingAngle", SyncRpc;
    Rpc 20, "ResetPlayerMoney", SyncRpc;
    Rpc 21, "ResetPlayerWeapons", SyncRpc;
    Rpc 22, "GivePlayerWeapon", SyncRpc;
    Rpc 23, "OnPlayerClickPlayer", SyncRpc;
    Rpc 24, "SetVehicleParams", SyncRpc;
    Rpc 25, "PlayerConnect", SyncRpc;
    Rpc 26, "EnterVehicle", SyncRpc;
    Rpc 27, "PlayerBeginObjectSelect", SyncRpc;
    Rpc 28, "PlayerCancelObjectEdit", SyncRpc;
    Rpc 29, "SetPlayerTime", SyncRpc;
    Rpc 30, "TogglePlayerClock", SyncRpc;
    Rpc 32, "PlayerStreamIn", SyncRpc;
    Rpc 33, "SetPlayerShopName", SyncRpc;
    Rpc 34, "SetPlayerSkillLevel", SyncRpc;
    Rpc 35, "SetPlayerDrunkLevel", SyncRpc;
    Rpc 36, "PlayerShowTextLabel", SyncRpc;
    Rpc 37, "DisableCheckpoint", SyncRpc;
    Rpc 38, "SetRaceCheckpoint", SyncRpc;
    Rpc 39, "DisableRaceCheckpoint", SyncRpc;
    Rpc 40, "PlayerClose", SyncRpc;
    Rpc 41, "PlayAudioStreamForPlayer", SyncRpc;
    Rpc 42, "StopAudioStreamForPlayer", SyncRpc;
    Rpc 43, "RemoveBuildingForPlayer", SyncRpc;
    Rpc 44, "CreateObject", SyncRpc;
    Rpc 45, "SetObjectPosition", SyncRpc;
    Rpc 46, "SetObjectRotation", SyncRpc;
    Rpc 47, "DestroyObject", SyncRpc;
    Rpc 48, "SetPlayerVirtualWorld", SyncRpc;
    Rpc 50, "PlayerRequestCommandMessage", SyncRpc;
    Rpc 52, "PlayerSpawn", SyncRpc;
    Rpc 53, "OnPlayerDeath", SyncRpc;
    Rpc 54, "NpcConnect", SyncRpc;
    Rpc 55, "SendDeathMessage", SyncRpc;
    Rpc 56, "SetPlayerMapIcon", SyncRpc;
    Rpc 57, "RemoveVehicleComponent", SyncRpc;
    Rpc 58, "PlayerHideTextLabel", SyncRpc;
    Rpc 59, "SetPlayerChatBubble", SyncRpc;
    Rpc 60, "SendGameTimeUpdate", SyncRpc;
    Rpc 61, "ShowDialog", SyncRpc;
    Rpc 62, "OnPlayerDialogResponse", SyncRpc;
    Rpc 63, "PlayerDestroyPickup", SyncRpc;
    Rpc 65, "LinkVehicleToInterior", SyncRpc;
    Rpc 66, "SetPlayerArmour", SyncRpc;
    Rpc 67, "SetPlayerArmedWeapon", SyncRpc;
    Rpc 68, "SetSpawnInfo", SyncRpc;
    Rpc 69, "SetPlayerTeam", SyncRpc;
    Rpc 70, "PutPlayerInVehicle", SyncRpc;
    Rpc 71, "RemovePlayerFromVehicle", SyncRpc;
    Rpc 72, "SetPlayerColor", SyncRpc;
    Rpc 73, "SendGameText", SyncRpc;
    Rpc 74, "ForcePlayerClassSelection", SyncRpc;
    Rpc 75, "AttachObjectToPlayer", SyncRpc;
    Rpc 76, "PlayerInitMenu", SyncRpc;
    Rpc 77, "PlayerShowMenu", SyncRpc;
    Rpc 78, "PlayerHideMenu", SyncRpc;
    Rpc 79, "CreateExplosion", SyncRpc;
    Rpc 80, "ShowPlayerNameTagForPlayer", SyncRpc;
    Rpc 81, "AttachCameraToObject", SyncRpc;
    Rpc 82, "InterpolateCamera", SyncRpc;
    Rpc 83, "PlayerBeginTextDrawSelect", SyncRpc;
    Rpc 84, "SetPlayerObjectMaterial", SyncRpc;
    Rpc 85, "StopFlashGangZone", SyncRpc;
    Rpc 86, "ApplyPlayerAnimation", SyncRpc;
    Rpc 87, "ClearPlayerAnimations", SyncRpc;
    Rpc 88, "SetPlayerSpecialAction", SyncRpc;
    Rpc 89, "SetPlayerFightingStyle", SyncRpc;
    Rpc 90, "SetPlayerVelocity", SyncRpc;
    Rpc 91, "SetVehicleVelocity", SyncRpc;
    Rpc 93, "SendClientMessage", SyncRpc;
    Rpc 94, "SetPlayerWorldTime", SyncRpc;
    Rpc 95, "PlayerCreatePickup", SyncRpc;
    Rpc 96, "ScmEvent", SyncRpc;
    Rpc 99, "MoveObject", SyncRpc;
    Rpc 101, "PlayerRequestChatMessage", SyncRpc;
    Rpc 103, "ClientCheck", SyncRpc;
    Rpc 104, "EnableStuntBonusForPlayer", SyncRpc;
    Rpc 105, "PlayerTextDrawSetString", SyncRpc;
    Rpc 106, "SetVehicleDamageStatus", SyncRpc;
    Rpc 107, "SetCheckpoint", SyncRpc;
    Rpc 108, "ShowGangZone", SyncRpc;
    Rpc 111, "ToggleWidescreen", SyncRpc;
    Rpc 112, "PlayCrimeReport", SyncRpc;
    Rpc 113, "SetPlayerAttachedObject", SyncRpc;
    Rpc 115, "OnPlayerGiveTakeDamage", SyncRpc;
    Rpc 116, "PlayerBeginAttachedObjectEdit", SyncRpc;
    Rpc 117, "PlayerBeginObjectEdit", SyncRpc;
    Rpc 118, "OnPlayerInteriorChange", SyncRpc;
    Rpc 119, "OnPlayerClickMap", SyncRpc;
    Rpc 120, "HideGangZone", SyncRpc;
    Rpc 121, "FlashGangZone", SyncRpc;
    Rpc 122, "StopObject", SyncRpc;
    Rpc 123, "SetVehiclePlate", SyncRpc;
    Rpc 124, "TogglePlayerSpectating", SyncRpc;
    Rpc 126, "PlayerSpectatePlayer", SyncRpc;
    Rpc 127, "PlayerSpectateVehicle", SyncRpc;
    Rpc 128, "PlayerRequestClass", SyncRpc;
    Rpc 129, "PlayerRequestSpawn", SyncRpc;
    Rpc 131, "OnPlayerPickUpPickup", SyncRpc;
    Rpc 132, "OnPlayerSelectedMenuRow", SyncRpc;
    Rpc 133, "SetPlayerWantedLevel", SyncRpc;
    Rpc 134, "PlayerShowTextDraw", SyncRpc;
    Rpc 135, "PlayerHideTextDraw", SyncRpc;
    Rpc 136, "VehicleDeath", SyncRpc;
    Rpc 137, "PlayerJoin", SyncRpc;
    Rpc 138, "PlayerQuit", SyncRpc;
    Rpc 139, "PlayerInit", SyncRpc;
    Rpc 140, "OnPlayerExitedMenu", SyncRpc;
    Rpc 144, "RemovePlayerMapIcon", SyncRpc;
    Rpc 145, "SetPlayerAmmo", SyncRpc;
    Rpc 146, "SetPlayerGravity", SyncRpc;
    Rpc 147, "SetVehicleHealth", SyncRpc;
    Rpc 148, "AttachTrailer", SyncRpc;
    Rpc 149, "DetachTrailer", SyncRpc;
    Rpc 152, "SetPlayerWeather", SyncRpc;
    Rpc 153, "SetPlayerSkin", SyncRpc;
    Rpc 154, "ExitVehicle", SyncRpc;
    Rpc 155, "SendPlayerScoresAndPings", SyncRpc;
    Rpc 156, "SetPlayerInterior", SyncRpc;
    Rpc 157, "SetPlayerCameraPosition", SyncRpc;
    Rpc 158, "SetPlayerCameraLookAt", SyncRpc;
    Rpc 159, "SetVehiclePosition", SyncRpc;
    Rpc 160, "SetVehicleZAngle", SyncRpc;
    Rpc 162, "SetPlayerCameraBehindPlayer", SyncRpc;
    Rpc 163, "PlayerStreamOut", SyncRpc;
    Rpc 164, "StreamInVehicle", SyncRpc;
    Rpc 165, "StreamOutVehicle", SyncRpc;
    Rpc 166, "PlayerDeath", SyncRpc;
    Rpc 167, "DisableRemoteVehicleCollisions", SyncRpc;
    Rpc 168, "OnPlayerCameraTarget", SyncRpc;
    Rpc 170, "SetPlayerCameraTargeting", SyncRpc;
    Rpc 171, "ShowActorForPlayer", SyncRpc;
    Rpc 172, "HideActorForPlayer", SyncRpc;
    Rpc 173, "ApplyActorAnimationForPlayer", SyncRpc;
    Rpc 174, "ClearActorAnimationsForPlayer", SyncRpc;
    Rpc 175, "SetActorFacingAngleForPlayer", SyncRpc;
    Rpc 176, "SetActorPosForPlayer", SyncRpc;
    Rpc 177, "OnPlayerDamageActor", SyncRpc;
    Rpc 178, "SetActorHealthForPlayer", SyncRpc;
    Packet 200, "PlayerVehicleSync", SyncPacket;
    Packet 201, "PlayerRconCommand", Unordered;
    Packet 203, "PlayerAimSync", SyncPacket;
    Packet 204, "PlayerWeaponsUpdate", SyncPacket;
    Packet 205, "PlayerStatsSync", SyncPacket;
    Packet 206, "PlayerBulletSync", SyncPacket;
    Packet 207, "PlayerFootSync", SyncPacket;
    Packet 208, "PlayerMarkersSync", SyncPacket;
    Packet 209, "PlayerUnoccupiedSync", SyncPacket;
    Packet 210, "PlayerTrailerSync", SyncPacket;
    Packet 211, "PlayerPassengerSync", SyncPacket;
    Packet 212, "PlayerSpectatorSync", SyncPacket;
}

pub fn lookup(category: MessageCategory, id: u8) -> Option<&'static MessageDescriptor> {
    CATALOG
        .iter()
        .find(|d| d.category == category && d.id == id)
}

pub fn name_of(category: MessageCategory, id: u8) -> &'static str {
    lookup(category, id).map(|d| d.name).unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    #[test]
    fn test_lookup_distinguishes_categories() {
        // ID 128 is a known RPC but not a known packet.
        assert!(lookup(MessageCategory::Rpc, 128).is_some());
        assert!(lookup(MessageCategory::Packet, 128).is_none());
    }

    #[test]
    fn test_no_duplicate_entries() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert!(
                    !(a.category == b.category && a.id == b.id),
                    "duplicate entry for {:?} {}",
                    a.category,
                    a.id
                );
            }
        }
    }

    #[test]
    fn test_catalog_matches_message_consts() {
        let foot = lookup(MessageCategory::Packet, crate::PlayerFootSync::ID).unwrap();
        assert_eq!(foot.name, "PlayerFootSync");
        assert_eq!(foot.channel, crate::PlayerFootSync::CHANNEL);

        let connect = lookup(MessageCategory::Rpc, crate::PlayerConnect::ID).unwrap();
        assert_eq!(connect.name, "PlayerConnect");
    }

    #[test]
    fn test_rcon_is_unordered() {
        let rcon = lookup(MessageCategory::Packet, 201).unwrap();
        assert_eq!(rcon.channel, Channel::Unordered);
    }
}
