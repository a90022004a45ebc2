use bson::Bson;
use uuid::Uuid;

pub const ALICE: &str = "00000000-0000-0000-0000-000000000001";
pub const BOB: &str = "00000000-0000-0000-0000-000000000002";
pub const CAROL: &str = "00000000-0000-0000-0000-000000000003";
pub const DAVE: &str = "00000000-0000-0000-0000-000000000004";
pub const QUCKBOT: &str = "00000000-0000-0000-0000-000000000005";

/// Every user id the relational seed creates.
pub const SEEDED_USERS: [&str; 5] = [ALICE, BOB, CAROL, DAVE, QUCKBOT];

pub const DEV_WORKSPACE: &str = "10000000-0000-0000-0000-000000000001";
pub const GENERAL_CHANNEL: &str = "30000000-0000-0000-0000-000000000001";

pub const MEDIA_BUCKET: &str = "quckapp-media-dev";

/// Namespace for Mongo id to UUID conversion. Shared by every migration so
/// cross-references between migrated tables line up.
pub const NAMESPACE_QUCKAPP: Uuid = Uuid::from_u128(0xa1b2_c3d4_e5f6_7890_abcd_ef12_3456_7890);

#[must_use]
pub fn is_seeded_user(id: &str) -> bool {
    SEEDED_USERS.contains(&id)
}

/// Deterministic UUID v5 for a Mongo `_id`.
///
/// ObjectIds hash their 24-character hex form, strings hash as-is and any
/// other value hashes its display form.
#[must_use]
pub fn object_id_to_uuid(id: &Bson) -> Uuid {
    let text = match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    };
    Uuid::new_v5(&NAMESPACE_QUCKAPP, text.as_bytes())
}
