use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT};

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("user", FieldKind::Id, EXACT),
    FieldRule::new("action", FieldKind::Text, EXACT),
    FieldRule::new("entity", FieldKind::Text, EXACT),
    FieldRule::new("entity_id", FieldKind::Id, EXACT),
]);
