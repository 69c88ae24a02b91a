use std::fmt;

use abi::{Identity, Reservation};
use tonic::metadata::MetadataMap;

/// Set by the session gateway in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Resolve the caller of a request. A missing or blank user id means the
/// request is unauthenticated; a missing role means a standard user.
pub fn identity_from_metadata(metadata: &MetadataMap) -> Option<Identity> {
    let user_id = metadata.get(USER_ID_HEADER)?.to_str().ok()?.trim();
    if user_id.is_empty() {
        return None;
    }
    let role = metadata
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    Some(Identity::new(user_id, role))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<'a> {
    /// book for oneself
    Book,
    /// pending -> confirmed
    Confirm,
    /// read or change reservations owned by a user
    ActFor(&'a str),
}

impl fmt::Display for Capability<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Book => write!(f, "book"),
            Capability::Confirm => write!(f, "confirm reservations"),
            Capability::ActFor(uid) => write!(f, "act for {}", uid),
        }
    }
}

/// The one authorization check of a request.
pub fn authorize<'a>(
    identity: Option<&'a Identity>,
    capability: Capability<'_>,
) -> Result<&'a Identity, abi::Error> {
    let identity = identity.ok_or(abi::Error::Unauthenticated)?;
    let allowed = match capability {
        Capability::Book => true,
        Capability::Confirm => identity.is_admin(),
        Capability::ActFor(uid) => identity.can_act_for(uid),
    };
    if !allowed {
        return Err(abi::Error::PermissionDenied(format!(
            "{} may not {}",
            identity.user_id, capability
        )));
    }
    Ok(identity)
}

/// Hide who booked and why on reservations the caller may not act for.
/// The dates stay visible.
pub fn redact_foreign(identity: Option<&Identity>, rsvp: &mut Reservation) {
    if !identity.map_or(false, |i| i.can_act_for(&rsvp.user_id)) {
        rsvp.user_id.clear();
        rsvp.note.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi::Role;

    fn metadata(pairs: &[(&'static str, &str)]) -> MetadataMap {
        let mut map = MetadataMap::new();
        for (k, v) in pairs {
            map.insert(*k, v.parse().unwrap());
        }
        map
    }

    #[test]
    fn identity_should_resolve_from_headers() {
        let identity =
            identity_from_metadata(&metadata(&[("x-user-id", "alice"), ("x-user-role", "admin")]));
        assert_eq!(identity, Some(Identity::new("alice", Role::Admin)));

        let identity = identity_from_metadata(&metadata(&[("x-user-id", "bob")]));
        assert_eq!(identity, Some(Identity::new("bob", Role::Standard)));
    }

    #[test]
    fn blank_or_missing_user_should_be_anonymous() {
        assert_eq!(identity_from_metadata(&metadata(&[])), None);
        assert_eq!(identity_from_metadata(&metadata(&[("x-user-id", "  ")])), None);
        assert_eq!(
            identity_from_metadata(&metadata(&[("x-user-role", "admin")])),
            None
        );
    }

    #[test]
    fn authorize_should_gate_by_role_and_owner() {
        let alice = Identity::new("alice", Role::Standard);
        let admin = Identity::new("root", Role::Admin);

        assert_eq!(
            authorize(None, Capability::Book).unwrap_err(),
            abi::Error::Unauthenticated
        );
        assert!(authorize(Some(&alice), Capability::Book).is_ok());
        assert!(authorize(Some(&alice), Capability::ActFor("alice")).is_ok());
        assert_eq!(
            authorize(Some(&alice), Capability::ActFor("bob")).unwrap_err(),
            abi::Error::PermissionDenied("alice may not act for bob".into())
        );
        assert!(authorize(Some(&alice), Capability::Confirm).is_err());
        assert!(authorize(Some(&admin), Capability::Confirm).is_ok());
        assert!(authorize(Some(&admin), Capability::ActFor("bob")).is_ok());
    }

    #[test]
    fn redact_should_keep_only_own_details() {
        let alice = Identity::new("alice", Role::Standard);
        let admin = Identity::new("root", Role::Admin);
        let rsvp = Reservation::new_pending(
            "alice",
            "cabin-7",
            abi::parse_date("2025-06-02").unwrap(),
            abi::parse_date("2025-06-05").unwrap(),
            "two dogs",
        );

        for viewer in [Some(&alice), Some(&admin)] {
            let mut seen = rsvp.clone();
            redact_foreign(viewer, &mut seen);
            assert_eq!(seen, rsvp);
        }

        let bob = Identity::new("bob", Role::Standard);
        for viewer in [Some(&bob), None] {
            let mut seen = rsvp.clone();
            redact_foreign(viewer, &mut seen);
            assert_eq!(seen.user_id, "");
            assert_eq!(seen.note, "");
            assert_eq!((seen.start.as_str(), seen.end.as_str()), ("2025-06-02", "2025-06-05"));
        }
    }
}
