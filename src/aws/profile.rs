use ini::Properties;

/// A named long-term entry from the shared credentials file. Read-only,
/// loaded once per process.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub kind: ProfileKind,
}

/// How a profile resolves into credentials. Decided once at load time: a
/// section carrying both a long-term key pair and a role pointer loads as
/// `DirectKeys` — the operator provided both deliberately, and long-term
/// keys are the simpler path.
#[derive(Debug, Clone)]
pub enum ProfileKind {
    /// Long-term access keys used directly
    DirectKeys {
        access_key_id: String,
        secret_access_key: String,
    },
    /// A pointer to another profile whose keys are exchanged for a role
    AssumedRole {
        role_arn: String,
        source_profile: String,
        mfa_serial: Option<String>,
        duration_seconds: Option<i32>,
    },
}

impl Profile {
    /// Build a profile from an INI section. Returns `None` when the section
    /// carries neither a usable key pair nor a usable role pointer.
    pub fn from_section(name: &str, section: &Properties) -> Option<Self> {
        let access_key_id = section.get("aws_access_key_id");
        let secret_access_key = section.get("aws_secret_access_key");

        if let (Some(access_key_id), Some(secret_access_key)) = (access_key_id, secret_access_key)
        {
            return Some(Self {
                name: name.to_string(),
                kind: ProfileKind::DirectKeys {
                    access_key_id: access_key_id.to_string(),
                    secret_access_key: secret_access_key.to_string(),
                },
            });
        }

        let role_arn = section.get("role_arn")?;
        let source_profile = section.get("source_profile")?;

        Some(Self {
            name: name.to_string(),
            kind: ProfileKind::AssumedRole {
                role_arn: role_arn.to_string(),
                source_profile: source_profile.to_string(),
                mfa_serial: section.get("mfa_serial").map(str::to_string),
                duration_seconds: section
                    .get("duration_seconds")
                    .and_then(|s| s.parse().ok()),
            },
        })
    }

    /// The long-term key pair, when this profile carries one
    pub fn long_term_keys(&self) -> Option<(&str, &str)> {
        match &self.kind {
            ProfileKind::DirectKeys {
                access_key_id,
                secret_access_key,
            } => Some((access_key_id, secret_access_key)),
            ProfileKind::AssumedRole { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        let mut section = Properties::new();
        for (key, value) in pairs {
            section.insert(key.to_string(), value.to_string());
        }
        section
    }

    #[test]
    fn test_direct_keys_profile() {
        let section = props(&[
            ("aws_access_key_id", "AKIAEXAMPLE"),
            ("aws_secret_access_key", "secret"),
        ]);

        let profile = Profile::from_section("dev", &section).unwrap();
        assert_eq!(profile.name, "dev");
        assert_eq!(profile.long_term_keys(), Some(("AKIAEXAMPLE", "secret")));
    }

    #[test]
    fn test_assumed_role_profile() {
        let section = props(&[
            ("role_arn", "arn:aws:iam::123456789012:role/ops"),
            ("source_profile", "dev"),
            ("mfa_serial", "arn:aws:iam::123456789012:mfa/user"),
            ("duration_seconds", "7200"),
        ]);

        let profile = Profile::from_section("ops", &section).unwrap();
        assert!(profile.long_term_keys().is_none());

        match profile.kind {
            ProfileKind::AssumedRole {
                role_arn,
                source_profile,
                mfa_serial,
                duration_seconds,
            } => {
                assert_eq!(role_arn, "arn:aws:iam::123456789012:role/ops");
                assert_eq!(source_profile, "dev");
                assert_eq!(
                    mfa_serial.as_deref(),
                    Some("arn:aws:iam::123456789012:mfa/user")
                );
                assert_eq!(duration_seconds, Some(7200));
            }
            ProfileKind::DirectKeys { .. } => panic!("expected an assumed-role profile"),
        }
    }

    #[test]
    fn test_long_term_keys_take_precedence_over_role() {
        let section = props(&[
            ("aws_access_key_id", "AKIAEXAMPLE"),
            ("aws_secret_access_key", "secret"),
            ("role_arn", "arn:aws:iam::123456789012:role/ops"),
            ("source_profile", "dev"),
        ]);

        let profile = Profile::from_section("both", &section).unwrap();
        assert!(matches!(profile.kind, ProfileKind::DirectKeys { .. }));
    }

    #[test]
    fn test_role_without_source_profile_is_unusable() {
        let section = props(&[("role_arn", "arn:aws:iam::123456789012:role/ops")]);
        assert!(Profile::from_section("ops", &section).is_none());
    }

    #[test]
    fn test_empty_section_is_unusable() {
        assert!(Profile::from_section("empty", &Properties::new()).is_none());
    }

    #[test]
    fn test_unparseable_duration_falls_back_to_none() {
        let section = props(&[
            ("role_arn", "arn:aws:iam::123456789012:role/ops"),
            ("source_profile", "dev"),
            ("duration_seconds", "an hour"),
        ]);

        let profile = Profile::from_section("ops", &section).unwrap();
        match profile.kind {
            ProfileKind::AssumedRole {
                duration_seconds, ..
            } => assert_eq!(duration_seconds, None),
            ProfileKind::DirectKeys { .. } => panic!("expected an assumed-role profile"),
        }
    }
}
