// ─── Rule Evaluator ───
// OS rules on libraries and conditional arguments.
//
// Rules apply in order and the last applicable rule wins. A rule applies
// when it carries no OS constraint or its constraint matches the platform,
// so an unconstrained `disallow` after an OS-specific `allow` still turns the
// entry off. Callers depend on this exact behaviour; do not "fix" it here.

use serde::Deserialize;

use super::platform::Platform;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsConstraint>,
    /// Launcher feature flags (demo mode, custom resolution, quick play...).
    #[serde(default)]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OsConstraint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    /// OS version regex; not evaluated.
    #[serde(default)]
    pub version: Option<String>,
}

impl OsConstraint {
    pub fn matches(&self, platform: &Platform) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |name| name == platform.os.as_str());
        let arch_ok = self
            .arch
            .as_deref()
            .map_or(true, |arch| arch == platform.arch);
        name_ok && arch_ok
    }
}

impl Rule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
            features: None,
        }
    }

    pub fn disallow() -> Self {
        Self {
            action: RuleAction::Disallow,
            os: None,
            features: None,
        }
    }

    pub fn on_os(mut self, name: &str) -> Self {
        self.os = Some(OsConstraint {
            name: Some(name.to_string()),
            ..OsConstraint::default()
        });
        self
    }

    pub fn with_feature(mut self, feature: &str) -> Self {
        let mut features = self.features.unwrap_or_default();
        features.insert(feature.to_string(), serde_json::Value::Bool(true));
        self.features = Some(features);
        self
    }

    fn applies_to(&self, platform: &Platform) -> bool {
        self.os.as_ref().map_or(true, |os| os.matches(platform))
    }
}

/// Whether a library is used on `platform`.
pub fn library_allowed(rules: &[Rule], platform: &Platform) -> bool {
    evaluate(rules, platform, |_| true)
}

/// Whether a conditional argument is used on `platform`. Feature-gated rules
/// are skipped entirely, so feature-dependent arguments never switch on.
pub fn argument_allowed(rules: &[Rule], platform: &Platform) -> bool {
    evaluate(rules, platform, |rule| rule.features.is_none())
}

fn evaluate(rules: &[Rule], platform: &Platform, considered: impl Fn(&Rule) -> bool) -> bool {
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules.iter().filter(|rule| considered(rule)) {
        if rule.applies_to(platform) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::platform::OsName;

    fn linux() -> Platform {
        Platform::new(OsName::Linux, "x86_64")
    }

    fn windows() -> Platform {
        Platform::new(OsName::Windows, "x86_64")
    }

    #[test]
    fn no_rules_means_allowed() {
        assert!(library_allowed(&[], &linux()));
        assert!(argument_allowed(&[], &windows()));
    }

    #[test]
    fn allow_for_other_os_is_disallowed() {
        let rules = [Rule::allow().on_os("linux")];
        assert!(!library_allowed(&rules, &windows()));
        assert!(library_allowed(&rules, &linux()));
    }

    #[test]
    fn later_unconstrained_disallow_overrides() {
        let rules = [Rule::allow().on_os("linux"), Rule::disallow()];
        assert!(!library_allowed(&rules, &linux()));
    }

    #[test]
    fn classic_lwjgl_osx_exclusion() {
        let rules = [Rule::allow(), Rule::disallow().on_os("osx")];
        assert!(library_allowed(&rules, &linux()));
        assert!(!library_allowed(
            &rules,
            &Platform::new(OsName::Osx, "x86_64")
        ));
    }

    #[test]
    fn arch_constraint_must_match() {
        let rules: Vec<Rule> =
            serde_json::from_str(r#"[{"action":"allow","os":{"arch":"x86"}}]"#).unwrap();
        assert!(!argument_allowed(&rules, &linux()));
        assert!(argument_allowed(&rules, &Platform::new(OsName::Linux, "x86")));
    }

    #[test]
    fn feature_gated_disallow_alone_yields_default_false() {
        let rules = [Rule::disallow().with_feature("is_demo_user")];
        assert!(!argument_allowed(&rules, &linux()));
    }

    #[test]
    fn feature_gated_allow_is_ignored() {
        let rules = [Rule::allow().with_feature("has_custom_resolution")];
        assert!(!argument_allowed(&rules, &linux()));
        // Library evaluation does not look at features.
        assert!(library_allowed(&rules, &linux()));
    }

    #[test]
    fn os_only_disallow_set_is_false_for_both_policies() {
        let rules = [Rule::disallow().on_os("windows")];
        // Matching OS: explicitly disallowed.
        assert!(!library_allowed(&rules, &windows()));
        assert!(!argument_allowed(&rules, &windows()));
        // Other OS: nothing granted allowance, so the default holds.
        assert!(!library_allowed(&rules, &linux()));
        assert!(!argument_allowed(&rules, &linux()));
    }

    #[test]
    fn deserializes_manifest_rule_shape() {
        let rule: Rule = serde_json::from_str(
            r#"{"action":"allow","os":{"name":"osx","version":"^10\\.5\\.\\d$"},"unknown":1}"#,
        )
        .unwrap();
        assert_eq!(rule.action, RuleAction::Allow);
        assert_eq!(rule.os.unwrap().name.as_deref(), Some("osx"));
    }
}
