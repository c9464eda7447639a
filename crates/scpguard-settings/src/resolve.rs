use crate::{model::ScpguardConfigV1, presets};
use anyhow::Context;
use scpguard_domain::policy::{Allowlist, CheckPolicy, EffectiveConfig, FailOn};
use scpguard_types::Severity;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub max_findings: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
    /// Exception registry path relative to the root.
    pub exceptions_path: String,
}

pub fn resolve_config(
    cfg: ScpguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "strict".to_string());

    let mut effective = presets::preset(&profile);

    // max findings
    if let Some(mf) = overrides.max_findings.or(cfg.max_findings) {
        effective.max_findings = mf as usize;
    }

    if let Some(limit) = cfg.max_policy_chars {
        anyhow::ensure!(limit > 0, "max_policy_chars must be greater than zero");
        effective.guardrails.max_policy_chars = limit as usize;
    }

    // regions
    if let Some(allowed) = cfg.regions.allowed.as_deref() {
        validate_regions("regions.allowed", allowed)?;
        effective.guardrails.allowed_regions = dedup(allowed);
    }
    if let Some(probe) = cfg.regions.probe.as_deref() {
        validate_regions("regions.probe", probe)?;
        effective.guardrails.probe_regions = dedup(probe);
    }
    if let Some(action) = cfg.regions.probe_action.as_deref() {
        validate_action("regions.probe_action", action)?;
        effective.guardrails.probe_action = action.to_string();
    }

    // protected actions
    if let Some(actions) = cfg.protected.actions.as_deref() {
        for action in actions {
            validate_action("protected.actions", action)?;
        }
        effective.guardrails.protected_actions = dedup(actions);
    }

    // per-check overrides
    for (check_id, cc) in cfg.checks.iter() {
        let entry = effective
            .checks
            .entry(check_id.clone())
            .or_insert_with(CheckPolicy::disabled);

        if let Some(enabled) = cc.enabled {
            entry.enabled = enabled;
        }
        if let Some(sev) = cc.severity.as_deref() {
            entry.severity =
                parse_severity(sev).with_context(|| format!("invalid severity for {check_id}"))?;
        }
        if !cc.allow.is_empty() {
            entry.allow = Allowlist::new(&cc.allow)
                .with_context(|| format!("invalid allow glob for {check_id}"))?;
        }
    }

    // fail_on override from config
    if let Some(fail_on_s) = cfg.fail_on.as_deref() {
        effective.fail_on = parse_fail_on(fail_on_s)?;
    }

    let exceptions_path = cfg
        .exceptions
        .clone()
        .unwrap_or_else(|| presets::DEFAULT_EXCEPTIONS_FILE.to_string());

    Ok(ResolvedConfig {
        effective,
        exceptions_path,
    })
}

fn dedup(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

/// Region names look like `eu-west-2` or `us-gov-east-1`.
fn validate_regions(field: &str, regions: &[String]) -> anyhow::Result<()> {
    for region in regions {
        let parts: Vec<&str> = region.split('-').collect();
        let valid = parts.len() >= 3
            && parts
                .last()
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            && parts[..parts.len() - 1]
                .iter()
                .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_lowercase()));
        if !valid {
            anyhow::bail!("invalid region name in {field}: {region:?}");
        }
    }
    Ok(())
}

fn validate_action(field: &str, action: &str) -> anyhow::Result<()> {
    match action.split_once(':') {
        Some((service, operation)) if !service.is_empty() && !operation.is_empty() => Ok(()),
        _ => anyhow::bail!("invalid action in {field}: {action:?} (expected service:Operation)"),
    }
}

fn parse_severity(v: &str) -> anyhow::Result<Severity> {
    match v {
        "info" => Ok(Severity::Info),
        "warning" | "warn" => Ok(Severity::Warn),
        "error" => Ok(Severity::Error),
        other => anyhow::bail!("unknown severity: {other} (expected info|warn|error)"),
    }
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "error" => Ok(FailOn::Error),
        "warning" | "warn" => Ok(FailOn::Warn),
        other => anyhow::bail!("unknown fail_on: {other} (expected error|warn)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;
    use scpguard_types::ids;

    fn resolve(toml: &str) -> anyhow::Result<ResolvedConfig> {
        resolve_config(parse_config_toml(toml)?, Overrides::default())
    }

    #[test]
    fn empty_config_uses_strict_defaults() {
        let resolved = resolve("").expect("resolve");
        let eff = &resolved.effective;
        assert_eq!(eff.profile, "strict");
        assert_eq!(eff.max_findings, 200);
        assert_eq!(
            eff.guardrails.allowed_regions,
            vec!["eu-west-2", "eu-west-1", "us-east-1"]
        );
        assert_eq!(eff.guardrails.max_policy_chars, 5120);
        assert_eq!(resolved.exceptions_path, "scpguard-exceptions.toml");
    }

    #[test]
    fn overrides_beat_config() {
        let cfg = parse_config_toml("profile = \"warn\"\nmax_findings = 10\n").expect("parse");
        let resolved = resolve_config(
            cfg,
            Overrides {
                profile: Some("compat".to_string()),
                max_findings: Some(3),
            },
        )
        .expect("resolve");
        assert_eq!(resolved.effective.profile, "compat");
        assert_eq!(resolved.effective.max_findings, 3);
    }

    #[test]
    fn config_replaces_guardrails() {
        let resolved = resolve(
            r#"
max_policy_chars = 4096
exceptions = "config/exceptions.toml"

[regions]
allowed = ["eu-central-1", "eu-central-1"]
probe = ["us-west-2"]
probe_action = "s3:PutObject"

[protected]
actions = ["organizations:LeaveOrganization"]
"#,
        )
        .expect("resolve");
        let g = &resolved.effective.guardrails;
        assert_eq!(g.allowed_regions, vec!["eu-central-1"]);
        assert_eq!(g.probe_regions, vec!["us-west-2"]);
        assert_eq!(g.probe_action, "s3:PutObject");
        assert_eq!(g.protected_actions, vec!["organizations:LeaveOrganization"]);
        assert_eq!(g.max_policy_chars, 4096);
        assert_eq!(resolved.exceptions_path, "config/exceptions.toml");
    }

    #[test]
    fn per_check_overrides_apply() {
        let resolved = resolve(
            r#"
fail_on = "warn"

[checks."scp.size_limit"]
severity = "warn"
allow = ["legacy/*"]

[checks."scp.region_restriction"]
enabled = false
"#,
        )
        .expect("resolve");
        let eff = &resolved.effective;
        assert_eq!(eff.fail_on, FailOn::Warn);
        let size = eff
            .check_policy(ids::CHECK_SCP_SIZE_LIMIT)
            .expect("enabled");
        assert_eq!(size.severity, Severity::Warn);
        assert!(size.allow.is_allowed("legacy/big.json"));
        assert!(eff.check_policy(ids::CHECK_SCP_REGION_RESTRICTION).is_none());
    }

    #[test]
    fn unknown_check_is_disabled_unless_enabled() {
        let resolved = resolve("[checks.\"scp.custom\"]\nseverity = \"error\"\n").expect("resolve");
        assert!(resolved.effective.check_policy("scp.custom").is_none());
    }

    #[test]
    fn invalid_values_carry_context() {
        let err = resolve("[checks.\"scp.size_limit\"]\nseverity = \"fatal\"\n")
            .expect_err("bad severity");
        assert!(format!("{err:#}").contains("invalid severity for scp.size_limit"));

        let err = resolve("fail_on = \"never\"\n").expect_err("bad fail_on");
        assert!(err.to_string().contains("unknown fail_on"));

        let err = resolve("[checks.\"scp.size_limit\"]\nallow = [\"[\"]\n").expect_err("bad glob");
        assert!(format!("{err:#}").contains("invalid allow glob"));

        let err = resolve("[regions]\nallowed = [\"London\"]\n").expect_err("bad region");
        assert!(err.to_string().contains("invalid region name"));

        let err = resolve("[protected]\nactions = [\"kms\"]\n").expect_err("bad action");
        assert!(err.to_string().contains("invalid action"));
    }

    #[test]
    fn govcloud_region_names_are_valid() {
        let resolved = resolve("[regions]\nallowed = [\"us-gov-west-1\"]\n").expect("resolve");
        assert_eq!(
            resolved.effective.guardrails.allowed_regions,
            vec!["us-gov-west-1"]
        );
    }
}
