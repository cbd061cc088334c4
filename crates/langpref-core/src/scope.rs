//! Cookie domain scoping.
//!
//! Picks the `domain` attribute that lets every application of one
//! deployment (`apps.openedx.example.com`, `studio.openedx.example.com`)
//! share the preference without leaking it to unrelated hosts. No public
//! suffix list is consulted, so hosts under multi-label public suffixes
//! (`foo.co.uk`) get a scope that the browser will refuse; the write then
//! fails and resolution carries on with the in-memory value.
//!
//! Rules, first match wins:
//! 1. local / loopback / IP hosts → host-only
//! 2. configured override (unless it is itself local) → verbatim
//! 3. organizational marker label → `.` + suffix from the marker
//! 4. otherwise → `.` + last two labels
//!
//! Fewer than two labels is always host-only.

use std::net::IpAddr;

use langpref_types::{DomainScope, PreferenceConfig};
use tracing::debug;

/// Lower-case, strip brackets and a trailing dot.
fn normalize_host(hostname: &str) -> String {
    let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .map(str::to_string)
        .unwrap_or(host)
}

/// Hosts that must never carry a `domain` attribute.
///
/// Covers `localhost`, `*.localhost` and every IP literal. Browsers reject
/// a domain attribute on IP hosts, so public addresses are included too.
pub fn is_local_host(hostname: &str) -> bool {
    let host = normalize_host(hostname);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }
    host.parse::<IpAddr>().is_ok()
}

fn labels(host: &str) -> Option<Vec<&str>> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.iter().any(|label| label.is_empty()) {
        return None;
    }
    Some(labels)
}

/// Resolve the cookie scope for `hostname`.
///
/// ```
/// use langpref_core::scope::resolve_scope;
/// use langpref_core::types::DomainScope;
///
/// let markers = vec!["openedx".to_string()];
/// assert_eq!(
///     resolve_scope("apps.openedx.example.com", None, &markers),
///     DomainScope::domain(".openedx.example.com"),
/// );
/// assert_eq!(resolve_scope("localhost", Some("localhost"), &markers), DomainScope::HostOnly);
/// ```
pub fn resolve_scope(
    hostname: &str,
    configured_domain: Option<&str>,
    org_markers: &[String],
) -> DomainScope {
    let host = normalize_host(hostname);

    if host.is_empty() || is_local_host(&host) {
        return DomainScope::HostOnly;
    }

    let Some(labels) = labels(&host) else {
        return DomainScope::HostOnly;
    };
    if labels.len() < 2 {
        return DomainScope::HostOnly;
    }

    if let Some(domain) = configured_domain.map(str::trim).filter(|d| !d.is_empty()) {
        if !is_local_host(domain.trim_start_matches('.')) {
            return DomainScope::domain(domain);
        }
        debug!(domain = %domain, "Ignoring local cookie domain override");
    }

    let marker_at = labels.iter().position(|label| {
        org_markers.iter().any(|marker| marker.trim().eq_ignore_ascii_case(label))
    });
    if let Some(index) = marker_at {
        if labels.len() - index >= 2 {
            return DomainScope::domain(format!(".{}", labels[index..].join(".")));
        }
    }

    DomainScope::domain(format!(".{}", labels[labels.len() - 2..].join(".")))
}

/// Scope rules for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeResolver {
    configured_domain: Option<String>,
    org_markers: Vec<String>,
    legacy_scopes: Vec<String>,
}

impl ScopeResolver {
    pub fn new(
        configured_domain: Option<String>,
        org_markers: Vec<String>,
        legacy_scopes: Vec<String>,
    ) -> Self {
        Self { configured_domain, org_markers, legacy_scopes }
    }

    pub fn from_config(config: &PreferenceConfig) -> Self {
        Self::new(
            config.configured_domain().map(str::to_string),
            config.org_markers.clone(),
            config.legacy_scopes.clone(),
        )
    }

    /// Scope new writes use on `hostname`.
    pub fn resolve(&self, hostname: &str) -> DomainScope {
        let scope = resolve_scope(hostname, self.configured_domain.as_deref(), &self.org_markers);
        debug!(host = %hostname, scope = %scope, "Resolved cookie scope");
        scope
    }

    /// Every scope a copy of the cookie could have been written under on
    /// `hostname`: host-only, the bare host, each parent suffix with at
    /// least two labels (dotted and undotted), configured legacy scopes and
    /// the operator override. Order is stable and duplicate-free.
    pub fn candidates(&self, hostname: &str) -> Vec<DomainScope> {
        let mut out = vec![DomainScope::HostOnly];
        let host = normalize_host(hostname);

        if !host.is_empty() && !is_local_host(&host) {
            if let Some(labels) = labels(&host) {
                for start in 0..labels.len().saturating_sub(1) {
                    let suffix = labels[start..].join(".");
                    out.push(DomainScope::domain(format!(".{suffix}")));
                    out.push(DomainScope::domain(suffix));
                }
            }
        }

        let extra = self
            .legacy_scopes
            .iter()
            .chain(self.configured_domain.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !is_local_host(s.trim_start_matches('.')));
        for scope in extra {
            out.push(DomainScope::domain(scope));
        }

        out.push(self.resolve(hostname));

        let mut seen = std::collections::HashSet::new();
        out.retain(|scope| seen.insert(scope.clone()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["openedx".to_string()]
    }

    #[test]
    fn test_marker_suffix_is_shared() {
        assert_eq!(
            resolve_scope("apps.openedx.example.com", None, &markers()),
            DomainScope::domain(".openedx.example.com")
        );
        assert_eq!(
            resolve_scope("studio.openedx.example.com", None, &markers()),
            DomainScope::domain(".openedx.example.com")
        );
        assert_eq!(
            resolve_scope("Apps.OpenEdx.Example.COM.", None, &markers()),
            DomainScope::domain(".openedx.example.com")
        );
    }

    #[test]
    fn test_marker_as_last_label_falls_through() {
        assert_eq!(
            resolve_scope("lms.openedx", None, &markers()),
            DomainScope::domain(".lms.openedx")
        );
    }

    #[test]
    fn test_last_two_labels_without_marker() {
        assert_eq!(
            resolve_scope("lms.school.edu", None, &markers()),
            DomainScope::domain(".school.edu")
        );
        assert_eq!(resolve_scope("school.edu", None, &[]), DomainScope::domain(".school.edu"));
    }

    #[test]
    fn test_local_hosts_are_host_only() {
        for host in [
            "localhost",
            "LOCALHOST",
            "apps.localhost",
            "127.0.0.1",
            "10.1.2.3",
            "192.168.0.10",
            "172.16.5.4",
            "8.8.8.8",
            "::1",
            "[::1]",
        ] {
            assert_eq!(
                resolve_scope(host, Some(".example.com"), &markers()),
                DomainScope::HostOnly,
                "{host}"
            );
        }
    }

    #[test]
    fn test_single_label_and_malformed_hosts_are_host_only() {
        assert_eq!(resolve_scope("intranet", None, &markers()), DomainScope::HostOnly);
        assert_eq!(resolve_scope("", None, &markers()), DomainScope::HostOnly);
        assert_eq!(resolve_scope("a..example.com", None, &markers()), DomainScope::HostOnly);
    }

    #[test]
    fn test_single_label_host_ignores_override() {
        for host in ["intranet", "a..example.com", ".example.com", ""] {
            assert_eq!(
                resolve_scope(host, Some(".example.com"), &markers()),
                DomainScope::HostOnly,
                "{host}"
            );
        }
        let resolver = ScopeResolver::new(Some(".example.com".to_string()), markers(), vec![]);
        assert_eq!(resolver.resolve("intranet"), DomainScope::HostOnly);
    }

    #[test]
    fn test_configured_override_wins_over_heuristics() {
        assert_eq!(
            resolve_scope("apps.openedx.example.com", Some(" .example.com "), &markers()),
            DomainScope::domain(".example.com")
        );
    }

    #[test]
    fn test_local_override_is_ignored() {
        assert_eq!(
            resolve_scope("apps.openedx.example.com", Some("localhost"), &markers()),
            DomainScope::domain(".openedx.example.com")
        );
        assert_eq!(
            resolve_scope("apps.openedx.example.com", Some("127.0.0.1"), &markers()),
            DomainScope::domain(".openedx.example.com")
        );
        assert_eq!(resolve_scope("localhost", Some("localhost"), &markers()), DomainScope::HostOnly);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let hosts = ["apps.openedx.example.com", "localhost", "a.b.c.d.e", "x", "10.0.0.1"];
        let overrides = [None, Some(".example.com"), Some("localhost"), Some("")];
        for host in hosts {
            for domain in overrides {
                let first = resolve_scope(host, domain, &markers());
                for _ in 0..3 {
                    assert_eq!(resolve_scope(host, domain, &markers()), first);
                }
            }
        }
    }

    #[test]
    fn test_candidates_cover_every_coarsening_level() {
        let resolver = ScopeResolver::new(
            None,
            markers(),
            vec!["apps.openedx.example.com".to_string(), ".legacy.example.com".to_string()],
        );
        let candidates = resolver.candidates("apps.openedx.example.com");

        for expected in [
            DomainScope::HostOnly,
            DomainScope::domain("apps.openedx.example.com"),
            DomainScope::domain(".apps.openedx.example.com"),
            DomainScope::domain(".openedx.example.com"),
            DomainScope::domain("openedx.example.com"),
            DomainScope::domain(".example.com"),
            DomainScope::domain("example.com"),
            DomainScope::domain(".legacy.example.com"),
        ] {
            assert!(candidates.contains(&expected), "missing {expected}");
        }
        assert!(!candidates.contains(&DomainScope::domain(".com")));

        let unique: std::collections::HashSet<_> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
    }

    #[test]
    fn test_candidates_for_local_host() {
        let resolver = ScopeResolver::new(Some("localhost".to_string()), markers(), vec![]);
        assert_eq!(resolver.candidates("localhost"), vec![DomainScope::HostOnly]);
    }
}
