//! Placeholder substitution for command templates.
//!
//! A template is scanned once, left to right. Every recognized token is
//! replaced by its value and the replacement text is never rescanned.
//! Tokens without a configured value are left as they are.

use std::sync::Arc;

use interlace_common::config::Config;
use interlace_common::error::ValidationError;

use crate::pools::{ProxyPool, RandomFilePool};

/// The recognized placeholder tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    Target,
    /// Alias of [`Placeholder::Target`].
    Host,
    /// The target made safe for file names.
    CleanTarget,
    Output,
    Port,
    Proto,
    RealPort,
    Proxy,
    Random,
}

impl Placeholder {
    pub const ALL: [Placeholder; 9] = [
        Placeholder::Target,
        Placeholder::Host,
        Placeholder::CleanTarget,
        Placeholder::Output,
        Placeholder::Port,
        Placeholder::Proto,
        Placeholder::RealPort,
        Placeholder::Proxy,
        Placeholder::Random,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Target => "_target_",
            Placeholder::Host => "_host_",
            Placeholder::CleanTarget => "_cleantarget_",
            Placeholder::Output => "_output_",
            Placeholder::Port => "_port_",
            Placeholder::Proto => "_proto_",
            Placeholder::RealPort => "_realport_",
            Placeholder::Proxy => "_proxy_",
            Placeholder::Random => "_random_",
        }
    }

    fn at_start_of(text: &str) -> Option<Placeholder> {
        Self::ALL
            .into_iter()
            .find(|placeholder| text.starts_with(placeholder.token()))
    }
}

/// Process-wide substitution values.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionContext {
    pub output: Option<String>,
    pub port: Option<String>,
    pub proto: Option<String>,
    pub realport: Option<String>,
    pub proxies: Option<Arc<ProxyPool>>,
    pub random: Option<Arc<RandomFilePool>>,
}

impl SubstitutionContext {
    /// Builds the context, loading the proxy list and random directory.
    pub fn from_config(cfg: &Config) -> Result<Self, ValidationError> {
        let proxies = cfg
            .proxy_list
            .as_deref()
            .map(ProxyPool::from_file)
            .transpose()?
            .map(Arc::new);
        let random = cfg
            .random_dir
            .as_deref()
            .map(RandomFilePool::from_dir)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            output: cfg.output.clone(),
            port: cfg.port.clone(),
            proto: cfg.proto.clone(),
            realport: cfg.realport.clone(),
            proxies,
            random,
        })
    }
}

/// Values for one task. Pool draws happen at most once, on first use.
struct TaskValues<'a> {
    ctx: &'a SubstitutionContext,
    target: &'a str,
    clean_target: Option<String>,
    proxy: Option<Option<&'a str>>,
    random: Option<Option<&'a str>>,
}

impl<'a> TaskValues<'a> {
    fn new(ctx: &'a SubstitutionContext, target: &'a str) -> Self {
        Self {
            ctx,
            target,
            clean_target: None,
            proxy: None,
            random: None,
        }
    }

    fn get(&mut self, placeholder: Placeholder) -> Option<&str> {
        let ctx = self.ctx;
        match placeholder {
            Placeholder::Target | Placeholder::Host => Some(self.target),
            Placeholder::CleanTarget => {
                let target = self.target;
                Some(self.clean_target.get_or_insert_with(|| clean_target(target)).as_str())
            }
            Placeholder::Output => ctx.output.as_deref(),
            Placeholder::Port => ctx.port.as_deref(),
            Placeholder::Proto => ctx.proto.as_deref(),
            Placeholder::RealPort => ctx.realport.as_deref(),
            Placeholder::Proxy => *self
                .proxy
                .get_or_insert_with(|| ctx.proxies.as_deref().map(ProxyPool::next)),
            Placeholder::Random => *self
                .random
                .get_or_insert_with(|| ctx.random.as_deref().map(RandomFilePool::draw)),
        }
    }
}

/// Expands every placeholder in `template` for `target`.
pub fn substitute(template: &str, ctx: &SubstitutionContext, target: &str) -> String {
    let mut values = TaskValues::new(ctx, target);
    let mut out = String::with_capacity(template.len() + target.len());
    let mut rest = template;

    while let Some(pos) = rest.find('_') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match Placeholder::at_start_of(tail) {
            Some(placeholder) => {
                let token = placeholder.token();
                out.push_str(values.get(placeholder).unwrap_or(token));
                rest = &tail[token.len()..];
            }
            None => {
                out.push('_');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Strips the scheme and trailing slash, then turns `/` and `:` into `-`.
pub fn clean_target(target: &str) -> String {
    let stripped = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    stripped.trim_end_matches('/').replace(['/', ':'], "-")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SubstitutionContext {
        SubstitutionContext {
            output: Some("/tmp/out".to_string()),
            port: Some("443".to_string()),
            proto: Some("https".to_string()),
            realport: Some("8443".to_string()),
            ..Default::default()
        }
    }

    fn with_proxies(values: &[&str]) -> SubstitutionContext {
        let proxies = ProxyPool::new(values.iter().map(|v| v.to_string()).collect()).unwrap();
        SubstitutionContext {
            proxies: Some(Arc::new(proxies)),
            ..Default::default()
        }
    }

    #[test]
    fn replaces_scalar_placeholders() {
        let cmd = substitute(
            "nikto -h _proto_://_target_:_port_ -o _output_/_cleantarget_ -r _realport_",
            &ctx(),
            "example.com",
        );
        assert_eq!(
            cmd,
            "nikto -h https://example.com:443 -o /tmp/out/example.com -r 8443"
        );
    }

    #[test]
    fn host_is_an_alias_of_target() {
        assert_eq!(substitute("ping _host_", &ctx(), "10.0.0.1"), "ping 10.0.0.1");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let template = "echo snake_case __dunder__ _ _x";
        assert_eq!(substitute(template, &ctx(), "t"), template);
    }

    #[test]
    fn missing_value_leaves_token_in_place() {
        let cmd = substitute("curl -x _proxy_ _target_ > _output_", &SubstitutionContext::default(), "a");
        assert_eq!(cmd, "curl -x _proxy_ a > _output_");
    }

    #[test]
    fn substitution_is_single_pass() {
        // The target itself looks like a placeholder and must not be expanded again
        let cmd = substitute("echo _target_", &ctx(), "_port_");
        assert_eq!(cmd, "echo _port_");
    }

    #[test]
    fn adjacent_underscores_still_match() {
        assert_eq!(substitute("a__target__", &ctx(), "t"), "a_t_");
    }

    #[test]
    fn proxy_is_drawn_once_per_task() {
        let ctx = with_proxies(&["p1", "p2"]);
        assert_eq!(substitute("_proxy_ _proxy_", &ctx, "t"), "p1 p1");
        assert_eq!(substitute("_proxy_ _proxy_", &ctx, "t"), "p2 p2");
        assert_eq!(substitute("_proxy_", &ctx, "t"), "p1");
    }

    #[test]
    fn proxy_is_not_drawn_when_unused() {
        let ctx = with_proxies(&["p1", "p2"]);
        assert_eq!(substitute("echo _target_", &ctx, "t"), "echo t");
        assert_eq!(substitute("_proxy_", &ctx, "t"), "p1");
    }

    #[test]
    fn random_is_drawn_once_per_task() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("words.txt"), "x\ny\nz\n").unwrap();
        let pool = RandomFilePool::from_dir_seeded(dir.path(), 1).unwrap();
        let ctx = SubstitutionContext {
            random: Some(Arc::new(pool)),
            ..Default::default()
        };

        for _ in 0..20 {
            let cmd = substitute("_random_=_random_", &ctx, "t");
            let (left, right) = cmd.split_once('=').unwrap();
            assert_eq!(left, right);
            assert!(["x", "y", "z"].contains(&left));
        }
    }

    #[test]
    fn clean_target_is_file_name_safe() {
        assert_eq!(clean_target("https://example.com/"), "example.com");
        assert_eq!(clean_target("http://example.com:8080/a/b"), "example.com-8080-a-b");
        assert_eq!(clean_target("10.0.0.0/24"), "10.0.0.0-24");
        assert_eq!(clean_target("plain"), "plain");
    }
}
