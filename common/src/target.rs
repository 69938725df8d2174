//! # Target Model
//!
//! Defines the possible inputs for a run and how they expand into the final,
//! ordered list of concrete targets.
//!
//! A target specification can be:
//! * A single value (host name, IP address, URL, ...).
//! * A comma separated list (e.g., `a.example.com, 10.0.0.1`).
//! * An IPv4 range (e.g., `192.168.1.1-100`).
//! * A CIDR block (e.g., `192.168.1.0/24`).
//! * A glob pattern (e.g., `*.example.com`), matched against a candidate list.
//!
//! Exclusions use the same notation and are subtracted after expansion.

pub mod range;

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use globset::{Glob, GlobMatcher};
use pnet::ipnetwork::Ipv4Network;

use crate::error::ExpansionError;
use crate::warn;
use range::Ipv4Range;

/// Blocks larger than this are expanded with a warning.
const LARGE_BLOCK_PREFIX: u8 = 16;

/// Most addresses a single block or range may expand to, the size of a /12.
pub const MAX_EXPANDED_ADDRESSES: u64 = 1 << 20;

/// A parsed target or exclusion value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSpec {
    /// A literal value, passed through untouched.
    Single { value: String },
    /// An IPv4 CIDR block, kept together with its original notation.
    Cidr { block: String, network: Ipv4Network },
    /// An IPv6 CIDR block. Only usable as a literal.
    Cidr6 { block: String },
    /// An inclusive IPv4 range.
    Range { ipv4_range: Ipv4Range },
    /// A wildcard pattern (`*`, `?`).
    Glob { pattern: String },
    /// Holds a list of different specs, in order.
    Multi { specs: Vec<TargetSpec> },
}

impl FromStr for TargetSpec {
    type Err = ExpansionError;

    /// Parses a single value into a `TargetSpec`.
    ///
    /// Values that merely look unusual (URLs, host names with dashes) are
    /// literals. Values that clearly try to be a CIDR block or an IPv4 range
    /// but are malformed are errors.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains(',') {
            return parse_commas(s);
        }

        if is_glob(s) {
            return Ok(TargetSpec::Glob {
                pattern: s.to_string(),
            });
        }

        if let Some(spec) = parse_cidr(s)? {
            return Ok(spec);
        }

        if let Some(spec) = parse_ip_range(s)? {
            return Ok(spec);
        }

        Ok(TargetSpec::Single {
            value: s.to_string(),
        })
    }
}

impl TargetSpec {
    /// Whether any part of the spec is a glob pattern.
    pub fn has_glob(&self) -> bool {
        match self {
            TargetSpec::Glob { .. } => true,
            TargetSpec::Multi { specs } => specs.iter().any(TargetSpec::has_glob),
            _ => false,
        }
    }

    /// Parses a list input where every line is a spec of its own.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, ExpansionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut specs = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            specs.push(line.parse()?);
        }
        Ok(TargetSpec::Multi { specs })
    }
}

/// Parses a comma-separated list (e.g., "10.0.0.1, example.com, 10.0.1.0/24").
pub fn parse_commas(s: &str) -> Result<TargetSpec, ExpansionError> {
    let mut specs = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        specs.push(part.parse()?);
    }

    Ok(TargetSpec::Multi { specs })
}

/// Whether a value is a glob pattern rather than a literal target.
///
/// `*` always marks a glob. `?` only does outside URLs, where it starts a query.
fn is_glob(s: &str) -> bool {
    s.contains('*') || (s.contains('?') && !s.contains("://"))
}

/// Parses CIDR notation like "192.168.1.0/24".
///
/// Only strings shaped like `<digits and dots>/<digits>` or `<ipv6>/<digits>`
/// are treated as blocks, so paths and URLs stay literal.
fn parse_cidr(s: &str) -> Result<Option<TargetSpec>, ExpansionError> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };
    if prefix_str.is_empty() || !prefix_str.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }

    if ip_str.parse::<Ipv6Addr>().is_ok() {
        return Ok(Some(TargetSpec::Cidr6 {
            block: s.to_string(),
        }));
    }

    if ip_str.is_empty() || !ip_str.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Ok(None);
    }

    let block = s.to_string();
    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|_| ExpansionError::InvalidCidrAddress {
            block: block.clone(),
        })?;
    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|_| ExpansionError::InvalidCidrPrefix {
            block: block.clone(),
        })?;
    let network = Ipv4Network::new(ipv4_addr, prefix).map_err(|_| {
        ExpansionError::InvalidCidrPrefix {
            block: block.clone(),
        }
    })?;

    Ok(Some(TargetSpec::Cidr { block, network }))
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
fn parse_ip_range(s: &str) -> Result<Option<TargetSpec>, ExpansionError> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };
    let Ok(start_addr) = start_str.trim().parse::<Ipv4Addr>() else {
        return Ok(None);
    };

    let end_addr = parse_range_end_addr(end_str.trim(), &start_addr).map_err(|reason| {
        ExpansionError::InvalidRange {
            range: s.to_string(),
            reason,
        }
    })?;

    let ipv4_range = Ipv4Range::new(start_addr, end_addr);
    Ok(Some(TargetSpec::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(end_str: &str, start_addr: &Ipv4Addr) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err("end of range cannot be empty".to_string());
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("invalid end '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("end '{end_str}' has too many octets"));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// An ordered sequence of unique targets, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, value: String) -> bool {
        if self.seen.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Removes every value present in `other`, keeping the order of the rest.
    pub fn subtract(&mut self, other: &TargetSet) {
        self.items.retain(|item| !other.contains(item));
        self.seen.retain(|item| !other.contains(item));
    }
}

impl<S: Into<String>> FromIterator<S> for TargetSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TargetSet::new();
        for value in iter {
            set.insert(value.into());
        }
        set
    }
}

impl IntoIterator for TargetSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Expands [`TargetSpec`]s into a [`TargetSet`].
#[derive(Clone, Copy, Debug)]
pub struct TargetExpander<'a> {
    cidr_expansion: bool,
    candidates: Option<&'a [String]>,
}

impl<'a> TargetExpander<'a> {
    pub fn new(cidr_expansion: bool) -> Self {
        Self {
            cidr_expansion,
            candidates: None,
        }
    }

    /// Sets the list that glob patterns are matched against.
    pub fn with_candidates(mut self, candidates: &'a [String]) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Expands a spec into an ordered, deduplicated set.
    ///
    /// Either the whole spec expands or an error is returned; nothing is
    /// partially expanded.
    pub fn expand(&self, spec: &TargetSpec) -> Result<TargetSet, ExpansionError> {
        let mut set = TargetSet::new();
        self.expand_into(spec, &mut set)?;
        Ok(set)
    }

    /// Expands `targets`, then removes everything `exclusions` expands to.
    ///
    /// Glob patterns among the exclusions match against the expanded targets.
    pub fn resolve(
        &self,
        targets: &TargetSpec,
        exclusions: Option<&TargetSpec>,
    ) -> Result<TargetSet, ExpansionError> {
        let mut set = self.expand(targets)?;

        if let Some(exclusions) = exclusions {
            let excluded = TargetExpander::new(self.cidr_expansion)
                .with_candidates(set.as_slice())
                .expand(exclusions)?;
            set.subtract(&excluded);
        }

        Ok(set)
    }

    fn expand_into(&self, spec: &TargetSpec, set: &mut TargetSet) -> Result<(), ExpansionError> {
        match spec {
            TargetSpec::Single { value } => {
                set.insert(value.clone());
            }
            TargetSpec::Cidr { block, network } => {
                if !self.cidr_expansion {
                    set.insert(block.clone());
                    return Ok(());
                }
                let hosts = range::cidr_hosts(*network);
                check_size(block, &hosts)?;
                if network.prefix() < LARGE_BLOCK_PREFIX {
                    warn!("Expanding {block} into {} hosts", hosts.len());
                }
                for addr in hosts.iter() {
                    set.insert(addr.to_string());
                }
            }
            TargetSpec::Cidr6 { block } => {
                if self.cidr_expansion {
                    return Err(ExpansionError::Ipv6Cidr {
                        block: block.clone(),
                    });
                }
                set.insert(block.clone());
            }
            TargetSpec::Range { ipv4_range } => {
                let spec = format!("{}-{}", ipv4_range.start_addr, ipv4_range.end_addr);
                check_size(&spec, ipv4_range)?;
                for addr in ipv4_range.iter() {
                    set.insert(addr.to_string());
                }
            }
            TargetSpec::Glob { pattern } => {
                let Some(candidates) = self.candidates else {
                    return Err(ExpansionError::GlobWithoutCandidates {
                        pattern: pattern.clone(),
                    });
                };
                let matcher = compile_glob(pattern)?;
                for candidate in candidates.iter().filter(|c| matcher.is_match(c.as_str())) {
                    set.insert(candidate.clone());
                }
            }
            TargetSpec::Multi { specs } => {
                for spec in specs {
                    self.expand_into(spec, set)?;
                }
            }
        }
        Ok(())
    }
}

fn check_size(spec: &str, range: &Ipv4Range) -> Result<(), ExpansionError> {
    if range.len() > MAX_EXPANDED_ADDRESSES {
        return Err(ExpansionError::TooLarge {
            spec: spec.to_string(),
            hosts: range.len(),
            limit: MAX_EXPANDED_ADDRESSES,
        });
    }
    Ok(())
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher, ExpansionError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| ExpansionError::InvalidGlob {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
