// crates/gatehouse-core/src/matchers/network.rs
// ============================================================================
// Module: Gatehouse Network Resolver
// Description: IP/CIDR parsing, named network groups and the range arena.
// Purpose: Resolve network references once per compilation and share ranges.
// Dependencies: smallvec, thiserror
// ============================================================================

//! ## Overview
//! A [`NetworkResolver`] is built for exactly one compilation. It parses named
//! network groups, caches every literal it sees, and interns ranges by their
//! canonical form so that `10.0.0.0/8` written in three places is stored once.
//! When compilation finishes the resolver is frozen into a [`NetworkTable`]
//! and rules keep [`NetworkHandle`] indices into it.
//!
//! Security posture: network literals come from operator configuration. A
//! group that lost a member, or whose name was declared twice, is reported as
//! degraded so the rule compiler can force rules that reference it to deny.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use std::str::FromStr;

use smallvec::SmallVec;
use thiserror::Error;

use crate::core::spec::NetworkGroupSpec;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Longest IPv4 prefix.
const IPV4_MAX_PREFIX: u8 = 32;
/// Longest IPv6 prefix.
const IPV6_MAX_PREFIX: u8 = 128;
/// Prefix bits of the IPv4-mapped IPv6 block (`::ffff:0:0/96`).
const IPV4_MAPPED_PREFIX: u8 = 96;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a network literal cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkParseError {
    /// The address part is not an IPv4 or IPv6 address.
    #[error("invalid network address: {literal}")]
    InvalidAddress {
        /// Offending literal.
        literal: String,
    },
    /// The prefix length is not a number.
    #[error("invalid prefix length in network {literal}")]
    InvalidPrefix {
        /// Offending literal.
        literal: String,
    },
    /// The prefix length exceeds the address width.
    #[error("prefix length {prefix} exceeds {max} in network {literal}")]
    PrefixTooLong {
        /// Offending literal.
        literal: String,
        /// Parsed prefix length.
        prefix: u8,
        /// Maximum for the address family.
        max: u8,
    },
}

// ============================================================================
// SECTION: Ranges
// ============================================================================

/// One contiguous address range.
///
/// # Invariants
/// - Host bits below the prefix are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkRange {
    /// IPv4 range.
    V4 {
        /// Masked network bits.
        network: u32,
        /// Prefix length, at most 32.
        prefix: u8,
    },
    /// IPv6 range.
    V6 {
        /// Masked network bits.
        network: u128,
        /// Prefix length, at most 128.
        prefix: u8,
    },
}

impl NetworkRange {
    /// Builds the single-host range for `addr` (/32 or /128).
    #[must_use]
    pub fn host(addr: IpAddr) -> Self {
        match addr.to_canonical() {
            IpAddr::V4(v4) => Self::V4 {
                network: u32::from(v4),
                prefix: IPV4_MAX_PREFIX,
            },
            IpAddr::V6(v6) => Self::V6 {
                network: u128::from(v6),
                prefix: IPV6_MAX_PREFIX,
            },
        }
    }

    /// Parses an IP or CIDR literal. Host bits are masked off.
    ///
    /// IPv4-mapped literals with a prefix of at least /96 are stored as the
    /// equivalent IPv4 range, since sources are compared in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkParseError`] when the address or prefix is malformed.
    pub fn parse(literal: &str) -> Result<Self, NetworkParseError> {
        let trimmed = literal.trim();
        let Some((address, prefix)) = trimmed.split_once('/') else {
            let addr = IpAddr::from_str(trimmed).map_err(|_| NetworkParseError::InvalidAddress {
                literal: literal.to_string(),
            })?;
            return Ok(Self::host(addr));
        };
        let addr = IpAddr::from_str(address).map_err(|_| NetworkParseError::InvalidAddress {
            literal: literal.to_string(),
        })?;
        if prefix.is_empty() || !prefix.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(NetworkParseError::InvalidPrefix {
                literal: literal.to_string(),
            });
        }
        let prefix: u8 = prefix.parse().map_err(|_| NetworkParseError::InvalidPrefix {
            literal: literal.to_string(),
        })?;
        match addr {
            IpAddr::V4(v4) => {
                if prefix > IPV4_MAX_PREFIX {
                    return Err(NetworkParseError::PrefixTooLong {
                        literal: literal.to_string(),
                        prefix,
                        max: IPV4_MAX_PREFIX,
                    });
                }
                Ok(Self::V4 {
                    network: u32::from(v4) & v4_mask(prefix),
                    prefix,
                })
            }
            IpAddr::V6(v6) => {
                if prefix > IPV6_MAX_PREFIX {
                    return Err(NetworkParseError::PrefixTooLong {
                        literal: literal.to_string(),
                        prefix,
                        max: IPV6_MAX_PREFIX,
                    });
                }
                if let Some(v4) = v6.to_ipv4_mapped()
                    && prefix >= IPV4_MAPPED_PREFIX
                {
                    let prefix = prefix - IPV4_MAPPED_PREFIX;
                    return Ok(Self::V4 {
                        network: u32::from(v4) & v4_mask(prefix),
                        prefix,
                    });
                }
                Ok(Self::V6 {
                    network: u128::from(v6) & v6_mask(prefix),
                    prefix,
                })
            }
        }
    }

    /// Returns true when `addr` falls inside the range.
    ///
    /// IPv4-mapped IPv6 addresses are compared as IPv4.
    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self, addr.to_canonical()) {
            (Self::V4 { network, prefix }, IpAddr::V4(v4)) => {
                u32::from(v4) & v4_mask(*prefix) == *network
            }
            (Self::V6 { network, prefix }, IpAddr::V6(v6)) => {
                u128::from(v6) & v6_mask(*prefix) == *network
            }
            _ => false,
        }
    }

    /// Prefix length of the range.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        match self {
            Self::V4 { prefix, .. } | Self::V6 { prefix, .. } => *prefix,
        }
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 { network, prefix } => write!(f, "{}/{prefix}", Ipv4Addr::from(*network)),
            Self::V6 { network, prefix } => write!(f, "{}/{prefix}", Ipv6Addr::from(*network)),
        }
    }
}

impl FromStr for NetworkRange {
    type Err = NetworkParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Network mask for an IPv4 prefix.
const fn v4_mask(prefix: u8) -> u32 {
    if prefix == 0 { 0 } else { u32::MAX << (IPV4_MAX_PREFIX - prefix) }
}

/// Network mask for an IPv6 prefix.
const fn v6_mask(prefix: u8) -> u128 {
    if prefix == 0 { 0 } else { u128::MAX << (IPV6_MAX_PREFIX - prefix) }
}

// ============================================================================
// SECTION: Arena
// ============================================================================

/// Index of a range inside a [`NetworkTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkHandle(usize);

impl NetworkHandle {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle list attached to a rule or group; most hold one or two ranges.
pub type NetworkHandles = SmallVec<[NetworkHandle; 4]>;

/// Immutable arena of interned ranges shared by every rule of one rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkTable {
    /// Interned ranges, indexed by [`NetworkHandle`].
    ranges: Vec<NetworkRange>,
}

impl NetworkTable {
    /// Returns the range behind `handle`.
    #[must_use]
    pub fn get(&self, handle: NetworkHandle) -> Option<&NetworkRange> {
        self.ranges.get(handle.0)
    }

    /// Returns true when any of `handles` contains `addr`.
    #[must_use]
    pub fn contains_any(&self, handles: &[NetworkHandle], addr: IpAddr) -> bool {
        handles.iter().any(|handle| self.get(*handle).is_some_and(|range| range.contains(addr)))
    }

    /// Number of distinct ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true when the table holds no ranges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Problems found while resolving named network groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupIssue {
    /// A later group reused an existing name and was ignored.
    Duplicate {
        /// Group name.
        name: String,
    },
    /// A literal inside a group did not parse and was skipped.
    InvalidNetwork {
        /// Group name.
        group: String,
        /// Parse failure.
        error: NetworkParseError,
    },
}

/// Per-compilation network resolver.
#[derive(Debug, Default)]
pub struct NetworkResolver {
    /// Arena under construction.
    ranges: Vec<NetworkRange>,
    /// Canonical range to arena index.
    interned: HashMap<NetworkRange, NetworkHandle>,
    /// Literal text to its parse outcome.
    literals: HashMap<String, Result<NetworkHandle, NetworkParseError>>,
    /// Group name to member handles.
    groups: HashMap<String, NetworkHandles>,
    /// Groups that lost a member or were declared more than once.
    degraded: HashSet<String>,
}

impl NetworkResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves named groups in declaration order.
    ///
    /// The first group with a given name wins; malformed members are skipped
    /// and reported while the rest of the group stays usable. Either issue
    /// marks the group as degraded.
    pub fn resolve_groups(&mut self, groups: &[NetworkGroupSpec]) -> Vec<GroupIssue> {
        let mut issues = Vec::new();
        for group in groups {
            if self.groups.contains_key(&group.name) {
                issues.push(GroupIssue::Duplicate {
                    name: group.name.clone(),
                });
                self.degraded.insert(group.name.clone());
                continue;
            }
            let mut handles = NetworkHandles::new();
            for literal in &group.networks {
                match self.parse(literal) {
                    Ok(handle) => {
                        if !handles.contains(&handle) {
                            handles.push(handle);
                        }
                    }
                    Err(error) => {
                        self.degraded.insert(group.name.clone());
                        issues.push(GroupIssue::InvalidNetwork {
                            group: group.name.clone(),
                            error,
                        });
                    }
                }
            }
            self.groups.insert(group.name.clone(), handles);
        }
        issues
    }

    /// Parses a literal, reusing earlier results for the same text.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkParseError`] when the literal is malformed.
    pub fn parse(&mut self, literal: &str) -> Result<NetworkHandle, NetworkParseError> {
        if let Some(cached) = self.literals.get(literal) {
            return cached.clone();
        }
        let outcome = NetworkRange::parse(literal).map(|range| self.intern(range));
        self.literals.insert(literal.to_string(), outcome.clone());
        outcome
    }

    /// Resolves a rule reference: a group name first, a literal second.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkParseError`] when the reference is neither a known
    /// group nor a valid literal.
    pub fn resolve_reference(&mut self, reference: &str) -> Result<NetworkHandles, NetworkParseError> {
        if let Some(handles) = self.groups.get(reference) {
            return Ok(handles.clone());
        }
        let handle = self.parse(reference)?;
        let mut handles = NetworkHandles::new();
        handles.push(handle);
        Ok(handles)
    }

    /// Returns the handles of a resolved group.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&[NetworkHandle]> {
        self.groups.get(name).map(SmallVec::as_slice)
    }

    /// Returns true when `name` is a group that lost members or was redeclared.
    #[must_use]
    pub fn is_degraded(&self, name: &str) -> bool {
        self.degraded.contains(name)
    }

    /// Freezes the arena.
    #[must_use]
    pub fn into_table(self) -> NetworkTable {
        NetworkTable {
            ranges: self.ranges,
        }
    }

    /// Stores `range` once and returns its handle.
    fn intern(&mut self, range: NetworkRange) -> NetworkHandle {
        if let Some(handle) = self.interned.get(&range) {
            return *handle;
        }
        let handle = NetworkHandle(self.ranges.len());
        self.ranges.push(range);
        self.interned.insert(range, handle);
        handle
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
