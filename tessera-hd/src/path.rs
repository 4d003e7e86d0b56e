//! Parse / print HD derivation paths
//!
//! Paths follow the usual `m/0'/1/i` shape: `m` roots a private
//! derivation, `M` a public one, `'` marks a hardened segment and `i` is
//! a placeholder replaced by the address index when the path is
//! instantiated for a concrete address.

use std::{fmt, str::FromStr};

use crate::Error;

/// First hardened child index.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    /// A fixed non-hardened child index.
    Index(u32),
    /// A fixed hardened child index (stored without the hardened offset).
    HardenedIndex(u32),
    /// The `i` placeholder, replaced by the address index.
    Placeholder,
    /// The `i'` placeholder, hardened.
    HardenedPlaceholder,
}

impl PathSegment {
    fn is_hardened(self) -> bool {
        matches!(self, Self::HardenedIndex(_) | Self::HardenedPlaceholder)
    }
}

/// A parsed derivation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    private: bool,
    segments: Vec<PathSegment>,
}

impl DerivationPath {
    /// Whether the path roots at `m` (private) rather than `M` (public).
    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The same path, rooted at `M`.
    pub fn to_public(&self) -> DerivationPath {
        DerivationPath {
            private: false,
            segments: self.segments.clone(),
        }
    }

    /// Whether any segment requires hardened derivation.
    pub fn has_hardened_segments(&self) -> bool {
        self.segments.iter().any(|segment| segment.is_hardened())
    }

    /// Replace placeholders with `address_index` and produce the concrete
    /// child-index sequence to derive.
    pub fn instantiate(&self, address_index: u32) -> Result<Vec<u32>, Error> {
        if address_index >= HARDENED_OFFSET {
            return Err(Error::AddressIndexOutOfRange);
        }
        Ok(self
            .segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Index(index) => *index,
                PathSegment::HardenedIndex(index) => index + HARDENED_OFFSET,
                PathSegment::Placeholder => address_index,
                PathSegment::HardenedPlaceholder => address_index + HARDENED_OFFSET,
            })
            .collect())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidDerivationPath(s.to_string());

        let mut parts = s.split('/');
        let private = match parts.next() {
            Some("m") => true,
            Some("M") => false,
            _ => return Err(invalid()),
        };

        let segments = parts
            .map(|part| {
                let (body, hardened) = match part.strip_suffix('\'') {
                    Some(body) => (body, true),
                    None => (part, false),
                };
                if body == "i" {
                    return Ok(if hardened {
                        PathSegment::HardenedPlaceholder
                    } else {
                        PathSegment::Placeholder
                    });
                }
                if body.is_empty() || body.len() > 1 && body.starts_with('0') {
                    return Err(invalid());
                }
                let index: u32 = body.parse().map_err(|_| invalid())?;
                if index >= HARDENED_OFFSET {
                    return Err(invalid());
                }
                Ok(if hardened {
                    PathSegment::HardenedIndex(index)
                } else {
                    PathSegment::Index(index)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DerivationPath { private, segments })
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.private { "m" } else { "M" })?;
        for segment in &self.segments {
            match segment {
                PathSegment::Index(index) => write!(f, "/{index}")?,
                PathSegment::HardenedIndex(index) => write!(f, "/{index}'")?,
                PathSegment::Placeholder => write!(f, "/i")?,
                PathSegment::HardenedPlaceholder => write!(f, "/i'")?,
            }
        }
        Ok(())
    }
}
