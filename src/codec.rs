//! Conversion between URL fragments and configurations.
//!
//! The canonical fragment is `<shape>|<algorithm>|<seed>`, for example
//! `T7|Kruskal|1234`. Decoding is more permissive than encoding: a bare
//! integer shape token is read as a square rectilinear maze, and any token
//! that fails to parse falls back to its default without affecting the others.

use crate::constants::{FRAGMENT_SEPARATOR, FRAGMENT_TOKENS};
use crate::seed::SeedSource;
use crate::types::{Algorithm, Configuration, Defaults, Seed, Shape, ShapeKind};

/// The fields a fragment managed to carry. Each is `None` when its token was
/// absent, empty or unparseable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FragmentFields {
    /// Decoded shape, already clamped into its domain
    pub shape: Option<Shape>,
    /// Decoded algorithm
    pub algorithm: Option<Algorithm>,
    /// Decoded seed
    pub seed: Option<Seed>,
}

impl FragmentFields {
    /// Overlays the decoded fields onto `base`, leaving every other field as it was.
    pub fn resolve(self, base: Configuration) -> Configuration {
        Configuration {
            shape: self.shape.unwrap_or(base.shape),
            algorithm: self.algorithm.unwrap_or(base.algorithm),
            seed: self.seed.unwrap_or(base.seed),
            ..base
        }
    }
}

/// Parses a fragment into whichever fields it carries. Never fails.
///
/// A single leading `#` is ignored, as are tokens past the third.
pub fn parse(fragment: &str) -> FragmentFields {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let mut tokens = fragment.splitn(FRAGMENT_TOKENS + 1, FRAGMENT_SEPARATOR);
    let fields = FragmentFields {
        shape: tokens.next().and_then(parse_shape),
        algorithm: tokens.next().and_then(Algorithm::from_name),
        seed: tokens.next().and_then(parse_seed),
    };
    log::trace!("parsed fragment {fragment:?} into {fields:?}");
    fields
}

/// Decodes a fragment into a complete configuration.
///
/// Fields the fragment does not carry come from `defaults`; a missing seed is
/// drawn from `seeds`. Colour, features and stroke width are never part of the
/// fragment and always come from `defaults`.
pub fn decode(fragment: &str, defaults: &Defaults, seeds: &mut impl SeedSource) -> Configuration {
    let fields = parse(fragment);
    let seed = match fields.seed {
        Some(seed) => seed,
        None => seeds.fresh_seed(),
    };
    fields.resolve(Configuration::from_defaults(defaults, seed))
}

/// Encodes the fragment-carried fields of `configuration` canonically.
pub fn encode(configuration: &Configuration) -> String {
    format!(
        "{}{}{sep}{}{sep}{}",
        configuration.shape.kind().letter(),
        configuration.shape.size(),
        configuration.algorithm,
        configuration.seed,
        sep = FRAGMENT_SEPARATOR,
    )
}

/// Compares the fields the fragment carries: shape kind and primary size,
/// algorithm and seed.
pub fn semantically_equal(a: &Configuration, b: &Configuration) -> bool {
    a.shape.kind() == b.shape.kind()
        && a.shape.size() == b.shape.size()
        && a.algorithm == b.algorithm
        && a.seed == b.seed
}

fn parse_shape(token: &str) -> Option<Shape> {
    let mut chars = token.chars();
    let first = chars.next()?;
    match ShapeKind::from_letter(first) {
        Some(kind) => parse_size(chars.as_str()).map(|size| kind.with_size(size)),
        // Legacy: a bare number is the side of a square maze.
        None => parse_size(token).map(|size| ShapeKind::Rectilinear.with_size(size)),
    }
}

/// Unsigned decimal digits only. Values too large for `i64` saturate, which the
/// clamp then maps to the kind's upper bound.
fn parse_size(digits: &str) -> Option<i64> {
    if !is_unsigned(digits) {
        return None;
    }
    Some(
        digits
            .parse::<u64>()
            .ok()
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(i64::MAX),
    )
}

fn parse_seed(digits: &str) -> Option<Seed> {
    if !is_unsigned(digits) {
        return None;
    }
    digits.parse::<u64>().ok().map(Seed)
}

fn is_unsigned(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
