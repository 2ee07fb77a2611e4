use bitvec::prelude::*;
use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Largest tile identifier accepted by a [`RuleSet`].
///
/// Candidate sets are bitsets indexed by tile id, so ids are kept small.
pub const MAX_TILE_ID: usize = u16::MAX as usize;

/// Represents a unique identifier for a tile.
///
/// Used directly as the bit index inside a [`CandidateSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TileId(pub usize);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four grid directions, seen from the tile that owns a rule.
///
/// `Up` is the row above (`y - 1`), `Left` is the column before (`x - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in the fixed order used for rule storage.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The direction pointing back from the neighbor.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// `(dx, dy)` step for this direction in row-major grid coordinates.
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

/// A set of tile identifiers stored as a bitset.
///
/// Entropy is the population count and constraint intersection is a
/// bitwise AND, so both stay cheap for the small tile counts WFC rule
/// sets usually have.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    bits: BitVec<usize, Lsb0>,
}

// Membership equality; two sets with different bit capacity compare equal
// when they hold the same tiles.
impl PartialEq for CandidateSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for CandidateSet {}

impl CandidateSet {
    /// Creates an empty set able to hold ids `0..universe` without growing.
    #[must_use]
    pub fn empty(universe: usize) -> Self {
        Self {
            bits: bitvec![usize, Lsb0; 0; universe],
        }
    }

    /// Adds a tile to the set, growing the bitset if needed.
    pub fn insert(&mut self, tile: TileId) {
        if tile.0 >= self.bits.len() {
            self.bits.resize(tile.0 + 1, false);
        }
        self.bits.set(tile.0, true);
    }

    /// Removes a tile from the set. Returns whether it was present.
    pub fn remove(&mut self, tile: TileId) -> bool {
        let present = self.contains(tile);
        if present {
            self.bits.set(tile.0, false);
        }
        present
    }

    #[must_use]
    pub fn contains(&self, tile: TileId) -> bool {
        self.bits.get(tile.0).is_some_and(|bit| *bit)
    }

    /// Number of tiles in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Removes every tile.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Iterates the member tiles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TileId> + '_ {
        self.bits.iter_ones().map(TileId)
    }

    /// Keeps only the tiles that are also in `other`.
    pub fn intersect_with(&mut self, other: &Self) {
        // Ids past the shorter bitset cannot be in both sets.
        let shared = self.bits.len().min(other.bits.len());
        self.bits.truncate(shared);
        self.bits &= &other.bits[..shared];
    }

    /// Returns a new set holding the tiles present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// Collects the members into a plain vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TileId> {
        self.iter().collect()
    }
}

impl FromIterator<TileId> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = TileId>>(iter: I) -> Self {
        let mut set = Self::default();
        for tile in iter {
            set.insert(tile);
        }
        set
    }
}

/// Authoring form of the adjacency and weight data for one tile.
///
/// Each direction lists the tiles allowed in the neighboring cell on that
/// side of this tile. Rules are not required to be symmetric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileRule {
    /// Relative selection weight. Zero means the tile is never picked by a
    /// weighted draw.
    pub weight: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub up: BTreeSet<TileId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub down: BTreeSet<TileId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub left: BTreeSet<TileId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub right: BTreeSet<TileId>,
}

impl TileRule {
    /// Creates a rule with the given weight and no allowed neighbors.
    #[must_use]
    pub fn new(weight: u32) -> Self {
        Self {
            weight,
            ..Self::default()
        }
    }

    /// Builder-style helper that sets the allowed neighbors for `direction`.
    #[must_use]
    pub fn allow<I>(mut self, direction: Direction, tiles: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        *self.neighbors_mut(direction) = tiles.into_iter().map(TileId).collect();
        self
    }

    /// Sets the same allowed neighbors on all four sides.
    #[must_use]
    pub fn allow_all_sides<I>(mut self, tiles: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let set: BTreeSet<TileId> = tiles.into_iter().map(TileId).collect();
        for direction in Direction::ALL {
            self.neighbors_mut(direction).clone_from(&set);
        }
        self
    }

    #[must_use]
    pub const fn neighbors(&self, direction: Direction) -> &BTreeSet<TileId> {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }

    fn neighbors_mut(&mut self, direction: Direction) -> &mut BTreeSet<TileId> {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}

/// Errors that can occur during `RuleSet` creation or mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleSetError {
    /// The tile id is not defined in the rule set.
    #[error("Unknown tile id: {0}")]
    UnknownTile(TileId),
    /// The same tile id was defined more than once.
    #[error("Duplicate tile id: {0}")]
    DuplicateTile(TileId),
    /// A rule lists a neighbor that is not defined in the rule set.
    #[error("Tile {tile} lists unknown tile {neighbor} as allowed {direction} neighbor")]
    UnknownNeighbor {
        tile: TileId,
        direction: Direction,
        neighbor: TileId,
    },
    /// The tile id does not fit in the candidate bitset.
    #[error("Tile id {0} exceeds the maximum of {MAX_TILE_ID}")]
    TileIdOutOfRange(TileId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CompiledRule {
    weight: u32,
    neighbors: [CandidateSet; 4],
}

/// Immutable-shape mapping from tile id to its adjacency constraints and
/// selection weight.
///
/// Adjacency lists are validated and compiled to bitsets when the set is
/// built. Only the per-tile weight can change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<TileId, CompiledRule>,
    universe: usize,
}

impl RuleSet {
    /// Builds a rule set from `(id, rule)` pairs.
    ///
    /// An empty input is accepted here; engines reject it when they
    /// initialize.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError::DuplicateTile` if an id appears twice,
    /// `RuleSetError::TileIdOutOfRange` if an id exceeds [`MAX_TILE_ID`], and
    /// `RuleSetError::UnknownNeighbor` if an adjacency list references an
    /// undefined tile.
    pub fn new<I>(tiles: I) -> Result<Self, RuleSetError>
    where
        I: IntoIterator<Item = (TileId, TileRule)>,
    {
        let mut authored: BTreeMap<TileId, TileRule> = BTreeMap::new();
        for (id, rule) in tiles {
            if id.0 > MAX_TILE_ID {
                return Err(RuleSetError::TileIdOutOfRange(id));
            }
            if authored.insert(id, rule).is_some() {
                return Err(RuleSetError::DuplicateTile(id));
            }
        }

        let universe = authored.keys().next_back().map_or(0, |max| max.0 + 1);
        let mut rules = BTreeMap::new();
        for (&id, rule) in &authored {
            let mut neighbors: [CandidateSet; 4] =
                std::array::from_fn(|_| CandidateSet::empty(universe));
            for direction in Direction::ALL {
                for &neighbor in rule.neighbors(direction) {
                    if !authored.contains_key(&neighbor) {
                        return Err(RuleSetError::UnknownNeighbor {
                            tile: id,
                            direction,
                            neighbor,
                        });
                    }
                    neighbors[direction.slot()].insert(neighbor);
                }
            }
            rules.insert(
                id,
                CompiledRule {
                    weight: rule.weight,
                    neighbors,
                },
            );
        }
        trace!("Compiled rule set: {} tiles, universe {}", rules.len(), universe);
        Ok(Self { rules, universe })
    }

    /// Number of tiles defined.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn contains(&self, tile: TileId) -> bool {
        self.rules.contains_key(&tile)
    }

    /// Bit capacity of candidate sets produced for this rule set.
    #[must_use]
    pub const fn universe(&self) -> usize {
        self.universe
    }

    /// All defined tile ids in ascending order.
    pub fn tile_ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.rules.keys().copied()
    }

    /// The set of every defined tile.
    #[must_use]
    pub fn all_tiles(&self) -> CandidateSet {
        let mut set = CandidateSet::empty(self.universe);
        for &id in self.rules.keys() {
            set.insert(id);
        }
        set
    }

    /// An empty candidate set sized for this rule set.
    #[must_use]
    pub fn empty_set(&self) -> CandidateSet {
        CandidateSet::empty(self.universe)
    }

    /// Gets the weight for a tile, or `None` if the tile is unknown.
    #[must_use]
    pub fn weight_of(&self, tile: TileId) -> Option<u32> {
        self.rules.get(&tile).map(|rule| rule.weight)
    }

    /// Tiles allowed next to `tile` on its `direction` side.
    #[must_use]
    pub fn neighbors(&self, tile: TileId, direction: Direction) -> Option<&CandidateSet> {
        self.rules
            .get(&tile)
            .map(|rule| &rule.neighbors[direction.slot()])
    }

    /// Changes the selection weight of an existing tile.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError::UnknownTile` if the tile is not defined; no
    /// entry is ever created.
    pub fn set_weight(&mut self, tile: TileId, weight: u32) -> Result<(), RuleSetError> {
        let rule = self
            .rules
            .get_mut(&tile)
            .ok_or(RuleSetError::UnknownTile(tile))?;
        rule.weight = weight;
        Ok(())
    }

    /// Converts back to the authoring form, e.g. for serialization.
    #[must_use]
    pub fn to_tile_rules(&self) -> BTreeMap<TileId, TileRule> {
        self.rules
            .iter()
            .map(|(&id, compiled)| {
                let mut rule = TileRule::new(compiled.weight);
                for direction in Direction::ALL {
                    *rule.neighbors_mut(direction) =
                        compiled.neighbors[direction.slot()].iter().collect();
                }
                (id, rule)
            })
            .collect()
    }

    /// Lists `(tile, direction, neighbor)` entries whose mirror entry is
    /// missing, i.e. `neighbor` is allowed on `tile`'s `direction` side but
    /// `tile` is not allowed on `neighbor`'s opposite side.
    #[must_use]
    pub fn asymmetries(&self) -> Vec<(TileId, Direction, TileId)> {
        let mut found = Vec::new();
        for (&tile, rule) in &self.rules {
            for direction in Direction::ALL {
                for neighbor in rule.neighbors[direction.slot()].iter() {
                    let mirrored = self
                        .neighbors(neighbor, direction.opposite())
                        .is_some_and(|set| set.contains(tile));
                    if !mirrored {
                        found.push((tile, direction, neighbor));
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tile_rules() -> RuleSet {
        RuleSet::new([
            (
                TileId(0),
                TileRule::new(1)
                    .allow(Direction::Right, [0, 1])
                    .allow(Direction::Left, [0]),
            ),
            (
                TileId(1),
                TileRule::new(3)
                    .allow(Direction::Left, [0, 1])
                    .allow(Direction::Right, [1]),
            ),
        ])
        .expect("valid rules")
    }

    #[test]
    fn candidate_set_basic_ops() {
        let mut set = CandidateSet::empty(4);
        assert!(set.is_empty());
        set.insert(TileId(1));
        set.insert(TileId(3));
        set.insert(TileId(9)); // grows past the initial universe
        assert_eq!(set.len(), 3);
        assert!(set.contains(TileId(9)));
        assert!(!set.contains(TileId(2)));
        assert!(!set.contains(TileId(100)));
        assert!(set.remove(TileId(3)));
        assert!(!set.remove(TileId(3)));
        assert_eq!(set.to_vec(), vec![TileId(1), TileId(9)]);

        let narrow: CandidateSet = [1, 9].into_iter().map(TileId).collect();
        assert_eq!(set, narrow);
    }

    #[test]
    fn candidate_set_intersection() {
        let a: CandidateSet = [0, 1, 2, 5].into_iter().map(TileId).collect();
        let b: CandidateSet = [1, 5, 7].into_iter().map(TileId).collect();
        assert_eq!(a.intersection(&b).to_vec(), vec![TileId(1), TileId(5)]);
        let c: CandidateSet = [3].into_iter().map(TileId).collect();
        assert!(a.intersection(&c).is_empty());
    }

    #[test]
    fn direction_opposites() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dx, dy) = direction.offset();
            let (ox, oy) = direction.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn lookup_weights_and_neighbors() {
        let rules = two_tile_rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.weight_of(TileId(1)), Some(3));
        assert_eq!(rules.weight_of(TileId(2)), None);
        let right = rules.neighbors(TileId(0), Direction::Right).unwrap();
        assert_eq!(right.to_vec(), vec![TileId(0), TileId(1)]);
        assert!(rules.neighbors(TileId(0), Direction::Up).unwrap().is_empty());
    }

    #[test]
    fn set_weight_rejects_unknown_tile() {
        let mut rules = two_tile_rules();
        rules.set_weight(TileId(0), 7).unwrap();
        assert_eq!(rules.weight_of(TileId(0)), Some(7));
        assert_eq!(
            rules.set_weight(TileId(4), 1),
            Err(RuleSetError::UnknownTile(TileId(4)))
        );
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn rejects_unknown_neighbor() {
        let result = RuleSet::new([(TileId(0), TileRule::new(1).allow(Direction::Up, [3]))]);
        assert_eq!(
            result,
            Err(RuleSetError::UnknownNeighbor {
                tile: TileId(0),
                direction: Direction::Up,
                neighbor: TileId(3),
            })
        );
    }

    #[test]
    fn rejects_duplicates_and_huge_ids() {
        let dup = RuleSet::new([(TileId(0), TileRule::new(1)), (TileId(0), TileRule::new(2))]);
        assert_eq!(dup, Err(RuleSetError::DuplicateTile(TileId(0))));
        let huge = RuleSet::new([(TileId(MAX_TILE_ID + 1), TileRule::new(1))]);
        assert_eq!(
            huge,
            Err(RuleSetError::TileIdOutOfRange(TileId(MAX_TILE_ID + 1)))
        );
    }

    #[test]
    fn sparse_ids_share_universe() {
        let rules = RuleSet::new([
            (TileId(2), TileRule::new(1).allow_all_sides([2, 5])),
            (TileId(5), TileRule::new(1).allow_all_sides([2])),
        ])
        .unwrap();
        assert_eq!(rules.universe(), 6);
        assert_eq!(rules.all_tiles().to_vec(), vec![TileId(2), TileId(5)]);
    }

    #[test]
    fn round_trips_authoring_form() {
        let rules = two_tile_rules();
        let rebuilt = RuleSet::new(rules.to_tile_rules()).unwrap();
        assert_eq!(rebuilt, rules);
    }

    #[test]
    fn reports_asymmetric_entries() {
        let rules = two_tile_rules();
        assert!(rules.asymmetries().is_empty());

        let lopsided = RuleSet::new([
            (TileId(0), TileRule::new(1).allow(Direction::Up, [1])),
            (TileId(1), TileRule::new(1)),
        ])
        .unwrap();
        assert_eq!(
            lopsided.asymmetries(),
            vec![(TileId(0), Direction::Up, TileId(1))]
        );
    }
}
