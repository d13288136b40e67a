use crate::tree::{Db, Smt, TreeError, TreeHasher};
use alloy::primitives::{Address, B256, U256};
use std::collections::HashMap;
use tracing::trace;

/// Tree key holding the number of assigned slots.
pub const SLOT_COUNT_KEY: u64 = u64::MAX;

/// Bit set on every account leaf, so that the zero address still occupies a
/// leaf in the tree.
const PRESENCE_BIT: usize = 160;

/// The outcome of looking up an address in the [`AccountIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAssignment {
    /// The address already has this slot.
    Existing(u32),
    /// The address is new, and would receive this slot.
    New(u32),
}

impl SlotAssignment {
    /// The slot, new or existing.
    pub const fn slot(&self) -> u32 {
        match self {
            Self::Existing(slot) | Self::New(slot) => *slot,
        }
    }

    /// True if the slot has not been assigned yet.
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Bijective mapping from account address to a dense slot index, persisted
/// into a sparse Merkle tree.
///
/// Slots are handed out in order of first appearance, starting at 0. An
/// address keeps its slot forever: there is no removal or reindexing. In
/// memory the index is an arena of addresses plus a side map from address to
/// arena position. In the tree, key `slot` holds the address and key
/// [`SLOT_COUNT_KEY`] holds the number of slots.
#[derive(Debug, Clone)]
pub struct AccountIndex<D, H>
where
    H: TreeHasher,
{
    slots: Vec<Address>,
    positions: HashMap<Address, u32>,
    tree: Smt<D, H>,
}

impl<D, H> AccountIndex<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Rebuild the index from the tree's current contents.
    pub fn load(tree: Smt<D, H>) -> Result<Self, TreeError> {
        let count = tree.get(SLOT_COUNT_KEY)?;
        let count: u32 =
            count.try_into().map_err(|_| TreeError::MalformedValue { key: SLOT_COUNT_KEY })?;

        let mut slots = Vec::with_capacity(count as usize);
        let mut positions = HashMap::with_capacity(count as usize);
        for slot in 0..count {
            let key = u64::from(slot);
            let address =
                decode_leaf(tree.get(key)?).ok_or(TreeError::MalformedValue { key })?;
            if positions.insert(address, slot).is_some() {
                return Err(TreeError::MalformedValue { key });
            }
            slots.push(address);
        }

        Ok(Self { slots, positions, tree })
    }

    /// Look up the slot an address has, or would get, without assigning it.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::SlotsExhausted`] if the address is new and no
    /// slot is left.
    pub fn plan(&self, address: Address) -> Result<SlotAssignment, TreeError> {
        match self.positions.get(&address) {
            Some(slot) => Ok(SlotAssignment::Existing(*slot)),
            None => next_slot(self.slots.len()).map(SlotAssignment::New),
        }
    }

    /// Get the slot of an address, assigning the next free slot if the
    /// address has none. Calling this again for the same address returns the
    /// same slot and does not touch the tree.
    pub fn resolve(&mut self, address: Address) -> Result<u32, TreeError> {
        let slot = match self.plan(address)? {
            SlotAssignment::Existing(slot) => return Ok(slot),
            SlotAssignment::New(slot) => slot,
        };

        self.tree.set(u64::from(slot), encode_leaf(address))?;
        self.tree.set(SLOT_COUNT_KEY, U256::from(slot) + U256::from(1))?;
        self.slots.push(address);
        self.positions.insert(address, slot);

        trace!(%address, slot, "assigned account slot");
        Ok(slot)
    }

    /// Get the slot of an address, if it has one.
    pub fn slot_of(&self, address: &Address) -> Option<u32> {
        self.positions.get(address).copied()
    }

    /// Get the address in a slot, if the slot is assigned.
    pub fn address_at(&self, slot: u32) -> Option<Address> {
        self.slots.get(slot as usize).copied()
    }

    /// Number of assigned slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no slot is assigned.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over `(slot, address)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Address)> + '_ {
        (0u32..).zip(self.slots.iter().copied())
    }

    /// The root of the backing tree.
    pub fn root(&self) -> B256 {
        self.tree.root_b256()
    }

    /// Get a reference to the backing tree.
    pub const fn tree(&self) -> &Smt<D, H> {
        &self.tree
    }

    /// Destructure the index into its backing tree.
    pub fn into_tree(self) -> Smt<D, H> {
        self.tree
    }
}

/// The slot after `len` assigned slots. The slot count must fit in a `u32`,
/// so slot `u32::MAX` is never handed out.
fn next_slot(len: usize) -> Result<u32, TreeError> {
    u32::try_from(len).ok().filter(|slot| *slot < u32::MAX).ok_or(TreeError::SlotsExhausted)
}

fn encode_leaf(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice()) | (U256::from(1) << PRESENCE_BIT)
}

fn decode_leaf(value: U256) -> Option<Address> {
    if value >> PRESENCE_BIT != U256::from(1) {
        return None;
    }
    let word = value.to_be_bytes::<32>();
    Some(Address::from_slice(&word[12..]))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::{KeccakHasher, MemoryDb};

    fn index() -> AccountIndex<MemoryDb<u64>, KeccakHasher> {
        AccountIndex::load(Smt::new(MemoryDb::new(), KeccakHasher)).unwrap()
    }

    #[test]
    fn dense_and_idempotent() {
        let mut accounts = index();
        let a = Address::repeat_byte(0xa);
        let b = Address::repeat_byte(0xb);

        assert_eq!(accounts.plan(a).unwrap(), SlotAssignment::New(0));
        assert_eq!(accounts.resolve(a).unwrap(), 0);
        assert_eq!(accounts.resolve(b).unwrap(), 1);

        let root = accounts.root();
        assert_eq!(accounts.resolve(a).unwrap(), 0);
        assert_eq!(accounts.plan(a).unwrap(), SlotAssignment::Existing(0));
        assert_eq!(accounts.root(), root);

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts.address_at(1), Some(b));
        assert_eq!(accounts.slot_of(&b), Some(1));
        assert_eq!(accounts.address_at(2), None);
        assert_eq!(accounts.iter().collect::<Vec<_>>(), vec![(0, a), (1, b)]);
    }

    #[test]
    fn planning_does_not_assign() {
        let mut accounts = index();
        let a = Address::repeat_byte(0xa);
        assert!(accounts.plan(a).unwrap().is_new());
        assert!(accounts.is_empty());
        assert_eq!(accounts.root(), B256::ZERO);

        accounts.resolve(a).unwrap();
        assert!(!accounts.plan(a).unwrap().is_new());
    }

    #[test]
    fn zero_address_occupies_a_leaf() {
        let mut accounts = index();
        assert_eq!(accounts.resolve(Address::ZERO).unwrap(), 0);
        assert_eq!(accounts.tree().get(0).unwrap(), U256::from(1) << PRESENCE_BIT);
    }

    #[test]
    fn reload_from_tree() {
        let mut accounts = index();
        let addrs = [Address::repeat_byte(1), Address::ZERO, Address::repeat_byte(3)];
        for address in addrs {
            accounts.resolve(address).unwrap();
        }
        let root = accounts.root();

        let tree = Smt::with_root(accounts.into_tree().into_db(), KeccakHasher, root).unwrap();
        let reloaded = AccountIndex::load(tree).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.slot_of(&Address::ZERO), Some(1));
        assert_eq!(reloaded.address_at(2), Some(addrs[2]));
        assert_eq!(reloaded.root(), root);
    }

    #[test]
    fn malformed_count_is_rejected() {
        let mut tree = Smt::new(MemoryDb::new(), KeccakHasher);
        tree.set(SLOT_COUNT_KEY, U256::from(1)).unwrap();
        tree.set(0, U256::from(5)).unwrap();
        let err = AccountIndex::load(tree).unwrap_err();
        assert_eq!(err, TreeError::MalformedValue { key: 0 });
    }

    #[test]
    fn slot_space_is_bounded() {
        assert_eq!(next_slot(0), Ok(0));
        assert_eq!(next_slot(u32::MAX as usize - 1), Ok(u32::MAX - 1));
        assert_eq!(next_slot(u32::MAX as usize), Err(TreeError::SlotsExhausted));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(next_slot(u32::MAX as usize + 1), Err(TreeError::SlotsExhausted));
    }

    #[cfg(feature = "poseidon")]
    #[test]
    fn poseidon_backed_index_reloads() {
        use crate::tree::PoseidonHasher;
        use plonky2::field::goldilocks_field::GoldilocksField;

        let tree = Smt::new(MemoryDb::<GoldilocksField>::new(), PoseidonHasher);
        let mut accounts = AccountIndex::load(tree).unwrap();
        let addrs = [Address::repeat_byte(0xff), Address::ZERO];
        for address in addrs {
            accounts.resolve(address).unwrap();
        }
        let root = accounts.root();

        let tree = Smt::with_root(accounts.into_tree().into_db(), PoseidonHasher, root).unwrap();
        let reloaded = AccountIndex::load(tree).unwrap();
        assert_eq!(reloaded.iter().collect::<Vec<_>>(), vec![(0, addrs[0]), (1, addrs[1])]);
        assert_eq!(reloaded.tree().get(SLOT_COUNT_KEY).unwrap(), U256::from(2));
    }
}
