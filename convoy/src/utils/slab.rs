/// Indexed storage with slot reuse.
///
/// `insert` hands out a small `usize` key that stays valid until the
/// value is removed; freed keys are reused by later insertions.
pub(crate) struct Slab<T> {
    /// Slots, `None` when free.
    items: Vec<Option<T>>,
    /// Stack of free keys.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores `item` and returns its key.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let key = match self.free.pop() {
            Some(key) => {
                self.items[key] = Some(item);
                key
            }
            None => {
                self.items.push(Some(item));
                self.items.len() - 1
            }
        };

        self.len += 1;
        key
    }

    /// Removes and returns the value at `key`, if it is still present.
    pub(crate) fn try_remove(&mut self, key: usize) -> Option<T> {
        let item = self.items.get_mut(key)?.take()?;

        self.free.push(key);
        self.len -= 1;

        Some(item)
    }

    /// Returns a mutable reference to the value at `key`, if present.
    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.items.get_mut(key)?.as_mut()
    }

    /// Removes every value, yielding them in key order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.free.clear();
        self.len = 0;

        self.items.drain(..).flatten()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}
