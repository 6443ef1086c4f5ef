//! Bounded ring buffer
//!
//! Fixed-capacity FIFO container. Appending to a full buffer evicts the
//! oldest inserted element and hands it back to the caller.

/// Fixed-capacity ring buffer with oldest-first eviction
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Physical index of the logical head (oldest element)
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` elements (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn available_space(&self) -> usize {
        self.capacity() - self.len
    }

    /// Occupancy as a percentage of capacity
    pub fn utilization_percentage(&self) -> f64 {
        if self.capacity() == 0 {
            return 0.0;
        }
        100.0 * self.len as f64 / self.capacity() as f64
    }

    fn physical(&self, logical: usize) -> usize {
        (self.head + logical) % self.capacity()
    }

    /// Insert at the tail, evicting and returning the head when full
    pub fn append(&mut self, item: T) -> Option<T> {
        if self.is_full() {
            let evicted = self.slots[self.head].replace(item);
            self.head = (self.head + 1) % self.capacity();
            return evicted;
        }

        let tail = self.physical(self.len);
        self.slots[tail] = Some(item);
        self.len += 1;
        None
    }

    /// Remove and return the oldest element
    pub fn remove_first(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// Remove and return the newest element
    pub fn remove_last(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let tail = self.physical(self.len - 1);
        self.len -= 1;
        self.slots[tail].take()
    }

    pub fn peek(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn peek_last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Element at logical position `index` (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.physical(index)].as_ref()
    }

    /// Iterate oldest first
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            position: 0,
        }
    }

    /// Drop every element, keeping the capacity
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Change capacity in place (minimum 1)
    ///
    /// When shrinking below the current length only the most recently
    /// appended `new_capacity` elements survive; the dropped ones are
    /// returned oldest first.
    pub fn resize(&mut self, new_capacity: usize) -> Vec<T> {
        let new_capacity = new_capacity.max(1);
        let mut dropped = Vec::new();

        while self.len > new_capacity {
            if let Some(item) = self.remove_first() {
                dropped.push(item);
            }
        }

        let mut slots = Vec::with_capacity(new_capacity);
        while let Some(item) = self.remove_first() {
            slots.push(Some(item));
        }
        let len = slots.len();
        slots.resize_with(new_capacity, || None);

        self.slots = slots;
        self.head = 0;
        self.len = len;

        dropped
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Ordered copy of the contents, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn filter<P>(&self, mut predicate: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().filter(|item| predicate(item)).cloned().collect()
    }
}

impl<T> RingBuffer<T> {
    pub fn map<U, F>(&self, f: F) -> Vec<U>
    where
        F: FnMut(&T) -> U,
    {
        self.iter().map(f).collect()
    }

    pub fn filter_map<U, F>(&self, f: F) -> Vec<U>
    where
        F: FnMut(&T) -> Option<U>,
    {
        self.iter().filter_map(f).collect()
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.append(item);
        }
    }
}

/// Oldest-first iterator over a [`RingBuffer`]
pub struct Iter<'a, T> {
    buffer: &'a RingBuffer<T>,
    position: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.position)?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
