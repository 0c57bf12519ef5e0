//! Fixed-capacity rolling store of the most recent events

use crate::Event;

/// Ring of the last `capacity` events, kept as parallel timestamp and
/// address columns so a renderer can read them without reshaping.
///
/// The ring is always full: a fresh, resized, or cleared ring holds
/// `capacity` zero entries, and each pushed event evicts the oldest one.
#[derive(Clone, Debug)]
pub struct EventRing {
    times: Vec<u16>,
    addresses: Vec<u8>,
    // index of the oldest entry, also the next slot to overwrite
    head: usize,
}

pub const ON_SCREEN_DEFAULT: usize = 400;

impl Default for EventRing {
    fn default() -> Self {
        EventRing::new(ON_SCREEN_DEFAULT)
    }
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        EventRing {
            times: vec![0; capacity],
            addresses: vec![0; capacity],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.times.len()
    }

    /// Append events in arrival order, evicting the oldest entries.
    ///
    /// If more events arrive than fit, only the newest `capacity` are kept.
    pub fn push(&mut self, events: &[Event]) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        let skip = events.len().saturating_sub(cap);
        for e in &events[skip..] {
            self.times[self.head] = e.time;
            self.addresses[self.head] = e.address;
            self.head += 1;
            if self.head == cap {
                self.head = 0;
            }
        }
    }

    /// Reallocate to `capacity` zero entries, discarding all history
    pub fn resize(&mut self, capacity: usize) {
        *self = EventRing::new(capacity);
    }

    /// Zero all entries in place
    pub fn clear(&mut self) {
        self.times.iter_mut().for_each(|t| *t = 0);
        self.addresses.iter_mut().for_each(|a| *a = 0);
        self.head = 0;
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        (self.head..self.capacity()).chain(0..self.head).map(move |i| Event {
            time: self.times[i],
            address: self.addresses[i],
        })
    }

    /// Timestamps from oldest to newest
    pub fn times(&self) -> Vec<u16> {
        let (newer, older) = self.times.split_at(self.head);
        [older, newer].concat()
    }

    /// Addresses from oldest to newest
    pub fn addresses(&self) -> Vec<u8> {
        let (newer, older) = self.addresses.split_at(self.head);
        [older, newer].concat()
    }

    /// Both columns from oldest to newest
    pub fn snapshot(&self) -> (Vec<u16>, Vec<u8>) {
        (self.times(), self.addresses())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(time: u16, address: u8) -> Event {
        Event { time, address }
    }

    #[test]
    fn wraps_around() {
        let mut r = EventRing::new(3);
        r.push(&[ev(1, 1), ev(2, 2)]);
        r.push(&[ev(3, 3), ev(4, 4)]);
        assert_eq!(r.times(), vec![2, 3, 4]);
        assert_eq!(r.addresses(), vec![2, 3, 4]);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![ev(2, 2), ev(3, 3), ev(4, 4)]);
    }

    #[test]
    fn zero_capacity_ignores_pushes() {
        let mut r = EventRing::new(0);
        r.push(&[ev(1, 1)]);
        assert_eq!(r.capacity(), 0);
        assert!(r.times().is_empty());
    }

    #[test]
    fn clear_resets_order() {
        let mut r = EventRing::new(2);
        r.push(&[ev(5, 5)]);
        r.clear();
        assert_eq!(r.snapshot(), (vec![0, 0], vec![0, 0]));
        r.push(&[ev(6, 6)]);
        assert_eq!(r.times(), vec![0, 6]);
    }
}
