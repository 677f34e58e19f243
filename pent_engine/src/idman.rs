use std::collections::VecDeque;

use pent_stream::{SaveReader, SaveWriter};

use crate::error::LoadError;

/// Allocator for a closed range of 16-bit ids.
///
/// Released ids go to the back of the free list, so an id is handed out again
/// only after every older free id has been used.
#[derive(Debug, Clone)]
pub struct IdMan {
    begin: u16,
    end: u16,
    used: Vec<bool>,
    free: VecDeque<u16>,
    used_count: usize,
}

impl IdMan {
    pub fn new(begin: u16, end: u16) -> Self {
        assert!(begin > 0 && begin <= end, "id range must be non-empty and exclude 0");
        let mut man = IdMan {
            begin,
            end,
            used: Vec::new(),
            free: VecDeque::new(),
            used_count: 0,
        };
        man.clear_all();
        man
    }

    pub fn begin(&self) -> u16 {
        self.begin
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn clear_all(&mut self) {
        self.used = vec![false; usize::from(self.end - self.begin) + 1];
        self.free = (self.begin..=self.end).collect();
        self.used_count = 0;
    }

    fn slot(&self, id: u16) -> Option<usize> {
        (self.begin..=self.end)
            .contains(&id)
            .then(|| usize::from(id - self.begin))
    }

    /// Next free id, or 0 when the pool is exhausted.
    pub fn get_new_id(&mut self) -> u16 {
        while let Some(id) = self.free.pop_front() {
            let Some(slot) = self.slot(id) else { continue };
            if self.used[slot] {
                // Reserved explicitly while still queued.
                continue;
            }
            self.used[slot] = true;
            self.used_count += 1;
            return id;
        }
        0
    }

    /// Marks a specific id used. Fails when it is out of range or taken.
    pub fn reserve_id(&mut self, id: u16) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        if self.used[slot] {
            return false;
        }
        self.used[slot] = true;
        self.used_count += 1;
        true
    }

    pub fn clear_id(&mut self, id: u16) {
        let Some(slot) = self.slot(id) else { return };
        if !self.used[slot] {
            return;
        }
        self.used[slot] = false;
        self.used_count -= 1;
        self.free.push_back(id);
    }

    pub fn is_id_used(&self, id: u16) -> bool {
        self.slot(id).map(|slot| self.used[slot]).unwrap_or(false)
    }

    pub fn is_full(&self) -> bool {
        self.used_count == self.used.len()
    }

    pub fn used_count(&self) -> usize {
        self.used_count
    }

    pub fn used_ids(&self) -> impl Iterator<Item = u16> + '_ {
        (self.begin..=self.end).filter(move |&id| self.is_id_used(id))
    }

    pub fn save(&self, writer: &mut SaveWriter) {
        writer.write_u16(self.begin);
        writer.write_u16(self.end);
        writer.write_u16(self.used_count as u16);
        for id in self.used_ids() {
            writer.write_u16(id);
        }
    }

    /// Rebuilds the pool from a saved block. The saved range must match ours.
    pub fn load(&mut self, reader: &mut SaveReader<'_>) -> Result<(), LoadError> {
        let begin = reader.read_u16()?;
        let end = reader.read_u16()?;
        if begin != self.begin || end != self.end {
            return Err(LoadError::PoolRange {
                begin,
                end,
                expected_begin: self.begin,
                expected_end: self.end,
            });
        }
        let count = reader.read_u16()?;
        self.clear_all();
        for _ in 0..count {
            let id = reader.read_u16()?;
            if !self.reserve_id(id) {
                return Err(LoadError::IdNotReserved(id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_stay_inside_the_range_and_run_out() {
        let mut pool = IdMan::new(1, 3);
        assert_eq!(pool.get_new_id(), 1);
        assert_eq!(pool.get_new_id(), 2);
        assert_eq!(pool.get_new_id(), 3);
        assert!(pool.is_full());
        assert_eq!(pool.get_new_id(), 0);
    }

    #[test]
    fn cleared_ids_are_reused_after_older_free_ids() {
        let mut pool = IdMan::new(10, 13);
        let first = pool.get_new_id();
        pool.clear_id(first);
        assert_eq!(pool.get_new_id(), 11);
        assert_eq!(pool.get_new_id(), 12);
        assert_eq!(pool.get_new_id(), 13);
        assert_eq!(pool.get_new_id(), first);
    }

    #[test]
    fn reserved_ids_are_skipped_by_allocation() {
        let mut pool = IdMan::new(1, 4);
        assert!(pool.reserve_id(1));
        assert!(!pool.reserve_id(1));
        assert!(!pool.reserve_id(9));
        assert_eq!(pool.get_new_id(), 2);
    }

    #[test]
    fn saved_pool_restores_used_ids() {
        let mut pool = IdMan::new(256, 300);
        pool.get_new_id();
        pool.reserve_id(280);
        let mut writer = SaveWriter::new();
        pool.save(&mut writer);

        let mut restored = IdMan::new(256, 300);
        let bytes = writer.into_bytes();
        let mut reader = SaveReader::new(&bytes);
        restored.load(&mut reader).expect("pool loads");
        assert!(restored.is_id_used(256));
        assert!(restored.is_id_used(280));
        assert_eq!(restored.used_count(), 2);
        assert_eq!(restored.get_new_id(), 257);

        let mut other = IdMan::new(1, 255);
        let mut reader = SaveReader::new(&bytes);
        assert!(matches!(
            other.load(&mut reader),
            Err(LoadError::PoolRange { .. })
        ));
    }
}
