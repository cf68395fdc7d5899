use crate::game::beat::{Beat, Tempo, TempoChange};
use crate::game::timing::TempoTimelineIndex;
use log::debug;
use std::sync::Arc;

/// The editable list of tempo changes for a chart, kept sorted by beat.
///
/// Every mutation rebuilds the owned `TempoTimelineIndex` in full, so queries
/// through `index()` always see the current tempo data.
#[derive(Debug, Clone)]
pub struct SortedTempoMap {
    changes: Vec<TempoChange>,
    index: TempoTimelineIndex,
}

impl Default for SortedTempoMap {
    fn default() -> Self {
        Self::new(Tempo::default())
    }
}

impl SortedTempoMap {
    pub fn new(fallback_tempo: Tempo) -> Self {
        Self {
            changes: Vec::new(),
            index: TempoTimelineIndex::with_fallback_tempo(fallback_tempo),
        }
    }

    /// Builds a map from unsorted changes. Changes sharing a beat keep their input order.
    pub fn from_changes<I>(fallback_tempo: Tempo, changes: I) -> Self
    where
        I: IntoIterator<Item = TempoChange>,
    {
        let mut changes: Vec<TempoChange> = changes.into_iter().collect();
        changes.sort_by_key(|c| c.beat);
        let mut map = Self {
            changes,
            index: TempoTimelineIndex::with_fallback_tempo(fallback_tempo),
        };
        map.rebuild();
        map
    }

    #[inline(always)]
    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    #[inline(always)]
    pub fn index(&self) -> &TempoTimelineIndex {
        &self.index
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// An immutable copy of the current index for readers on other threads.
    pub fn snapshot(&self) -> Arc<TempoTimelineIndex> {
        Arc::new(self.index.clone())
    }

    /// Sets the tempo at `change.beat`, replacing any change already there.
    pub fn insert_or_update(&mut self, change: TempoChange) {
        match self.changes.binary_search_by_key(&change.beat, |c| c.beat) {
            Ok(i) => self.changes[i] = change,
            Err(i) => self.changes.insert(i, change),
        }
        self.rebuild();
    }

    pub fn remove_at(&mut self, beat: Beat) -> Option<TempoChange> {
        let i = self.changes.binary_search_by_key(&beat, |c| c.beat).ok()?;
        let removed = self.changes.remove(i);
        self.rebuild();
        Some(removed)
    }

    /// Tempo in effect at `beat`, matching what the index extrapolates with
    /// before the first change.
    pub fn tempo_at(&self, beat: Beat) -> Tempo {
        match self.changes.partition_point(|c| c.beat <= beat) {
            0 => Tempo::new(self.index.first_tempo_bpm()),
            idx => self.changes[idx - 1].tempo,
        }
    }

    fn rebuild(&mut self) {
        self.index.rebuild(&self.changes);
        debug!("SortedTempoMap now holds {} tempo changes.", self.changes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::SortedTempoMap;
    use crate::game::beat::{Beat, Tempo, TempoChange, Time};
    use std::thread;

    #[test]
    fn from_changes_sorts_input() {
        let map = SortedTempoMap::from_changes(
            Tempo::default(),
            [
                TempoChange::at_tick(384, 60.0),
                TempoChange::at_tick(0, 120.0),
                TempoChange::at_tick(192, 240.0),
            ],
        );
        let beats: Vec<i32> = map.changes().iter().map(|c| c.beat.ticks).collect();
        assert_eq!(beats, vec![0, 192, 384]);
        assert_eq!(map.index().len(), 385);
    }

    #[test]
    fn edits_rebuild_the_index() {
        let mut map = SortedTempoMap::new(Tempo::new(120.0));
        assert_eq!(map.index().len(), 1);

        map.insert_or_update(TempoChange::at_tick(0, 120.0));
        map.insert_or_update(TempoChange::at_tick(192, 60.0));
        assert_eq!(map.index().len(), 193);
        assert_eq!(map.index().last_tempo_bpm(), 60.0);

        map.insert_or_update(TempoChange::at_tick(192, 30.0));
        assert_eq!(map.len(), 2);
        assert_eq!(map.index().last_tempo_bpm(), 30.0);

        let removed = map.remove_at(Beat::from_ticks(192));
        assert_eq!(removed.map(|c| c.tempo.bpm), Some(30.0));
        assert_eq!(map.index().len(), 1);
        assert!(map.remove_at(Beat::from_ticks(5)).is_none());
    }

    #[test]
    fn tempo_at_finds_active_segment() {
        let map = SortedTempoMap::from_changes(
            Tempo::new(99.0),
            [TempoChange::at_tick(96, 120.0), TempoChange::at_tick(192, 240.0)],
        );
        assert_eq!(map.tempo_at(Beat::zero()).bpm, 99.0);
        assert_eq!(map.tempo_at(Beat::from_ticks(-5)).bpm, 99.0);
        assert_eq!(map.tempo_at(Beat::from_ticks(96)).bpm, 120.0);
        assert_eq!(map.tempo_at(Beat::from_ticks(191)).bpm, 120.0);
        assert_eq!(map.tempo_at(Beat::from_ticks(10_000)).bpm, 240.0);
        assert_eq!(map.index().first_tempo_bpm(), 99.0);
        assert_eq!(SortedTempoMap::new(Tempo::new(99.0)).tempo_at(Beat::zero()).bpm, 99.0);
    }

    #[test]
    fn snapshot_is_readable_from_another_thread() {
        let mut map =
            SortedTempoMap::from_changes(Tempo::default(), [TempoChange::at_tick(0, 120.0)]);
        let snapshot = map.snapshot();
        map.insert_or_update(TempoChange::at_tick(0, 60.0));

        let reader = thread::spawn(move || snapshot.beat_to_time(Beat::from_beats(1)));
        let published = reader.join().unwrap();
        assert!((published.to_sec() - 0.5).abs() < 1e-9);
        let current = map.index().beat_to_time(Beat::from_beats(1));
        assert!((current - Time::from_sec(1.0)).to_sec().abs() < 1e-9);
    }
}
